use series_dedup::{
    CollectorOptions, EmittedSample, LabelMap, Sample, SampleCollector, SampleSink, SeriesError,
    SeriesResult,
};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

/// A sink rendering samples as exposition-format lines, e.g.
/// `metric{unit="bytes",zone="a"} 1 1700000000000`.
#[derive(Clone, Default)]
pub struct TextSink {
    lines: Arc<Mutex<Vec<String>>>,
    /// Emissions left before the sink starts rejecting; `None` never rejects.
    budget: Option<usize>,
}

impl TextSink {
    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl SampleSink for TextSink {
    fn emit(&mut self, sample: &EmittedSample) -> SeriesResult<()> {
        if let Some(budget) = self.budget.as_mut() {
            if *budget == 0 {
                return Err(SeriesError::Sink("budget exhausted".to_string()));
            }
            *budget -= 1;
        }

        let mut line = sample.metric_name.clone();
        if !sample.labels.is_empty() {
            line.push('{');
            for (index, (key, value)) in sample.labels.iter().enumerate() {
                if index > 0 {
                    line.push(',');
                }
                write!(line, "{key}=\"{value}\"").unwrap();
            }
            line.push('}');
        }
        write!(line, " {}", sample.value).unwrap();
        if let Some(timestamp) = sample.timestamp {
            let millis = timestamp.duration_since(UNIX_EPOCH).unwrap().as_millis();
            write!(line, " {millis}").unwrap();
        }
        self.lines.lock().unwrap().push(line);
        Ok(())
    }
}

fn labels(items: &[(&str, &str)]) -> LabelMap {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_custom_sink_basic() {
    let collector = SampleCollector::new(CollectorOptions::default()).unwrap();
    let mut sink = TextSink::default();
    let timestamp = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    let sample = Sample::new("storage_bytes", 1.0)
        .with_unit("bytes")
        .with_metric_labels(labels(&[("bucket", "logs")]))
        .with_resource_labels(labels(&[("zone", "a")]))
        .with_timestamp(timestamp);
    let stats = collector.collect([&sample, &sample], &mut sink);

    assert_eq!(stats.emitted, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(
        sink.lines(),
        vec![r#"storage_bytes{unit="bytes",bucket="logs",zone="a"} 1 1700000000000"#.to_string()]
    );
}

#[test]
fn test_custom_sink_without_timestamp() {
    let collector = SampleCollector::new(CollectorOptions::default()).unwrap();
    let mut sink = TextSink::default();

    let stats = collector.collect([&Sample::new("up", 1.0)], &mut sink);
    assert_eq!(stats.emitted, 1);
    assert_eq!(sink.lines(), vec![r#"up{unit=""} 1"#.to_string()]);
}

#[test]
fn test_custom_sink_rejections_are_retried() {
    let collector = SampleCollector::new(CollectorOptions::default()).unwrap();
    let samples: Vec<Sample> = (0..4_u32)
        .map(|i| {
            Sample::new("requests", f64::from(i))
                .with_metric_labels(labels(&[("id", i.to_string().as_str())]))
        })
        .collect();

    let mut sink = TextSink::with_budget(2);
    let stats = collector.collect(&samples, &mut sink);
    assert_eq!(stats.emitted, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(collector.deduplicator().len(), 2);

    // rejected samples were unmarked and go through on the next attempt
    let mut retry = TextSink::default();
    let stats = collector.collect(&samples, &mut retry);
    assert_eq!(stats.emitted, 2);
    assert_eq!(stats.duplicates, 2);
    assert_eq!(
        retry.lines(),
        vec![
            r#"requests{unit="",id="2"} 2"#.to_string(),
            r#"requests{unit="",id="3"} 3"#.to_string(),
        ]
    );
}

#[test]
fn test_custom_sink_rejections_during_scrape() {
    let collector = SampleCollector::new(CollectorOptions::default()).unwrap();
    let sample = Sample::new("uptime_seconds", 42.0).with_unit("seconds");
    let shards = vec![vec![sample.clone(), sample.clone()], vec![sample]];

    let mut sink = TextSink::with_budget(0);
    let stats = collector.scrape(&shards, &mut sink);
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.emitted, 0);
    assert!(collector.deduplicator().is_empty());

    let mut sink = TextSink::default();
    let stats = collector.scrape(&shards, &mut sink);
    assert_eq!(stats.emitted, 1);
    assert_eq!(stats.duplicates, 2);
    assert_eq!(sink.lines(), vec![r#"uptime_seconds{unit="seconds"} 42"#.to_string()]);
}
