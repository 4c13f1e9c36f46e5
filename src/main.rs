use prometheus::{Encoder, Registry, TextEncoder};
use series_dedup::{CollectorOptions, EmittedSample, LabelMap, Sample, SampleCollector};
use std::time::{Duration, Instant, SystemTime};
use tracing::Level;
use tracing_subscriber::EnvFilter;

const SHARDS: usize = 8;
const SERIES_PER_SHARD: usize = 10_000;
const ITERATIONS: usize = 5;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let mut user_labels = LabelMap::new();
    user_labels.insert("environment".to_string(), "production".to_string());

    let options = CollectorOptions {
        enable_system_labels: true,
        user_labels_override: false,
        user_labels,
        workers: SHARDS,
        ..CollectorOptions::default()
    };

    let collector = SampleCollector::new(options).unwrap();
    let registry = Registry::new();
    collector.deduplicator().register(&registry).unwrap();

    let now = SystemTime::now();
    let shards = build_shards(now);

    let mut sink = Vec::<EmittedSample>::with_capacity(SHARDS * SERIES_PER_SHARD);
    let instant = Instant::now();
    for iteration in 0..ITERATIONS {
        sink.clear();
        let stats = collector.scrape(&shards, &mut sink);
        println!(
            "iteration {iteration}: emitted={} duplicates={} failed={}",
            stats.emitted, stats.duplicates, stats.failed
        );
    }
    println!("elapsed: {:?}ms", instant.elapsed().as_millis());

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .unwrap();
    println!("{}", String::from_utf8_lossy(&buffer));
}

// Every series shows up twice per shard, once with the labels in a different source
// order, so half of the samples are duplicates.
fn build_shards(now: SystemTime) -> Vec<Vec<Sample>> {
    (0..SHARDS)
        .map(|shard| {
            let mut samples = Vec::with_capacity(SERIES_PER_SHARD * 2);
            for i in 0..SERIES_PER_SHARD {
                let mut metric_labels = LabelMap::new();
                metric_labels.insert("instance_name".to_string(), format!("instance-{i}"));
                let mut resource_labels = LabelMap::new();
                resource_labels.insert("zone".to_string(), format!("zone-{shard}"));

                let timestamp = now - Duration::from_secs(60);
                let sample = Sample::new("compute_instance_cpu_utilization", 0.5)
                    .with_unit("ratio")
                    .with_metric_labels(metric_labels)
                    .with_resource_labels(resource_labels)
                    .with_system_labels(format!(
                        r#"{{"shard": "{shard}", "region": "us-central1"}}"#
                    ))
                    .with_timestamp(timestamp);
                samples.push(sample.clone());
                samples.push(sample.with_system_labels(format!(
                    r#"{{"region": "us-central1", "shard": "{shard}"}}"#
                )));
            }
            samples
        })
        .collect()
}
