use std::sync::Arc;
use std::time::SystemTime;

use crossbeam::channel::unbounded;
use tracing::{debug, error, warn};

use super::assembler::LabelAssembler;
use super::deduplicator::{Deduplicator, DeduplicatorOptions};
use super::labels::{LabelMap, LabelSet};
use super::signature::signature;
use crate::SeriesResult;

/// One sample as discovered from the monitoring backend.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    /// Fully qualified metric name.
    pub metric_name: String,
    /// Value of the `unit` label.
    pub unit: String,
    /// Labels intrinsic to the metric.
    pub metric_labels: LabelMap,
    /// Labels of the monitored resource.
    pub resource_labels: LabelMap,
    /// Raw system-label payload, usually a JSON object.
    pub system_labels: Vec<u8>,
    /// Sample value.
    pub value: f64,
    /// Sample time. `None` for samples deduplicated on labels only.
    pub timestamp: Option<SystemTime>,
}

impl Sample {
    /// Creates a sample with no labels and no timestamp.
    #[must_use]
    pub fn new(metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            ..Self::default()
        }
    }

    /// Sets the unit label value.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the metric labels.
    #[must_use]
    pub fn with_metric_labels(mut self, labels: LabelMap) -> Self {
        self.metric_labels = labels;
        self
    }

    /// Sets the resource labels.
    #[must_use]
    pub fn with_resource_labels(mut self, labels: LabelMap) -> Self {
        self.resource_labels = labels;
        self
    }

    /// Sets the raw system-label payload.
    #[must_use]
    pub fn with_system_labels(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.system_labels = payload.into();
        self
    }

    /// Sets the sample time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A sample that passed deduplication, with its final label set.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedSample {
    /// Fully qualified metric name.
    pub metric_name: String,
    /// Assembled labels, unit first.
    pub labels: LabelSet,
    /// Sample value.
    pub value: f64,
    /// Sample time, if any.
    pub timestamp: Option<SystemTime>,
}

/// Destination of emitted samples, typically an adapter feeding a metrics registry.
pub trait SampleSink {
    /// Emits one sample.
    ///
    /// # Errors
    /// An error makes the collector revert the sample's mark so it can be emitted again
    /// later in the same scrape iteration.
    fn emit(&mut self, sample: &EmittedSample) -> SeriesResult<()>;
}

impl SampleSink for Vec<EmittedSample> {
    fn emit(&mut self, sample: &EmittedSample) -> SeriesResult<()> {
        self.push(sample.clone());
        Ok(())
    }
}

/// What happened to a processed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handed to the sink.
    Emitted,
    /// Dropped as a duplicate of a sample already emitted in this iteration.
    Duplicate,
    /// The sink rejected it; its mark was reverted.
    Failed,
}

/// Per-scrape outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrapeStats {
    /// Samples handed to the sink.
    pub emitted: u64,
    /// Samples dropped as duplicates.
    pub duplicates: u64,
    /// Samples the sink rejected.
    pub failed: u64,
}

impl ScrapeStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Emitted => self.emitted += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Configuration options for the sample collector.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Whether the raw system-label payload contributes labels at all.
    pub enable_system_labels: bool,
    /// Whether user labels take precedence over system labels on conflict.
    pub user_labels_override: bool,
    /// Labels applied to every sample.
    pub user_labels: LabelMap,
    /// Names of the deduplicator's own metrics.
    pub deduplicator: DeduplicatorOptions,
    /// Worker threads used by [`SampleCollector::collect_parallel`].
    pub workers: usize,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            enable_system_labels: false,
            user_labels_override: false,
            user_labels: LabelMap::new(),
            deduplicator: DeduplicatorOptions::default(),
            workers: 4,
        }
    }
}

/// Turns discovered samples into labelled, deduplicated samples for a [`SampleSink`].
///
/// Per sample: assemble labels, mark the signature, emit or drop. The deduplicator is
/// owned by the collector instance (shared through an `Arc`), never process global.
///
/// # Example
///
/// ```
/// use series_dedup::{CollectorOptions, EmittedSample, Sample, SampleCollector};
///
/// let collector = SampleCollector::new(CollectorOptions::default()).unwrap();
/// let sample = Sample::new("compute_cpu_utilization", 0.5).with_unit("percent");
///
/// let mut sink: Vec<EmittedSample> = Vec::new();
/// let stats = collector.collect([&sample, &sample], &mut sink);
/// assert_eq!(stats.emitted, 1);
/// assert_eq!(stats.duplicates, 1);
/// ```
#[derive(Debug)]
pub struct SampleCollector {
    assembler: LabelAssembler,
    deduplicator: Arc<Deduplicator>,
    workers: usize,
}

impl SampleCollector {
    /// Creates a collector with its own deduplicator.
    ///
    /// # Errors
    /// Returns [`crate::SeriesError::Prometheus`] if the deduplicator metric names are
    /// invalid.
    pub fn new(options: CollectorOptions) -> SeriesResult<Self> {
        let deduplicator = Arc::new(Deduplicator::new(&options.deduplicator)?);
        Ok(Self::with_deduplicator(options, deduplicator))
    }

    /// Creates a collector around an existing deduplicator.
    #[must_use]
    pub fn with_deduplicator(options: CollectorOptions, deduplicator: Arc<Deduplicator>) -> Self {
        Self {
            assembler: LabelAssembler::new(
                options.user_labels,
                options.enable_system_labels,
                options.user_labels_override,
            ),
            deduplicator,
            workers: options.workers.max(1),
        }
    }

    /// The label assembler built from the options.
    #[must_use]
    pub const fn assembler(&self) -> &LabelAssembler {
        &self.assembler
    }

    /// The deduplicator, e.g. for registering its metrics.
    #[must_use]
    pub const fn deduplicator(&self) -> &Arc<Deduplicator> {
        &self.deduplicator
    }

    /// Assembles the labels of `sample` and marks it.
    ///
    /// Returns `None` if the sample duplicates one already marked in this iteration.
    #[must_use]
    pub fn prepare(&self, sample: &Sample) -> Option<EmittedSample> {
        let (emitted, signature) = self.assemble(sample);
        if self.deduplicator.check_and_mark_signature(&emitted.metric_name, signature) {
            return None;
        }
        Some(emitted)
    }

    /// Prepares and emits one sample.
    pub fn process(&self, sample: &Sample, sink: &mut dyn SampleSink) -> Outcome {
        let (emitted, signature) = self.assemble(sample);
        self.admit(&emitted, signature, sink)
    }

    /// Processes `samples` sequentially on the calling thread.
    pub fn collect<'a, I>(&self, samples: I, sink: &mut dyn SampleSink) -> ScrapeStats
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut stats = ScrapeStats::default();
        for sample in samples {
            stats.record(self.process(sample, sink));
        }
        stats
    }

    /// Processes `shards` on up to `workers` threads.
    ///
    /// Workers assemble labels and compute signatures concurrently. Marking and
    /// emission happen on the calling thread, so the sink needs no synchronization and
    /// a sample the sink rejects is admitted again through its next duplicate, as in
    /// [`collect`](Self::collect). Returns once every shard is drained.
    pub fn collect_parallel(
        &self,
        shards: &[Vec<Sample>],
        sink: &mut dyn SampleSink,
    ) -> ScrapeStats {
        let mut stats = ScrapeStats::default();
        if shards.is_empty() {
            return stats;
        }

        let per_worker = shards.len().div_ceil(self.workers);
        let (sender, receiver) = unbounded::<(EmittedSample, u64)>();

        let result = crossbeam::scope(|scope| {
            for chunk in shards.chunks(per_worker) {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    for sample in chunk.iter().flatten() {
                        if sender.send(self.assemble(sample)).is_err() {
                            break;
                        }
                    }
                });
            }
            // the loop below ends once every worker dropped its sender
            drop(sender);

            for (emitted, signature) in &receiver {
                stats.record(self.admit(&emitted, signature, sink));
            }
        });

        if let Err(err) = result {
            error!("Sample worker panicked: {err:?}");
        }
        stats
    }

    /// Runs one scrape iteration: forgets the previous iteration's marks, then collects
    /// `shards` in parallel.
    pub fn scrape(&self, shards: &[Vec<Sample>], sink: &mut dyn SampleSink) -> ScrapeStats {
        self.deduplicator.reset();
        let stats = self.collect_parallel(shards, sink);
        debug!(
            "Scrape finished: emitted={} duplicates={} failed={}",
            stats.emitted, stats.duplicates, stats.failed
        );
        stats
    }

    fn assemble(&self, sample: &Sample) -> (EmittedSample, u64) {
        let labels = self.assembler.assemble(
            &sample.unit,
            &sample.metric_labels,
            &sample.resource_labels,
            &sample.system_labels,
        );
        let signature = signature(
            &sample.metric_name,
            labels.keys(),
            labels.values(),
            sample.timestamp,
        );
        let emitted = EmittedSample {
            metric_name: sample.metric_name.clone(),
            labels,
            value: sample.value,
            timestamp: sample.timestamp,
        };
        (emitted, signature)
    }

    // The mark only survives a successful emit.
    fn admit(
        &self,
        sample: &EmittedSample,
        signature: u64,
        sink: &mut dyn SampleSink,
    ) -> Outcome {
        if self.deduplicator.check_and_mark_signature(&sample.metric_name, signature) {
            return Outcome::Duplicate;
        }

        match sink.emit(sample) {
            Ok(()) => Outcome::Emitted,
            Err(err) => {
                warn!("Error emitting {}: {err}", sample.metric_name);
                self.deduplicator.revert_signature(signature);
                Outcome::Failed
            }
        }
    }
}
