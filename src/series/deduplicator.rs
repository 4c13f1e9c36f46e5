use std::time::SystemTime;

use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{IntCounter, IntGauge, Opts, Registry};
use tracing::debug;

use super::signature::signature;
use crate::SeriesResult;

/// Names under which the deduplicator exports its own metrics.
///
/// The exported series are `<namespace>_<subsystem>_checks_total`,
/// `<namespace>_<subsystem>_duplicates_total` and `<namespace>_<subsystem>_unique_metrics`.
#[derive(Debug, Clone)]
pub struct DeduplicatorOptions {
    /// Metric namespace, `"stackdriver"` by default.
    pub namespace: String,
    /// Metric subsystem, `"deduplicator"` by default.
    pub subsystem: String,
}

impl Default for DeduplicatorOptions {
    fn default() -> Self {
        Self {
            namespace: "stackdriver".to_string(),
            subsystem: "deduplicator".to_string(),
        }
    }
}

/// Point-in-time view of the deduplicator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeduplicatorStats {
    /// Calls to [`Deduplicator::check_and_mark`] since construction.
    pub checks: u64,
    /// Calls that reported a duplicate since construction.
    pub duplicates: u64,
    /// Signatures currently marked in this scrape iteration.
    pub unique: i64,
}

/// Tracks the signatures of samples already emitted during the current scrape iteration.
///
/// The signature set and the `unique_metrics` gauge are guarded by one mutex, so the
/// gauge never shows a half-applied insert. The check and duplicate counters are
/// atomic and live for the whole process; [`reset`](Self::reset) only clears the set
/// and the gauge.
///
/// Construct one per exporter instance and share it behind an `Arc`.
pub struct Deduplicator {
    signatures: Mutex<HashTable<u64>>,
    checks: IntCounter,
    duplicates: IntCounter,
    unique: IntGauge,
}

impl std::fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Deduplicator {
    /// Creates an empty deduplicator.
    ///
    /// # Errors
    /// Returns [`crate::SeriesError::Prometheus`] if the configured namespace or
    /// subsystem does not produce valid metric names.
    pub fn new(options: &DeduplicatorOptions) -> SeriesResult<Self> {
        let opts = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(options.namespace.clone())
                .subsystem(options.subsystem.clone())
        };

        Ok(Self {
            signatures: Mutex::new(HashTable::new()),
            checks: IntCounter::with_opts(opts(
                "checks_total",
                "Total number of deduplication checks performed.",
            ))?,
            duplicates: IntCounter::with_opts(opts(
                "duplicates_total",
                "Total number of duplicate metrics detected and dropped.",
            ))?,
            unique: IntGauge::with_opts(opts(
                "unique_metrics",
                "Current number of unique metrics being tracked.",
            ))?,
        })
    }

    /// Marks the sample as seen and reports whether it already was.
    ///
    /// Returns `true` when the signature was present (the caller must drop the sample)
    /// and `false` when it was newly inserted.
    pub fn check_and_mark<K, V>(
        &self,
        name: &str,
        keys: &[K],
        values: &[V],
        timestamp: Option<SystemTime>,
    ) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.check_and_mark_signature(name, signature(name, keys, values, timestamp))
    }

    /// Same as [`check_and_mark`](Self::check_and_mark) for a signature computed
    /// beforehand with [`signature`]. `name` is only used for logging.
    pub fn check_and_mark_signature(&self, name: &str, signature: u64) -> bool {
        self.checks.inc();

        let mut signatures = self.signatures.lock();
        let duplicate = match signatures.entry(signature, |&s| s == signature, |&s| s) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(signature);
                false
            }
        };
        if !duplicate {
            self.unique.set(table_len(&signatures));
        }
        drop(signatures);

        if duplicate {
            self.duplicates.inc();
            debug!("Duplicate metric detected: metric={name} signature={signature}");
        }
        duplicate
    }

    /// Removes the mark for a sample, e.g. after it failed to be emitted.
    ///
    /// The signature is recomputed from the arguments: they must be the same ones
    /// passed to [`check_and_mark`](Self::check_and_mark), otherwise nothing is removed.
    /// Removing an absent signature is a no-op.
    pub fn revert_mark<K, V>(
        &self,
        name: &str,
        keys: &[K],
        values: &[V],
        timestamp: Option<SystemTime>,
    ) where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.revert_signature(signature(name, keys, values, timestamp));
    }

    /// Removes a mark by its precomputed signature.
    pub fn revert_signature(&self, signature: u64) {
        let mut signatures = self.signatures.lock();
        if let Ok(entry) = signatures.find_entry(signature, |&s| s == signature) {
            let _ = entry.remove();
        }
        self.unique.set(table_len(&signatures));
    }

    /// Forgets every signature, starting a new scrape iteration.
    ///
    /// The check and duplicate counters are kept; they are monotonic over
    /// the process lifetime. Callers must not reset while marks from the previous
    /// iteration are still in flight.
    pub fn reset(&self) {
        let mut signatures = self.signatures.lock();
        signatures.clear();
        self.unique.set(0);
    }

    /// Number of signatures currently marked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.lock().len()
    }

    /// Returns true if no signature is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counter and gauge values.
    #[must_use]
    pub fn stats(&self) -> DeduplicatorStats {
        DeduplicatorStats {
            checks: self.checks.get(),
            duplicates: self.duplicates.get(),
            unique: self.unique.get(),
        }
    }

    /// Registers the three deduplicator metrics with `registry`.
    ///
    /// # Errors
    /// Returns [`crate::SeriesError::Prometheus`] if any of them is already registered.
    pub fn register(&self, registry: &Registry) -> SeriesResult<()> {
        registry.register(Box::new(self.checks.clone()))?;
        registry.register(Box::new(self.duplicates.clone()))?;
        registry.register(Box::new(self.unique.clone()))?;
        Ok(())
    }
}

impl Collector for Deduplicator {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.checks.desc();
        descs.extend(self.duplicates.desc());
        descs.extend(self.unique.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = self.checks.collect();
        families.extend(self.duplicates.collect());
        families.extend(self.unique.collect());
        families
    }
}

fn table_len(signatures: &HashTable<u64>) -> i64 {
    i64::try_from(signatures.len()).unwrap_or(i64::MAX)
}
