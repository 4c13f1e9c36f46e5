//! # series-dedup
//!
//! Sample-processing core for metrics exporters that poll a monitoring backend and
//! re-expose its time series to a pull-based consumer such as Prometheus.
//!
//! ## Features
//!
//! - **Label assembly**: merges unit, metric, resource, user and system labels into one
//!   ordered set with fixed precedence and an optional user override
//! - **Signatures**: order-independent 64-bit FNV-1a signatures over name, labels and
//!   timestamp
//! - **Deduplication**: a thread-safe per-scrape set of signatures with its own
//!   Prometheus counters and gauge
//!
//! ## Quick Start
//!
//! ```
//! use series_dedup::{CollectorOptions, EmittedSample, LabelMap, Sample, SampleCollector};
//!
//! let mut user_labels = LabelMap::new();
//! user_labels.insert("environment".to_string(), "production".to_string());
//!
//! let options = CollectorOptions {
//!     enable_system_labels: true,
//!     user_labels,
//!     ..CollectorOptions::default()
//! };
//! let collector = SampleCollector::new(options).unwrap();
//!
//! let sample = Sample::new("compute_instance_cpu_utilization", 0.42)
//!     .with_unit("ratio")
//!     .with_system_labels(r#"{"cluster": "prod-cluster"}"#);
//!
//! let mut sink: Vec<EmittedSample> = Vec::new();
//! let stats = collector.scrape(&[vec![sample.clone(), sample]], &mut sink);
//! assert_eq!(stats.emitted, 1);
//! assert_eq!(stats.duplicates, 1);
//! assert_eq!(sink[0].labels.get("cluster"), Some("prod-cluster"));
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod error;
mod series;

pub use error::SeriesError;
pub use series::assembler::{add_system_labels, LabelAssembler, UNIT_LABEL};
pub use series::collector::{
    CollectorOptions, EmittedSample, Outcome, Sample, SampleCollector, SampleSink, ScrapeStats,
};
pub use series::deduplicator::{Deduplicator, DeduplicatorOptions, DeduplicatorStats};
pub use series::fnv;
pub use series::labels::{add_or_override, find_key_index, key_exists, LabelMap, LabelSet};
pub use series::signature::{label_signature, signature, unix_nanos};
pub use series::system_labels::parse_system_labels;

/// Result type for label assembly, deduplication and emission.
pub type SeriesResult<T> = Result<T, SeriesError>;
