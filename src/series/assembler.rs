use tracing::debug;

use super::labels::{LabelMap, LabelSet};
use super::system_labels::parse_system_labels;

/// Key of the label seeded first into every assembled set.
pub const UNIT_LABEL: &str = "unit";

/// Merges the label sources of one sample into a single ordered [`LabelSet`].
///
/// Precedence, highest first: unit, metric labels, resource labels, then either
/// system labels before user labels or, with `user_labels_override`, user labels
/// before system labels. Every source appends with skip-existing semantics, so
/// whichever source inserts a key first keeps it.
///
/// The assembler is immutable after construction and can be shared freely across
/// worker threads.
#[derive(Debug, Clone, Default)]
pub struct LabelAssembler {
    user_labels: LabelMap,
    enable_system_labels: bool,
    user_labels_override: bool,
}

impl LabelAssembler {
    /// Creates an assembler applying `user_labels` to every sample.
    #[must_use]
    pub const fn new(
        user_labels: LabelMap,
        enable_system_labels: bool,
        user_labels_override: bool,
    ) -> Self {
        Self {
            user_labels,
            enable_system_labels,
            user_labels_override,
        }
    }

    /// Builds the label set for one sample.
    ///
    /// `system_labels` is the raw payload; it is ignored unless system labels are
    /// enabled, and a malformed payload contributes nothing.
    #[must_use]
    pub fn assemble(
        &self,
        unit: &str,
        metric_labels: &LabelMap,
        resource_labels: &LabelMap,
        system_labels: &[u8],
    ) -> LabelSet {
        let capacity = 1 + metric_labels.len() + resource_labels.len() + self.user_labels.len();
        let mut labels = LabelSet::with_capacity(capacity);
        labels.push_if_absent(UNIT_LABEL, unit);

        append_map(&mut labels, metric_labels);
        append_map(&mut labels, resource_labels);

        if self.user_labels_override {
            append_map(&mut labels, &self.user_labels);
            if self.enable_system_labels {
                add_system_labels(system_labels, &mut labels);
            }
        } else {
            if self.enable_system_labels {
                add_system_labels(system_labels, &mut labels);
            }
            append_map(&mut labels, &self.user_labels);
        }

        labels
    }

    /// Labels applied to every sample.
    #[must_use]
    pub const fn user_labels(&self) -> &LabelMap {
        &self.user_labels
    }

    /// Whether system-label payloads are considered.
    #[must_use]
    pub const fn system_labels_enabled(&self) -> bool {
        self.enable_system_labels
    }

    /// Whether user labels win over system labels.
    #[must_use]
    pub const fn user_labels_override(&self) -> bool {
        self.user_labels_override
    }
}

fn append_map(labels: &mut LabelSet, source: &LabelMap) {
    for (key, value) in source {
        labels.push_if_absent(key, value);
    }
}

/// Appends the members of a system-label payload, skipping keys already present.
///
/// A payload that is empty, `null`, not an object or not JSON at all leaves `labels`
/// unchanged.
pub fn add_system_labels(payload: &[u8], labels: &mut LabelSet) {
    match parse_system_labels(payload) {
        Ok(pairs) => {
            for (key, value) in pairs {
                labels.push_if_absent(&key, &value);
            }
        }
        Err(err) => debug!("Ignoring system labels: {err}"),
    }
}
