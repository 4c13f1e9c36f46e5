use std::time::{SystemTime, UNIX_EPOCH};

use super::fnv;

/// Computes the signature of a sample without a timestamp.
///
/// See [`signature`].
#[must_use]
pub fn label_signature<K, V>(name: &str, keys: &[K], values: &[V]) -> u64
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    signature(name, keys, values, None)
}

/// Computes the deduplication signature of `(name, labels, timestamp)`.
///
/// Labels are folded in ascending byte-wise key order, so the result does not depend
/// on the order they were supplied in. Each field is terminated by
/// [`fnv::SEPARATOR_BYTE`]. A key without a matching value folds as an empty value.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn signature<K, V>(name: &str, keys: &[K], values: &[V], timestamp: Option<SystemTime>) -> u64
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut h = fnv::add(fnv::new(), name);
    h = fnv::add_byte(h, fnv::SEPARATOR_BYTE);

    if !keys.is_empty() {
        let mut indices: Vec<usize> = (0..keys.len()).collect();
        // stable, ties keep their supplied order
        indices.sort_by(|&a, &b| keys[a].as_ref().cmp(keys[b].as_ref()));

        for index in indices {
            h = fnv::add(h, keys[index].as_ref());
            h = fnv::add_byte(h, fnv::SEPARATOR_BYTE);
            if let Some(value) = values.get(index) {
                h = fnv::add(h, value.as_ref());
            }
            h = fnv::add_byte(h, fnv::SEPARATOR_BYTE);
        }
    }

    if let Some(ts) = timestamp {
        h = fnv::add_u64(h, unix_nanos(ts) as u64);
    }

    h
}

/// Nanoseconds since the Unix epoch, negative before it. Saturates outside the `i64`
/// range.
#[must_use]
pub fn unix_nanos(ts: SystemTime) -> i64 {
    match ts.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(err) => i64::try_from(err.duration().as_nanos()).map_or(i64::MIN, |n| -n),
    }
}
