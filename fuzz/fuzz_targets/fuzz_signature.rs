#![no_main]

use libfuzzer_sys::fuzz_target;
use series_dedup::{label_signature, LabelSet};

// Split the input into labels and check that the signature ignores their order.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let text = String::from_utf8_lossy(data);
    let mut parts = text.split('\n');
    let name = parts.next().unwrap_or_default();

    let labels: LabelSet = parts
        .filter_map(|part| part.split_once('='))
        .collect();
    let (keys, values) = labels.into_parts();

    let forward = label_signature(name, &keys, &values);
    assert_eq!(forward, label_signature(name, &keys, &values));

    let mut reversed_keys = keys.clone();
    let mut reversed_values = values.clone();
    reversed_keys.reverse();
    reversed_values.reverse();
    assert_eq!(forward, label_signature(name, &reversed_keys, &reversed_values));

    if let Some(rotate) = keys.len().checked_sub(1).filter(|&n| n > 0) {
        let mut rotated_keys = keys.clone();
        let mut rotated_values = values.clone();
        rotated_keys.rotate_left(rotate);
        rotated_values.rotate_left(rotate);
        assert_eq!(forward, label_signature(name, &rotated_keys, &rotated_values));
    }
});
