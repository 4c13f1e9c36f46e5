#![no_main]

use libfuzzer_sys::fuzz_target;
use series_dedup::{add_system_labels, parse_system_labels, LabelSet};

// Arbitrary payloads either append every member or leave the set untouched.
fuzz_target!(|data: &[u8]| {
    let mut labels: LabelSet = [("unit", "bytes"), ("zone", "a")].into_iter().collect();
    let before = labels.clone();

    add_system_labels(data, &mut labels);

    match parse_system_labels(data) {
        Ok(pairs) => {
            assert_eq!(labels.get("unit"), Some("bytes"));
            assert_eq!(labels.get("zone"), Some("a"));
            for (key, _) in &pairs {
                assert!(labels.key_exists(key));
            }
            assert!(labels.len() <= before.len() + pairs.len());
        }
        Err(_) => assert_eq!(labels, before),
    }
});
