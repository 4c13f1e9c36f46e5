use series_dedup::{
    CollectorOptions, Deduplicator, DeduplicatorOptions, DeduplicatorStats, EmittedSample,
    LabelMap, Sample, SampleCollector,
};
use std::sync::Arc;
use std::thread;

fn create_test_deduplicator() -> Arc<Deduplicator> {
    Arc::new(Deduplicator::new(&DeduplicatorOptions::default()).unwrap())
}

#[test]
fn test_parallel_check_and_mark_stress() {
    let dedup = create_test_deduplicator();
    let num_threads: u64 = 8;
    let iterations_per_thread: u64 = 10_000;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let dedup = Arc::clone(&dedup);
            thread::spawn(move || {
                let value = format!("thread-{thread_id}");
                let labels = [value.as_str()];
                let mut duplicates = 0_u64;
                for _ in 0..iterations_per_thread {
                    if dedup.check_and_mark("parallel_metric", &["worker"], &labels, None) {
                        duplicates += 1;
                    }
                }
                duplicates
            })
        })
        .collect();

    for handle in handles {
        let duplicates = handle.join().expect("Thread panicked");
        assert_eq!(duplicates, iterations_per_thread - 1);
    }

    assert_eq!(
        dedup.stats(),
        DeduplicatorStats {
            checks: num_threads * iterations_per_thread,
            duplicates: num_threads * (iterations_per_thread - 1),
            unique: 8,
        }
    );
}

#[test]
fn test_parallel_shared_signatures() {
    let dedup = create_test_deduplicator();
    let num_threads = 8;
    let series = 1_000_u32;

    // every thread tries to mark the same series; each one is won by exactly one thread
    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let dedup = Arc::clone(&dedup);
            thread::spawn(move || {
                let mut won = 0_u32;
                for i in 0..series {
                    let id = i.to_string();
                    if !dedup.check_and_mark("shared_metric", &["id"], &[id.as_str()], None) {
                        won += 1;
                    }
                }
                won
            })
        })
        .collect();

    let won: u32 = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .sum();
    assert_eq!(won, series);
    assert_eq!(dedup.len(), series as usize);
}

#[test]
fn test_parallel_revert_and_remark() {
    let dedup = create_test_deduplicator();
    let num_threads = 4;
    let iterations_per_thread = 2_000;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let dedup = Arc::clone(&dedup);
            thread::spawn(move || {
                let value = format!("thread-{thread_id}");
                for _ in 0..iterations_per_thread {
                    let labels = [value.as_str()];
                    assert!(!dedup.check_and_mark("revert_metric", &["worker"], &labels, None));
                    dedup.revert_mark("revert_metric", &["worker"], &labels, None);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let stats = dedup.stats();
    assert!(dedup.is_empty());
    assert_eq!(stats.unique, 0);
    assert_eq!(stats.duplicates, 0);
}

#[test]
fn test_parallel_scrapes_with_duplicates() {
    let options = CollectorOptions {
        enable_system_labels: true,
        workers: 8,
        ..CollectorOptions::default()
    };
    let collector = SampleCollector::new(options).unwrap();

    let shards: Vec<Vec<Sample>> = (0..16_u32)
        .map(|shard| {
            (0..500_u32)
                .flat_map(|i| {
                    let mut metric_labels = LabelMap::new();
                    metric_labels.insert("series".to_string(), format!("{shard}-{i}"));
                    let sample = Sample::new("stress_metric", f64::from(i))
                        .with_metric_labels(metric_labels)
                        .with_system_labels(r#"{"a": "1", "b": "2"}"#);
                    let reordered = sample.clone().with_system_labels(r#"{"b": "2", "a": "1"}"#);
                    [sample, reordered]
                })
                .collect()
        })
        .collect();

    for _ in 0..3 {
        let mut sink: Vec<EmittedSample> = Vec::new();
        let stats = collector.scrape(&shards, &mut sink);
        assert_eq!(stats.emitted, 16 * 500);
        assert_eq!(stats.duplicates, 16 * 500);
        assert_eq!(stats.failed, 0);
        assert_eq!(sink.len(), 16 * 500);
        assert_eq!(collector.deduplicator().stats().unique, 16 * 500);
    }
}
