use proptest::prelude::*;
use ticktop::{Observation, RingBuffer, TopNTracker, TrackerConfig};

fn tracker(alpha: f64, linger: u32, top_n: usize) -> TopNTracker {
    TopNTracker::new(TrackerConfig {
        alpha_value:       alpha,
        alpha_quality:     alpha,
        decay_factor:      0.15,
        linger_ticks:      linger,
        top_n,
        min_visible_value: 0.0,
        history_len:       0,
    })
    .unwrap()
}

proptest! {
    #[test]
    fn series_is_last_capacity_pushes(
        cap in 1usize..32,
        values in prop::collection::vec(any::<u32>(), 0..128),
    ) {
        let mut rb = RingBuffer::new(cap, 0u32).unwrap();
        for &v in &values {
            rb.push(v);
        }
        if values.len() >= cap {
            prop_assert_eq!(rb.to_series(), values[values.len() - cap..].to_vec());
        }
        let filled = rb.filled();
        prop_assert_eq!(rb.last_n(filled), values[values.len() - filled..].to_vec());
        prop_assert_eq!(rb.to_series().len(), cap);
    }

    #[test]
    fn capacity_pushes_restore_head(cap in 1usize..64, warmup in 0usize..64) {
        let mut rb = RingBuffer::new(cap, 0u8).unwrap();
        for _ in 0..warmup {
            rb.push(1);
        }
        let head = rb.head();
        for _ in 0..cap {
            rb.push(2);
        }
        prop_assert_eq!(rb.head(), head);
    }

    #[test]
    fn capacity_one_reflects_latest(values in prop::collection::vec(any::<i64>(), 1..50)) {
        let mut rb = RingBuffer::new(1, 0i64).unwrap();
        for &v in &values {
            rb.push(v);
            prop_assert_eq!(rb.to_series(), vec![v]);
        }
    }

    #[test]
    fn constant_input_converges(alpha in 0.05f64..=1.0, target in 1.0f64..1e9) {
        let mut t = tracker(alpha, 3, 5);
        t.ingest_tick(vec![Observation::new("a", 0.0, 0.0)]);
        // Error shrinks by (1 - alpha) per tick: within 1% after ln(100)/alpha ticks.
        let bound = (100f64.ln() / alpha).ceil() as usize;
        for _ in 0..bound {
            t.ingest_tick(vec![Observation::new("a", target, 0.0)]);
        }
        let v = t.get("a").unwrap().smoothed_value;
        prop_assert!((v - target).abs() <= target * 0.01 + 1e-9, "{} vs {}", v, target);
    }

    #[test]
    fn absent_for_linger_plus_one_is_gone(linger in 0u32..10, value in 1.0f64..1e6) {
        let mut t = tracker(0.3, linger, 5);
        t.ingest_tick(vec![Observation::new("a", value, 0.0)]);
        for _ in 0..linger {
            t.ingest_tick(Vec::new());
            prop_assert!(t.top_entities().iter().any(|e| e.key == "a"));
        }
        t.ingest_tick(Vec::new());
        prop_assert!(t.top_entities().iter().all(|e| e.key != "a"));
    }

    #[test]
    fn ranking_is_bounded_and_sorted(
        top_n in 1usize..8,
        ticks in prop::collection::vec(
            prop::collection::vec((0u8..12, 0.0f64..1000.0), 0..12),
            1..20,
        ),
    ) {
        let mut t = tracker(0.5, 2, top_n);
        for tick in ticks {
            let obs: Vec<Observation> = tick
                .into_iter()
                .map(|(k, v)| Observation::new(format!("k{}", k), v, 0.0))
                .collect();
            t.ingest_tick(obs);

            let top = t.top_entities();
            prop_assert!(top.len() <= top_n);
            prop_assert_eq!(top.len(), t.len().min(top_n));
            for w in top.windows(2) {
                prop_assert!(
                    w[0].value > w[1].value || (w[0].value == w[1].value && w[0].key < w[1].key)
                );
            }
        }
    }
}
