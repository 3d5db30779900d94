//! Property tests for preference schedules
//!
//! These hold for every seed and parameter mix: monotone curves, the floor
//! of 1, endowment aggregation, and stable reads.

use agent_econ::{
    BuyerPreferenceSchedule, DEFAULT_ENDOWMENT_FACTOR, MIN_UNIT_VALUE, PreferenceSchedule,
    Schedule, ScheduleConfig, SellerPreferenceSchedule,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

// === TEST FIXTURES ===

const SEEDS: u64 = 200;

/// Parameter grid covering small and large curves, quiet and noisy draws
fn configs(is_buyer: bool) -> Vec<ScheduleConfig> {
    let mut out = Vec::new();
    for &num_units in &[1, 2, 10, 40] {
        for &base_value in &[1.5, 20.0, 250.0] {
            for &noise in &[0.0, 0.1, 0.5, 0.95] {
                let config = if is_buyer {
                    ScheduleConfig::buyer(num_units, base_value)
                } else {
                    ScheduleConfig::seller(num_units, base_value)
                };
                out.push(config.with_noise(noise));
            }
        }
    }
    out
}

fn values_of(schedule: &impl PreferenceSchedule) -> Vec<f64> {
    schedule.values().values().copied().collect()
}

// === MONOTONICITY ===

#[test]
fn buyer_curves_are_non_increasing_and_floored() {
    for config in configs(true) {
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let schedule = BuyerPreferenceSchedule::generate_with(&config, &mut rng).unwrap();
            let values = values_of(&schedule);

            assert_eq!(values.len() as u32, config.num_units);
            for (i, pair) in values.windows(2).enumerate() {
                assert!(
                    pair[1] <= pair[0],
                    "buyer unit {} rose: {} -> {} ({config:?}, seed {seed})",
                    i + 2,
                    pair[0],
                    pair[1]
                );
            }
            assert!(
                values.iter().all(|v| *v >= MIN_UNIT_VALUE),
                "value below floor ({config:?}, seed {seed}): {values:?}"
            );
        }
    }
}

#[test]
fn seller_curves_are_non_decreasing_and_floored() {
    for config in configs(false) {
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let schedule = SellerPreferenceSchedule::generate_with(&config, &mut rng).unwrap();
            let values = values_of(&schedule);

            for (i, pair) in values.windows(2).enumerate() {
                assert!(
                    pair[1] >= pair[0],
                    "seller unit {} fell: {} -> {} ({config:?}, seed {seed})",
                    i + 2,
                    pair[0],
                    pair[1]
                );
            }
            assert!(values.iter().all(|v| *v >= MIN_UNIT_VALUE));
        }
    }
}

#[test]
fn unit_keys_run_from_one() {
    let schedule = Schedule::generate(&ScheduleConfig::seller(6, 12.0)).unwrap();
    let keys: Vec<u32> = schedule.values().keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3, 4, 5, 6]);
}

// === ENDOWMENT AGGREGATION ===

#[test]
fn buyer_endowment_is_scaled_sum() {
    for seed in 0..SEEDS {
        let config = ScheduleConfig::buyer(15, 40.0).with_noise(0.3);
        let schedule =
            BuyerPreferenceSchedule::generate_with(&config, &mut StdRng::seed_from_u64(seed))
                .unwrap();
        let expected = values_of(&schedule).iter().sum::<f64>() * DEFAULT_ENDOWMENT_FACTOR;
        let diff = (schedule.initial_endowment() - expected).abs();
        assert!(diff < 1e-9, "seed {seed}: diff {diff}");
    }
}

#[test]
fn custom_endowment_factor_is_honoured() {
    let config = ScheduleConfig::buyer(5, 10.0).with_endowment_factor(2.0);
    let schedule =
        BuyerPreferenceSchedule::generate_with(&config, &mut StdRng::seed_from_u64(4)).unwrap();
    let diff = (schedule.initial_endowment() - 2.0 * schedule.total_value()).abs();
    assert!(diff < 1e-9);
    assert_eq!(schedule.endowment_factor(), 2.0);
}

#[test]
fn seller_endowment_is_plain_sum() {
    for seed in 0..SEEDS {
        let config = ScheduleConfig::seller(15, 40.0).with_noise(0.3);
        let schedule =
            SellerPreferenceSchedule::generate_with(&config, &mut StdRng::seed_from_u64(seed))
                .unwrap();
        let expected: f64 = values_of(&schedule).iter().sum();
        assert!((schedule.initial_endowment() - expected).abs() < 1e-9);
    }
}

// === ZERO NOISE ===

#[test]
fn zero_noise_buyer_declines_by_drift_only() {
    for seed in 0..SEEDS {
        let config = ScheduleConfig::buyer(5, 100.0).with_noise(0.0);
        let schedule =
            BuyerPreferenceSchedule::generate_with(&config, &mut StdRng::seed_from_u64(seed))
                .unwrap();

        assert_eq!(schedule.get_value(1), 100.0);
        for unit in 2..=5 {
            let prev = schedule.get_value(unit - 1);
            let cur = schedule.get_value(unit);
            assert!(cur <= prev, "seed {seed}: unit {unit} {cur} > {prev}");
            // Each step shrinks by at most the buyer drift floor
            assert!(cur >= prev * 0.95 - 1e-9, "seed {seed}: unit {unit} fell too far");
        }
    }
}

#[test]
fn zero_noise_seller_rises_by_drift_only() {
    let config = ScheduleConfig::seller(5, 100.0).with_noise(0.0);
    let schedule =
        SellerPreferenceSchedule::generate_with(&config, &mut StdRng::seed_from_u64(8)).unwrap();

    assert_eq!(schedule.get_value(1), 100.0);
    for unit in 2..=5 {
        let prev = schedule.get_value(unit - 1);
        let cur = schedule.get_value(unit);
        assert!(cur >= prev && cur <= prev * 1.05 + 1e-9);
    }
}

// === STABILITY & DEFAULTS ===

#[test]
fn repeated_reads_return_identical_values() {
    let schedule = Schedule::generate(&ScheduleConfig::buyer(10, 75.0).with_noise(0.4)).unwrap();
    let first = schedule.values().clone();
    let endowment = schedule.initial_endowment();

    for _ in 0..10 {
        assert_eq!(schedule.values(), &first);
        assert_eq!(schedule.initial_endowment(), endowment);
    }
}

#[test]
fn lookups_past_the_schedule_are_zero() {
    let schedule = Schedule::generate(&ScheduleConfig::buyer(7, 30.0)).unwrap();
    assert_eq!(schedule.get_value(8), 0.0);
    assert_eq!(schedule.get_value(0), 0.0);
    assert_eq!(schedule.value_at(3.25), 0.0);
}
