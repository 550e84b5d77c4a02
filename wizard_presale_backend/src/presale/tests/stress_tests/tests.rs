use super::*;
use crate::presale::tests::stress_tests::generators::operation_sequence;
use crate::error::PresaleError;
use crate::types::{Affinity, MAX_POWER, SCALE};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================
// CATEGORY 1: STATE DRIFT DETECTION
// ============================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_invariants_hold_after_100_ops(ops in operation_sequence(100), rate in 0u128..200_000) {
        let mut model = PresaleModel::new(rate);

        for (i, op) in ops.into_iter().enumerate() {
            let _ = model.execute(op);

            // Check invariant after EVERY operation
            model.check_invariant()
                .map_err(|e| TestCaseError::fail(format!("Op {}: {}", i, e)))?;
        }
    }

    #[test]
    fn test_destroy_at_any_point_settles_everything(ops in operation_sequence(50)) {
        let mut model = PresaleModel::new(10_000);
        for op in ops {
            let _ = model.execute(op);
        }

        let held = model.presale.held();
        prop_assert!(model.execute(Operation::Destroy).is_success());
        prop_assert_eq!(model.presale.held(), 0);
        prop_assert_eq!(model.paid_in, model.paid_out);
        prop_assert!(held <= model.paid_out);

        // Nothing mutates afterwards
        let result = model.execute(Operation::Conjure {
            user: 1, affinities: vec![Affinity::Neutral], overpay: 0, rejects: false,
        });
        prop_assert_eq!(result, OpResult::Failed(PresaleError::Terminated));
        model.check_invariant().map_err(TestCaseError::fail)?;
    }
}

// Deterministic regression test (reproducible with seed)
#[test]
fn test_deterministic_5k_operations() {
    let mut rng = ChaCha8Rng::seed_from_u64(12345);  // Fixed seed
    let mut model = PresaleModel::new(25_000);
    model.execute(Operation::SetGatekeeper);

    for i in 0..5000 {
        let op = generate_random_op(&mut rng);
        let _ = model.execute(op);

        if i % 100 == 0 {
            model.check_invariant().expect(&format!("Failed at op {}", i));
        }
    }

    model.check_invariant().expect("Final invariant check failed");
}

fn generate_random_op(rng: &mut ChaCha8Rng) -> Operation {
    let affinities = [Affinity::NotSet, Affinity::Neutral, Affinity::Fire, Affinity::Wind, Affinity::Water];
    match rng.gen_range(0..10) {
        0..=3 => {
            let len = rng.gen_range(0..4);
            Operation::Conjure {
                user: rng.gen_range(1..=20),
                affinities: (0..len).map(|_| affinities[rng.gen_range(1..5)]).collect(),
                overpay: rng.gen_range(0..20_000),
                rejects: rng.gen_bool(0.05),
            }
        }
        4 => Operation::ConjureExclusive {
            id: rng.gen_range(1..=55),
            owner: rng.gen_range(1..=20),
            payment: rng.gen_range(0..10_000),
        },
        5 => Operation::SetAffinity {
            caller: rng.gen_range(1..=20),
            id: rng.gen_range(1..150),
            affinity: affinities[rng.gen_range(0..5)],
        },
        6 | 7 => Operation::Absorb {
            ids: (0..rng.gen_range(1..3)).map(|_| rng.gen_range(1..150)).collect(),
            payout_fails: rng.gen_bool(0.05),
        },
        _ => Operation::AdvanceTime { secs: rng.gen_range(0..5) },
    }
}

// ============================================
// CATEGORY 2: EDGE CASE STRESS
// ============================================

#[test]
fn test_doubling_curve_stops_at_power_cap() {
    // Doubling every sale: the 89th elemental would carry power 2^88
    let mut model = PresaleModel::new(100_000);
    model.execute(Operation::AdvanceTime { secs: 10 });

    for _ in 0..100 {
        let price = model.presale.elemental_cost();
        let result = model.execute(Operation::Conjure {
            user: 1, affinities: vec![Affinity::Fire], overpay: 0, rejects: false,
        });
        // Power caps at 2^88: expensive elementals eventually fail validation
        if cost_exceeds_power_cap(price) {
            assert!(matches!(result, OpResult::Failed(PresaleError::Validation(_))));
            break;
        }
        assert_eq!(result, OpResult::Success);
    }

    model.check_invariant().unwrap();
}

fn cost_exceeds_power_cap(cost: u128) -> bool {
    cost / SCALE >= MAX_POWER
}

#[test]
fn test_large_public_batch_is_one_price_progression() {
    let mut model = PresaleModel::new(1_000);
    model.execute(Operation::AdvanceTime { secs: 10 });

    let affinities = vec![Affinity::Water; 200];
    let expected = model.quote_batch(&affinities);
    let start_id = model.presale.next_id();

    let result = model.execute(Operation::Conjure { user: 7, affinities, overpay: 0, rejects: false });
    assert_eq!(result, OpResult::Success);
    assert_eq!(model.paid_in, expected);
    assert_eq!(model.presale.next_id(), start_id + 200);
    assert_eq!(model.presale.balance_of(crate::presale::tests::user(7)), 200);
    model.check_invariant().unwrap();
}

#[test]
fn test_2000_mints_then_absorb_all() {
    let mut model = PresaleModel::new(500);
    model.execute(Operation::SetGatekeeper);
    model.execute(Operation::AdvanceTime { secs: 10 });

    for i in 0..2000u32 {
        let affinity = if i % 3 == 0 { Affinity::Neutral } else { Affinity::Wind };
        let result = model.execute(Operation::Conjure {
            user: (i % 20 + 1) as u8, affinities: vec![affinity], overpay: (i as u128) * 7, rejects: false,
        });
        assert!(result.is_success());
    }

    let ids: Vec<_> = model.presale.store.iter().map(|r| r.id).collect();
    let owed = model.presale.owed_to_live_wizards();
    let surplus = model.presale.held() - owed;
    for chunk in ids.chunks(50) {
        let result = model.execute(Operation::Absorb { ids: chunk.to_vec(), payout_fails: false });
        assert!(result.is_success());
    }

    assert_eq!(model.presale.wizard_count(), 0);
    // Only rounding dust and kept change remain
    assert_eq!(model.presale.held(), surplus);
    model.check_invariant().unwrap();
}
