//! Property tests for the allocation engine (conservation, continuity,
//! idempotence, strategy selection).

use lta_algo::{allocate, allocate_exception, is_exception_case, select_strategy, Strategy as AllocStrategy};
use lta_core::{ExceptionInput, PartialRequest, PortionRole, ShipmentTotals, Unit};
use proptest::prelude::*;

/// Units with whole-kilogram weights so sums are exact in f64.
fn arb_totals() -> impl Strategy<Value = ShipmentTotals> {
    prop::collection::vec((1u32..=500, 0u32..=50), 1..6).prop_map(|raw| {
        let units: Vec<Unit> = raw
            .iter()
            .enumerate()
            .map(|(i, &(w, p))| Unit::new(i as u32 + 1, f64::from(w), p))
            .collect();
        let total_weight = units.iter().map(|u| u.weight).sum();
        let total_positions = units.iter().map(|u| u.positions).sum();
        ShipmentTotals::new(total_weight, total_positions, units)
    })
}

/// Whole-kilogram partial weights summing exactly to `total`.
fn split_exactly(total: f64, parts: &[u32]) -> Vec<f64> {
    let sum: u64 = parts.iter().map(|&p| u64::from(p)).sum();
    let total_kg = total as u64;
    let mut out: Vec<f64> = parts
        .iter()
        .map(|&p| (total_kg * u64::from(p) / sum) as f64)
        .collect();
    let assigned: f64 = out.iter().sum();
    if let Some(last) = out.last_mut() {
        *last += total - assigned;
    }
    out
}

fn arb_normal_case() -> impl Strategy<Value = (ShipmentTotals, Vec<f64>)> {
    (arb_totals(), prop::collection::vec(1u32..=100, 2..6)).prop_map(|(t, parts)| {
        let w = split_exactly(t.total_weight, &parts);
        (t, w)
    })
}

/// Units weighed to the gram-ish precision of the source sheet (two decimals),
/// zero-weight units included; partials are two-decimal shares, the last one
/// closing the balance so float noise stays in the sums.
fn arb_fractional_case() -> impl Strategy<Value = (ShipmentTotals, Vec<f64>)> {
    (
        prop::collection::vec((0u32..=50_000, 0u32..=50), 1..6),
        prop::collection::vec(1u32..=100, 2..4),
    )
        .prop_map(|(raw, parts)| {
            let units: Vec<Unit> = raw
                .iter()
                .enumerate()
                .map(|(i, &(cents, p))| Unit::new(i as u32 + 1, f64::from(cents) / 100.0, p))
                .collect();
            let total_weight: f64 = units.iter().map(|u| u.weight).sum();
            let total_positions = units.iter().map(|u| u.positions).sum();

            let total_cents: u64 = raw.iter().map(|&(c, _)| u64::from(c)).sum();
            let sum: u64 = parts.iter().map(|&p| u64::from(p)).sum();
            let mut weights: Vec<f64> = parts[..parts.len() - 1]
                .iter()
                .map(|&p| (total_cents * u64::from(p) / sum) as f64 / 100.0)
                .collect();
            let assigned: f64 = weights.iter().sum();
            weights.push(total_weight - assigned);

            (ShipmentTotals::new(total_weight, total_positions, units), weights)
        })
}

proptest! {
    #[test]
    fn fractional_weights_conserve_and_leave_no_positions_behind((totals, weights) in arb_fractional_case()) {
        prop_assume!(totals.total_weight > 0.0 && totals.total_positions > 0);
        prop_assume!(weights.iter().all(|&w| w > 0.0));
        prop_assume!(!is_exception_case(&totals, &weights));

        let d = allocate(&totals, &PartialRequest::new(weights), &ExceptionInput::default()).unwrap();

        let portion_weight: f64 = d.allocations.iter().map(|a| a.portion_weight()).sum();
        prop_assert!((portion_weight - totals.total_weight).abs() < 1e-6);
        prop_assert_eq!(d.total_computed_positions(), u64::from(totals.total_positions));

        for unit in &totals.units {
            let w: f64 = d.portions_of_unit(unit.number).map(|p| p.weight).sum();
            let p: u32 = d.portions_of_unit(unit.number).map(|p| p.positions).sum();
            prop_assert!((w - unit.weight).abs() < 1e-6, "unit {} weight {} vs {}", unit.number, w, unit.weight);
            prop_assert_eq!(p, unit.positions, "unit {} left positions behind", unit.number);
            prop_assert!(d.portions_of_unit(unit.number).all(|p| p.weight >= 0.0));
        }
    }


    #[test]
    fn normal_case_conserves_weight_and_positions((totals, weights) in arb_normal_case()) {
        prop_assume!(totals.total_positions > 0);
        prop_assume!(weights.iter().all(|&w| w > 0.0));
        prop_assume!(!is_exception_case(&totals, &weights));

        let d = allocate(&totals, &PartialRequest::new(weights), &ExceptionInput::default()).unwrap();
        prop_assert!(!d.is_exception_case);

        let portion_weight: f64 = d.allocations.iter().map(|a| a.portion_weight()).sum();
        prop_assert!((portion_weight - totals.total_weight).abs() < 1e-6);
        prop_assert_eq!(d.total_computed_positions(), u64::from(totals.total_positions));
    }

    #[test]
    fn split_units_sum_back_to_their_source((totals, weights) in arb_normal_case()) {
        prop_assume!(totals.total_positions > 0);
        prop_assume!(weights.iter().all(|&w| w > 0.0));
        prop_assume!(!is_exception_case(&totals, &weights));

        let d = allocate(&totals, &PartialRequest::new(weights), &ExceptionInput::default()).unwrap();
        for unit in &totals.units {
            let w: f64 = d.portions_of_unit(unit.number).map(|p| p.weight).sum();
            let p: u32 = d.portions_of_unit(unit.number).map(|p| p.positions).sum();
            prop_assert!((w - unit.weight).abs() < 1e-6, "unit {} weight {} vs {}", unit.number, w, unit.weight);
            prop_assert_eq!(p, unit.positions);

            let fragments: Vec<_> = d.portions_of_unit(unit.number).collect();
            if fragments.len() > 1 {
                prop_assert!(fragments.iter().all(|f| f.is_split));
                prop_assert!(fragments[1..].iter().all(|f| f.role == PortionRole::SplitContinuation));
            }
        }
    }

    #[test]
    fn allocation_is_idempotent((totals, weights) in arb_normal_case(), smallest in prop::option::of(0u32..5)) {
        prop_assume!(totals.total_positions > 0);
        prop_assume!(weights.iter().all(|&w| w > 0.0));
        let req = PartialRequest::new(weights);
        let input = ExceptionInput { smallest_partial_positions: smallest, airport_reference: None };
        let a = allocate(&totals, &req, &input);
        let b = allocate(&totals, &req, &input);
        prop_assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    #[test]
    fn exception_positions_always_reconcile(
        totals in arb_totals(),
        frac in 0.01f64..0.49,
        pos_frac in 0.0f64..=1.0,
    ) {
        prop_assume!(totals.total_positions > 0);
        let first = totals.units[0];
        let smallest_unit = totals.smallest_unit_weight().unwrap();
        let small = smallest_unit * frac;
        prop_assume!(small > 0.0 && small < first.weight);

        let positions = (f64::from(first.positions) * pos_frac).floor() as u32;
        let weights = vec![small, totals.total_weight - small];
        let input = ExceptionInput { smallest_partial_positions: Some(positions), airport_reference: None };
        let d = allocate_exception(&totals, &weights, &input).unwrap();

        let small_alloc = &d.allocations[0];
        let large_alloc = &d.allocations[1];
        prop_assert_eq!(
            u64::from(small_alloc.computed_positions) + u64::from(large_alloc.computed_positions),
            u64::from(totals.total_positions)
        );
        prop_assert_eq!(small_alloc.portions[0].positions, positions);
    }

    #[test]
    fn strategy_flips_exactly_at_smallest_unit_weight(totals in arb_totals(), k in 0usize..3) {
        let smallest = totals.smallest_unit_weight().unwrap();
        prop_assume!(smallest > 1.0);

        let mut weights = vec![smallest; 3];
        weights[k] = smallest;
        prop_assert_eq!(select_strategy(&totals, &weights), AllocStrategy::Sequential);
        weights[k] = smallest - 0.5;
        prop_assert_eq!(select_strategy(&totals, &weights), AllocStrategy::Exception);
    }

    #[test]
    fn strategy_matches_min_weight_rule(totals in arb_totals(), raw in prop::collection::vec(1u32..=600, 2..5)) {
        let weights: Vec<f64> = raw.iter().map(|&w| f64::from(w)).collect();
        let min_w = weights.iter().cloned().fold(f64::INFINITY, f64::min);
        let expect = min_w < totals.smallest_unit_weight().unwrap();
        prop_assert_eq!(select_strategy(&totals, &weights) == AllocStrategy::Exception, expect);
    }
}
