//! Exception-case allocation: one partial is lighter than every unit because
//! it was cleared at the airport before any depot statement existed for it.
//!
//! Contract:
//! - Smallest partial = minimum positive weight (first on ties). It receives a
//!   single `ExceptionPortion` carved from the first unit and needs no depot
//!   statement.
//! - Its positions come from the operator (`ExceptionInput`); without them the
//!   proportional estimate is used and the result is marked provisional.
//! - Largest partial (maximum weight among the others) receives the first unit
//!   reduced by the smallest partial (`ExceptionAdjusted`), then every other unit
//!   unmodified. Its positions are `total - smallest`, never re-estimated.
//! - Any further partials get empty allocations; reconciliation reports them.
//!   Placeholder (zero) rows are never picked as the largest partial.

use lta_core::numeric::proportional_positions;
use lta_core::{
    CoreError, Distribution, ExceptionInput, ExceptionMetadata, PartialAllocation, PortionRole,
    PositionsSource, ShipmentTotals, UnitPortion,
};

use crate::AllocError;

pub fn allocate_exception(
    totals: &ShipmentTotals,
    weights: &[f64],
    input: &ExceptionInput,
) -> Result<Distribution, AllocError> {
    if weights.len() < 2 {
        return Err(CoreError::TooFewPartials(weights.len()).into());
    }
    let first = *totals.units.first().ok_or(CoreError::EmptyUnits)?;

    let smallest_idx = index_of_smallest_positive(weights)
        .ok_or(CoreError::NonPositivePartialWeight { partial_index: 1 })?;
    let largest_idx = index_of_largest_excluding(weights, smallest_idx);
    let smallest_weight = weights[smallest_idx];

    let (smallest_positions, positions_source) = match input.smallest_partial_positions {
        Some(p) => (p, PositionsSource::Supplied),
        None => (
            proportional_positions(smallest_weight, totals.total_positions, totals.total_weight),
            PositionsSource::Proportional,
        ),
    };

    if smallest_weight >= first.weight || smallest_positions > first.positions {
        return Err(AllocError::InsufficientUnitWeight {
            unit_number: first.number,
            unit_weight: first.weight,
            unit_positions: first.positions,
            smallest_partial_weight: smallest_weight,
            smallest_partial_positions: smallest_positions,
        });
    }

    let smallest = PartialAllocation {
        partial_index: smallest_idx as u32 + 1,
        target_weight: smallest_weight,
        computed_positions: smallest_positions,
        portions: vec![UnitPortion::whole(
            first.number,
            smallest_weight,
            smallest_positions,
            PortionRole::ExceptionPortion,
        )],
        requires_customs_depot_statement: false,
    };

    let mut largest_portions = Vec::with_capacity(totals.units.len());
    largest_portions.push(UnitPortion::whole(
        first.number,
        first.weight - smallest_weight,
        first.positions - smallest_positions,
        PortionRole::ExceptionAdjusted,
    ));
    largest_portions.extend(
        totals.units[1..]
            .iter()
            .map(|u| UnitPortion::whole(u.number, u.weight, u.positions, PortionRole::Normal)),
    );
    // Draft with placeholders only beside the smallest row: nobody takes the rest.
    let mut largest = largest_idx.map(|idx| PartialAllocation {
        partial_index: idx as u32 + 1,
        target_weight: weights[idx],
        computed_positions: totals.total_positions.saturating_sub(smallest_positions),
        portions: largest_portions,
        requires_customs_depot_statement: true,
    });

    let mut smallest = Some(smallest);
    let allocations = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let slot = if i == smallest_idx {
                smallest.take()
            } else if Some(i) == largest_idx {
                largest.take()
            } else {
                None
            };
            slot.unwrap_or_else(|| PartialAllocation::empty(i as u32 + 1, w))
        })
        .collect();

    Ok(Distribution {
        allocations,
        is_exception_case: true,
        exception_metadata: Some(ExceptionMetadata {
            smallest_partial_index: smallest_idx as u32 + 1,
            smallest_partial_positions: smallest_positions,
            positions_source,
            airport_reference: input.airport_reference.clone(),
        }),
    })
}

fn index_of_smallest_positive(weights: &[f64]) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .filter(|(_, &w)| w > 0.0)
        .fold(None, |best: Option<(usize, f64)>, (i, &w)| match best {
            Some((_, bw)) if bw <= w => best,
            _ => Some((i, w)),
        })
        .map(|(i, _)| i)
}

/// First maximum among positive weights other than `skip`. `None` when every
/// other row is a placeholder.
fn index_of_largest_excluding(weights: &[f64], skip: usize) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .filter(|&(i, &w)| i != skip && w > 0.0)
        .fold(None, |best: Option<(usize, f64)>, (i, &w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((i, w)),
        })
        .map(|(i, _)| i)
}
