//! Sequential (normal-case) allocation: one left-to-right sweep over units,
//! filling partials in request order and splitting the unit that straddles
//! a partial boundary.
//!
//! Contract:
//! - Each partial's position count is the proportional estimate
//!   `round(w * total_positions / total_weight)`, not an accumulated sum; the
//!   estimate is capped at what is still unassigned, and the last positive
//!   partial closes the balance (`total - earlier targets`), so partial counts
//!   always sum to `total_positions`.
//! - A split fragment absorbs `target - positions_so_far` (clamped to what the
//!   unit still holds), so the partial-level count is never moved by rounding.
//! - Placeholder rows (`w <= 0`) yield empty allocations and do not move the cursor.
//! - Running out of units stops early; the shortfall is left for reconciliation.
//!
//! The sweep is a fold over partials carrying `(cursor, remaining weight,
//! remaining positions)`; units themselves are never mutated.

use lta_core::numeric::{is_zero_weight, le_weight, proportional_positions};
use lta_core::{Distribution, PartialAllocation, PortionRole, ShipmentTotals, Unit, UnitPortion};

/// Position in the unit list plus what is left of the current unit.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Cursor {
    index: usize,
    remaining_weight: f64,
    remaining_positions: u32,
    /// An earlier partial already took a fragment of this unit.
    touched: bool,
}

impl Cursor {
    fn at(units: &[Unit], index: usize) -> Self {
        match units.get(index) {
            Some(u) => Cursor {
                index,
                remaining_weight: u.weight,
                remaining_positions: u.positions,
                touched: false,
            },
            None => Cursor { index: units.len(), remaining_weight: 0.0, remaining_positions: 0, touched: false },
        }
    }

    fn exhausted(&self, units: &[Unit]) -> bool {
        self.index >= units.len()
    }
}

/// Fold accumulator.
struct Sweep {
    cursor: Cursor,
    positions_assigned: u32,
    allocations: Vec<PartialAllocation>,
}

/// Allocate `weights` over `totals.units` in order. Never fails; input shape is
/// checked by the caller (`allocate` / `allocate_draft`).
pub fn allocate_sequential(totals: &ShipmentTotals, weights: &[f64]) -> Distribution {
    let units = totals.units.as_slice();
    let closing = weights.iter().rposition(|&w| w > 0.0);

    let start = Sweep {
        cursor: Cursor::at(units, 0),
        positions_assigned: 0,
        allocations: Vec::with_capacity(weights.len()),
    };

    let end = weights.iter().enumerate().fold(start, |mut sweep, (i, &weight)| {
        let partial_index = i as u32 + 1;
        if weight <= 0.0 {
            sweep.allocations.push(PartialAllocation::empty(partial_index, weight));
            return sweep;
        }

        let open_positions = totals.total_positions.saturating_sub(sweep.positions_assigned);
        let target_positions = if closing == Some(i) {
            open_positions
        } else {
            proportional_positions(weight, totals.total_positions, totals.total_weight).min(open_positions)
        };

        let (allocation, cursor) = fill_partial(units, sweep.cursor, partial_index, weight, target_positions);
        sweep.cursor = cursor;
        sweep.positions_assigned = sweep.positions_assigned.saturating_add(target_positions);
        sweep.allocations.push(allocation);
        sweep
    });

    Distribution { allocations: end.allocations, is_exception_case: false, exception_metadata: None }
}

/// Pull units (or fragments) from `cursor` until `target_weight` is reached or
/// units run out. Returns the allocation and the cursor for the next partial.
fn fill_partial(
    units: &[Unit],
    mut cursor: Cursor,
    partial_index: u32,
    target_weight: f64,
    target_positions: u32,
) -> (PartialAllocation, Cursor) {
    let mut portions = Vec::new();
    let mut needed = target_weight;
    let mut positions_so_far: u32 = 0;

    // Zero-weight leftovers are swept into the current partial rather than stranded.
    while !cursor.exhausted(units) && (!is_zero_weight(needed) || is_zero_weight(cursor.remaining_weight)) {
        let unit = units[cursor.index];

        if le_weight(cursor.remaining_weight, needed) {
            let portion = if cursor.touched {
                UnitPortion::fragment(
                    unit.number,
                    partial_index,
                    cursor.remaining_weight,
                    cursor.remaining_positions,
                    PortionRole::SplitContinuation,
                )
            } else {
                UnitPortion::whole(unit.number, unit.weight, unit.positions, PortionRole::Normal)
            };
            positions_so_far = positions_so_far.saturating_add(cursor.remaining_positions);
            needed = (needed - cursor.remaining_weight).max(0.0);
            portions.push(portion);
            cursor = Cursor::at(units, cursor.index + 1);
        } else {
            let share = target_positions
                .saturating_sub(positions_so_far)
                .min(cursor.remaining_positions);
            let role = if cursor.touched { PortionRole::SplitContinuation } else { PortionRole::Normal };
            portions.push(UnitPortion::fragment(unit.number, partial_index, needed, share, role));
            positions_so_far = positions_so_far.saturating_add(share);
            cursor.remaining_weight -= needed;
            cursor.remaining_positions -= share;
            cursor.touched = true;
            needed = 0.0;
        }
    }

    let allocation = PartialAllocation {
        partial_index,
        target_weight,
        computed_positions: target_positions,
        portions,
        requires_customs_depot_statement: true,
    };
    (allocation, cursor)
}
