// crates/lta_algo/src/lib.rs
//! Allocation engine: given LTA totals and a partial request, decide the
//! strategy and compute the full `Distribution`.
//!
//! Pure and stateless: no I/O, no logging, no shared state. Same inputs give
//! the same `Distribution`, so callers may recompute on every keystroke.
#![forbid(unsafe_code)]

use core::fmt;

pub use lta_core::{
    CoreError, Distribution, ExceptionInput, PartialRequest, ShipmentTotals,
};

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    pub mod sequential;
    pub mod exception;

    pub use exception::allocate_exception;
    pub use sequential::allocate_sequential;
}

pub use allocation::{allocate_exception, allocate_sequential};

// ----------------------------- Errors ------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum AllocError {
    /// Malformed totals or request; nothing was allocated.
    InvalidInput(CoreError),
    /// The airport-cleared partial does not fit inside the first unit.
    InsufficientUnitWeight {
        unit_number: u32,
        unit_weight: f64,
        unit_positions: u32,
        smallest_partial_weight: f64,
        smallest_partial_positions: u32,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::InvalidInput(e) => write!(f, "invalid input: {e}"),
            AllocError::InsufficientUnitWeight {
                unit_number,
                unit_weight,
                unit_positions,
                smallest_partial_weight,
                smallest_partial_positions,
            } => write!(
                f,
                "airport-cleared partial ({smallest_partial_weight} kg, {smallest_partial_positions} pos) \
                 does not fit in unit {unit_number} ({unit_weight} kg, {unit_positions} pos)"
            ),
        }
    }
}

impl std::error::Error for AllocError {}

impl From<CoreError> for AllocError {
    fn from(e: CoreError) -> Self {
        AllocError::InvalidInput(e)
    }
}

// ----------------------------- Strategy selection ------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    Sequential,
    Exception,
}

/// Exception case iff some positive partial weight is strictly below the
/// smallest unit weight. Placeholder (zero) rows never trigger it.
pub fn is_exception_case(totals: &ShipmentTotals, weights: &[f64]) -> bool {
    match totals.smallest_unit_weight() {
        Some(smallest) => weights.iter().any(|&w| w > 0.0 && w < smallest),
        None => false,
    }
}

pub fn select_strategy(totals: &ShipmentTotals, weights: &[f64]) -> Strategy {
    if is_exception_case(totals, weights) {
        Strategy::Exception
    } else {
        Strategy::Sequential
    }
}

// ----------------------------- Entry points ------------------------------------------

/// Strict entry: every partial weight must be > 0 and there must be at least two.
///
/// `exception` is only consulted when the exception strategy is selected.
pub fn allocate(
    totals: &ShipmentTotals,
    request: &PartialRequest,
    exception: &ExceptionInput,
) -> Result<Distribution, AllocError> {
    totals.check()?;
    request.check()?;
    dispatch(totals, &request.weights, exception)
}

/// Draft entry for live previews: placeholder rows (`0`) are allowed and come
/// back as empty allocations.
pub fn allocate_draft(
    totals: &ShipmentTotals,
    request: &PartialRequest,
    exception: &ExceptionInput,
) -> Result<Distribution, AllocError> {
    totals.check()?;
    request.check_draft()?;
    dispatch(totals, &request.weights, exception)
}

fn dispatch(
    totals: &ShipmentTotals,
    weights: &[f64],
    exception: &ExceptionInput,
) -> Result<Distribution, AllocError> {
    match select_strategy(totals, weights) {
        Strategy::Sequential => Ok(allocate_sequential(totals, weights)),
        Strategy::Exception => allocate_exception(totals, weights, exception),
    }
}
