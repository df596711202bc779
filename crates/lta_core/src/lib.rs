//! lta_core: core types for splitting one LTA (master air waybill) into partial flights.
//!
//! This crate is **I/O-free**. It defines the stable data model used across the
//! workspace (`lta_algo`, `lta_pipeline`, `lta_io`, `lta_cli`):
//!
//! - Source records: `Unit` (one DUM), `ShipmentTotals`, `PartialRequest`
//! - Engine output: `UnitPortion`, `PartialAllocation`, `Distribution`
//! - Exception-case inputs/metadata: `ExceptionInput`, `ExceptionMetadata`
//! - Float helpers for weights and the proportional position estimate
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Input-shape failures detected before any allocation runs.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        EmptyUnits,
        NonPositiveTotal(&'static str),
        NonFinite(&'static str),
        NegativeUnitWeight { unit_number: u32 },
        UnitOrder { index: usize, unit_number: u32 },
        TooFewPartials(usize),
        NonPositivePartialWeight { partial_index: u32 },
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::EmptyUnits => write!(f, "shipment has no units"),
                CoreError::NonPositiveTotal(k) => write!(f, "{k} must be > 0"),
                CoreError::NonFinite(k) => write!(f, "{k} must be a finite number"),
                CoreError::NegativeUnitWeight { unit_number } => {
                    write!(f, "unit {unit_number} has a negative weight")
                }
                CoreError::UnitOrder { index, unit_number } => write!(
                    f,
                    "unit number {unit_number} at position {index} breaks the 1-based ascending order"
                ),
                CoreError::TooFewPartials(n) => {
                    write!(f, "a split needs at least 2 partials, got {n}")
                }
                CoreError::NonPositivePartialWeight { partial_index } => {
                    write!(f, "partial {partial_index} weight must be > 0")
                }
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod numeric;
pub mod shipment;
pub mod distribution;

pub use errors::CoreError;
pub use shipment::{PartialRequest, ShipmentTotals, TotalsDrift, Unit};
pub use distribution::{
    Distribution, ExceptionInput, ExceptionMetadata, PartialAllocation, PortionRole,
    PositionsSource, UnitPortion,
};
