//! Source-side records: DUM units, LTA totals, and the user's partial request.
//!
//! These are read once (spreadsheet/JSON) and never mutated by allocation;
//! the engine derives new `UnitPortion`s from them.

use crate::errors::CoreError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One customs-declaration unit (DUM) within an LTA.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unit {
    /// 1-based, stable ordering within the LTA.
    pub number: u32,
    pub weight: f64,
    pub positions: u32,
}

impl Unit {
    pub fn new(number: u32, weight: f64, positions: u32) -> Self {
        Self { number, weight, positions }
    }
}

/// LTA-level totals plus the ordered unit list.
///
/// Declared totals are expected to match the unit sums, but source sheets may
/// carry small rounding drift, so that is reported (`drift`) rather than enforced.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShipmentTotals {
    pub total_weight: f64,
    pub total_positions: u32,
    pub units: Vec<Unit>,
}

/// Declared totals minus unit sums.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TotalsDrift {
    pub weight: f64,
    pub positions: i64,
}

impl TotalsDrift {
    pub fn is_exact(&self, weight_tolerance: f64) -> bool {
        self.weight.abs() <= weight_tolerance && self.positions == 0
    }
}

impl ShipmentTotals {
    pub fn new(total_weight: f64, total_positions: u32, units: Vec<Unit>) -> Self {
        Self { total_weight, total_positions, units }
    }

    /// Shape checks required before allocation.
    pub fn check(&self) -> Result<(), CoreError> {
        if !self.total_weight.is_finite() {
            return Err(CoreError::NonFinite("total_weight"));
        }
        if self.total_weight <= 0.0 {
            return Err(CoreError::NonPositiveTotal("total_weight"));
        }
        if self.total_positions == 0 {
            return Err(CoreError::NonPositiveTotal("total_positions"));
        }
        if self.units.is_empty() {
            return Err(CoreError::EmptyUnits);
        }

        let mut prev = 0u32;
        for (index, u) in self.units.iter().enumerate() {
            if !u.weight.is_finite() {
                return Err(CoreError::NonFinite("unit weight"));
            }
            if u.weight < 0.0 {
                return Err(CoreError::NegativeUnitWeight { unit_number: u.number });
            }
            if u.number <= prev {
                return Err(CoreError::UnitOrder { index, unit_number: u.number });
            }
            prev = u.number;
        }
        Ok(())
    }

    /// Minimum unit weight; `None` for an empty unit list.
    pub fn smallest_unit_weight(&self) -> Option<f64> {
        self.units.iter().map(|u| u.weight).reduce(f64::min)
    }

    pub fn unit_weight_sum(&self) -> f64 {
        self.units.iter().map(|u| u.weight).sum()
    }

    pub fn unit_position_sum(&self) -> u64 {
        self.units.iter().map(|u| u64::from(u.positions)).sum()
    }

    pub fn drift(&self) -> TotalsDrift {
        TotalsDrift {
            weight: self.total_weight - self.unit_weight_sum(),
            positions: i64::from(self.total_positions) - self.unit_position_sum() as i64,
        }
    }
}

/// User-entered target weights, one per physical partial flight (request order).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartialRequest {
    pub weights: Vec<f64>,
}

impl PartialRequest {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Strict check: at least two partials, every weight finite and > 0.
    pub fn check(&self) -> Result<(), CoreError> {
        self.check_shape(false)
    }

    /// Draft check: placeholder rows (`0`) are accepted while a form is filled in.
    pub fn check_draft(&self) -> Result<(), CoreError> {
        self.check_shape(true)
    }

    fn check_shape(&self, allow_placeholders: bool) -> Result<(), CoreError> {
        if self.weights.len() < 2 {
            return Err(CoreError::TooFewPartials(self.weights.len()));
        }
        for (i, &w) in self.weights.iter().enumerate() {
            if !w.is_finite() {
                return Err(CoreError::NonFinite("partial weight"));
            }
            let ok = if allow_placeholders { w >= 0.0 } else { w > 0.0 };
            if !ok {
                return Err(CoreError::NonPositivePartialWeight { partial_index: i as u32 + 1 });
            }
        }
        Ok(())
    }
}
