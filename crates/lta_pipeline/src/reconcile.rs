//! crates/lta_pipeline/src/reconcile.rs
//! Post-allocation checks of a `Distribution` against the LTA totals.
//!
//! - Requested weights may drift from the LTA weight within a tolerance
//!   (default 1 %); beyond it → `WeightMismatch` warning.
//! - Positions are integral customs counts: any difference → `PositionMismatch` error.
//! - A partial with weight but no units → `EmptyAllocation` error.
//! - Units running out before a partial is filled → `PortionShortfall` warning.
//! - A partial whose unit portions carry a different position count than it
//!   declares (a split unit held fewer positions than the remainder it had to
//!   absorb) → `PositionDrift` warning. Normal case only.
//!
//! Findings are sorted (errors first, then code, then partial) so reports are
//! identical across runs.

use core::fmt;

use lta_core::numeric::{approx_eq, WEIGHT_EPSILON};
use lta_core::{Distribution, ShipmentTotals};
use thiserror::Error;

pub const DEFAULT_WEIGHT_TOLERANCE_PCT: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Finding {
    WeightMismatch { expected: f64, actual: f64, tolerance: f64 },
    PortionShortfall { partial_index: u32, target_weight: f64, allocated_weight: f64 },
    PositionMismatch { expected: u64, actual: u64 },
    EmptyAllocation { partial_index: u32, target_weight: f64 },
    PositionDrift { partial_index: u32, computed_positions: u32, portion_positions: u64 },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::WeightMismatch { .. }
            | Finding::PortionShortfall { .. }
            | Finding::PositionDrift { .. } => Severity::Warning,
            Finding::PositionMismatch { .. } | Finding::EmptyAllocation { .. } => Severity::Error,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Finding::WeightMismatch { .. } => "Weight.Mismatch",
            Finding::PortionShortfall { .. } => "Partial.Shortfall",
            Finding::PositionMismatch { .. } => "Positions.Mismatch",
            Finding::EmptyAllocation { .. } => "Partial.Empty",
            Finding::PositionDrift { .. } => "Partial.PositionDrift",
        }
    }

    pub fn partial_index(&self) -> Option<u32> {
        match self {
            Finding::PortionShortfall { partial_index, .. }
            | Finding::EmptyAllocation { partial_index, .. }
            | Finding::PositionDrift { partial_index, .. } => Some(*partial_index),
            Finding::WeightMismatch { .. } | Finding::PositionMismatch { .. } => None,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::WeightMismatch { expected, actual, tolerance } => write!(
                f,
                "partials total {actual} kg vs LTA {expected} kg (tolerance ±{tolerance} kg)"
            ),
            Finding::PortionShortfall { partial_index, target_weight, allocated_weight } => write!(
                f,
                "partial {partial_index}: units cover {allocated_weight} of {target_weight} kg"
            ),
            Finding::PositionMismatch { expected, actual } => {
                write!(f, "partials declare {actual} positions, LTA has {expected}")
            }
            Finding::EmptyAllocation { partial_index, target_weight } => {
                write!(f, "partial {partial_index} weighs {target_weight} kg but received no units")
            }
            Finding::PositionDrift { partial_index, computed_positions, portion_positions } => write!(
                f,
                "partial {partial_index} declares {computed_positions} positions, its units carry {portion_positions}"
            ),
        }
    }
}

/// Fatal reconciliation outcomes; the distribution must not be persisted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("position mismatch: partials declare {actual} positions, LTA has {expected}")]
    PositionMismatch { expected: u64, actual: u64 },
    #[error("empty allocation: partial {partial_index} weighs {target_weight} kg but received no units")]
    EmptyAllocation { partial_index: u32, target_weight: f64 },
}

/// pass = no `Error` findings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub pass: bool,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| f.severity() == Severity::Error)
    }

    pub fn has_weight_mismatch(&self) -> bool {
        self.findings.iter().any(|f| matches!(f, Finding::WeightMismatch { .. }))
    }

    /// First fatal finding as a typed error; otherwise the warnings.
    pub fn into_result(self) -> Result<Vec<Finding>, ReconcileError> {
        let mut warnings = Vec::new();
        for finding in self.findings {
            match finding {
                Finding::PositionMismatch { expected, actual } => {
                    return Err(ReconcileError::PositionMismatch { expected, actual })
                }
                Finding::EmptyAllocation { partial_index, target_weight } => {
                    return Err(ReconcileError::EmptyAllocation { partial_index, target_weight })
                }
                w => warnings.push(w),
            }
        }
        Ok(warnings)
    }
}

pub fn validate(totals: &ShipmentTotals, distribution: &Distribution) -> ValidationReport {
    validate_with_tolerance(totals, distribution, DEFAULT_WEIGHT_TOLERANCE_PCT)
}

pub fn validate_with_tolerance(
    totals: &ShipmentTotals,
    distribution: &Distribution,
    tolerance_pct: f64,
) -> ValidationReport {
    let mut findings = Vec::new();

    findings.extend(check_weight(totals, distribution, tolerance_pct));
    findings.extend(check_positions(totals, distribution));
    findings.extend(check_empty_partials(distribution));
    if !distribution.is_exception_case {
        findings.extend(check_shortfall(distribution, tolerance_pct));
        findings.extend(check_position_drift(distribution));
    }

    sort_findings_stably(&mut findings);

    ValidationReport {
        pass: !findings.iter().any(|f| f.severity() == Severity::Error),
        findings,
    }
}

fn check_weight(totals: &ShipmentTotals, d: &Distribution, tolerance_pct: f64) -> Option<Finding> {
    let expected = totals.total_weight;
    let actual = d.total_target_weight();
    let tolerance = expected * tolerance_pct / 100.0;
    (!approx_eq(actual, expected, tolerance + WEIGHT_EPSILON))
        .then_some(Finding::WeightMismatch { expected, actual, tolerance })
}

fn check_positions(totals: &ShipmentTotals, d: &Distribution) -> Option<Finding> {
    let expected = u64::from(totals.total_positions);
    let actual = d.total_computed_positions();
    (actual != expected).then_some(Finding::PositionMismatch { expected, actual })
}

fn check_empty_partials(d: &Distribution) -> Vec<Finding> {
    d.allocations
        .iter()
        .filter(|a| a.target_weight > 0.0 && a.portions.is_empty())
        .map(|a| Finding::EmptyAllocation { partial_index: a.partial_index, target_weight: a.target_weight })
        .collect()
}

fn check_shortfall(d: &Distribution, tolerance_pct: f64) -> Vec<Finding> {
    d.allocations
        .iter()
        .filter(|a| a.target_weight > 0.0 && !a.portions.is_empty())
        .filter_map(|a| {
            let allocated_weight = a.portion_weight();
            let slack = a.target_weight * tolerance_pct / 100.0;
            (a.target_weight - allocated_weight > slack + WEIGHT_EPSILON).then_some(
                Finding::PortionShortfall {
                    partial_index: a.partial_index,
                    target_weight: a.target_weight,
                    allocated_weight,
                },
            )
        })
        .collect()
}

fn check_position_drift(d: &Distribution) -> Vec<Finding> {
    d.allocations
        .iter()
        .filter(|a| !a.portions.is_empty())
        .filter_map(|a| {
            let portion_positions = a.portion_positions();
            (portion_positions != u64::from(a.computed_positions)).then_some(Finding::PositionDrift {
                partial_index: a.partial_index,
                computed_positions: a.computed_positions,
                portion_positions,
            })
        })
        .collect()
}

fn sort_findings_stably(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.severity()
            .cmp(&b.severity())
            .then_with(|| a.code().cmp(b.code()))
            .then_with(|| a.partial_index().cmp(&b.partial_index()))
    });
}
