//! lta_pipeline: allocate → reconcile → commit.
//!
//! `plan` is cheap and side-effect free apart from logging; interactive
//! callers run it on every edit. `commit` is the persistence gate: it turns a
//! plan into a `ConfigRecord` only when nothing fatal was found and every
//! warning or provisional value has been explicitly confirmed.

#![forbid(unsafe_code)]

pub mod reconcile;

use thiserror::Error;
use tracing::{debug, info, warn};

use lta_algo::{allocate, allocate_draft, select_strategy, AllocError, Strategy};
use lta_core::{Distribution, ExceptionInput, PartialRequest, ShipmentTotals};
use lta_io::config::ConfigRecord;
use lta_io::IoError;

pub use reconcile::{
    validate, validate_with_tolerance, Finding, ReconcileError, Severity, ValidationReport,
    DEFAULT_WEIGHT_TOLERANCE_PCT,
};

/// Why a plan was not allowed to reach the configuration writer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommitRefusal {
    #[error("draft plans (placeholder partials) cannot be persisted")]
    Draft,
    #[error("partials total {actual} kg vs LTA {expected} kg; confirm the weight mismatch to proceed")]
    WeightMismatch { expected: f64, actual: f64 },
    #[error("positions of airport-cleared partial {partial_index} are a proportional estimate ({positions}); confirm them to proceed")]
    ProvisionalPositions { partial_index: u32, positions: u32 },
}

/// Single error surface for orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("commit refused: {0}")]
    Refused(CommitRefusal),
    #[error(transparent)]
    Io(#[from] IoError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanOptions {
    pub weight_tolerance_pct: f64,
    /// Accept placeholder (zero) partial rows.
    pub draft: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self { weight_tolerance_pct: DEFAULT_WEIGHT_TOLERANCE_PCT, draft: false }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitOptions {
    pub accept_weight_mismatch: bool,
    pub confirm_provisional: bool,
}

/// A computed, reconciled, not-yet-persisted distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub totals: ShipmentTotals,
    pub request: PartialRequest,
    pub strategy: Strategy,
    pub distribution: Distribution,
    pub report: ValidationReport,
    pub draft: bool,
}

pub fn plan(
    totals: &ShipmentTotals,
    request: &PartialRequest,
    exception: &ExceptionInput,
    opts: &PlanOptions,
) -> Result<Plan, PipelineError> {
    let distribution = if opts.draft {
        allocate_draft(totals, request, exception)?
    } else {
        allocate(totals, request, exception)?
    };
    let strategy = select_strategy(totals, &request.weights);
    info!(
        strategy = ?strategy,
        partials = request.len(),
        provisional = distribution.is_provisional(),
        "allocation computed"
    );

    let report = validate_with_tolerance(totals, &distribution, opts.weight_tolerance_pct);
    for finding in &report.findings {
        match finding.severity() {
            Severity::Error => warn!(code = finding.code(), "{finding}"),
            Severity::Warning => debug!(code = finding.code(), "{finding}"),
        }
    }

    Ok(Plan {
        totals: totals.clone(),
        request: request.clone(),
        strategy,
        distribution,
        report,
        draft: opts.draft,
    })
}

/// Persistence gate. Provisional exception positions and weight mismatches
/// need explicit confirmation; fatal findings can never be confirmed away.
pub fn commit(plan: &Plan, opts: &CommitOptions) -> Result<ConfigRecord, PipelineError> {
    if plan.draft {
        return Err(PipelineError::Refused(CommitRefusal::Draft));
    }

    let warnings = plan.report.clone().into_result()?;

    if !opts.accept_weight_mismatch {
        if let Some(Finding::WeightMismatch { expected, actual, .. }) =
            warnings.iter().find(|f| matches!(f, Finding::WeightMismatch { .. }))
        {
            return Err(PipelineError::Refused(CommitRefusal::WeightMismatch {
                expected: *expected,
                actual: *actual,
            }));
        }
    }

    if plan.distribution.is_provisional() && !opts.confirm_provisional {
        let (partial_index, positions) = plan
            .distribution
            .exception_metadata
            .as_ref()
            .map(|m| (m.smallest_partial_index, m.smallest_partial_positions))
            .unwrap_or_default();
        return Err(PipelineError::Refused(CommitRefusal::ProvisionalPositions { partial_index, positions }));
    }

    let record = ConfigRecord::from_distribution(&plan.totals, &plan.request, &plan.distribution)?;
    info!(inputs_sha256 = %record.inputs_sha256, warnings = warnings.len(), "plan committed");
    Ok(record)
}

/// `plan` + `commit` in one call, for non-interactive callers.
pub fn run(
    totals: &ShipmentTotals,
    request: &PartialRequest,
    exception: &ExceptionInput,
    plan_opts: &PlanOptions,
    commit_opts: &CommitOptions,
) -> Result<(Plan, ConfigRecord), PipelineError> {
    let p = plan(totals, request, exception, plan_opts)?;
    let record = commit(&p, commit_opts)?;
    Ok((p, record))
}
