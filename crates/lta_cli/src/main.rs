// crates/lta_cli/src/main.rs
//
// load → plan (allocate + reconcile) → review table → commit gate → partials_config.json

mod args;
mod logging;
mod review;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Bad flags, schema/shape errors, inputs the engine rejects.
    pub const VALIDATION: i32 = 2;
    /// Reconciliation found a fatal inconsistency.
    pub const RECONCILE: i32 = 3;
    pub const IO: i32 = 4;
    /// Commit needs an explicit confirmation flag.
    pub const REFUSED: i32 = 5;
}

use std::fs;
use std::process::ExitCode;

use tracing::info;

use args::{parse_and_validate as parse_cli, Args};

use lta_core::{ExceptionInput, PartialRequest, ShipmentTotals};
use lta_io::config::{write_config, CONFIG_FILE_NAME};
use lta_io::loader;
use lta_pipeline::{commit, plan, CommitOptions, PipelineError, PlanOptions};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    Validation(String),
    Reconcile(String),
    Io(String),
    Refused(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Reconcile(m) | MainError::Io(m) | MainError::Refused(m) => {
                f.write_str(m)
            }
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("lta: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    logging::init(args.quiet);

    let rc = match run_once(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("lta: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let (totals, request, exception) = load_inputs(args)?;

    let plan_opts = PlanOptions { weight_tolerance_pct: args.tolerance_pct, draft: args.draft };
    let p = plan(&totals, &request, &exception, &plan_opts).map_err(map_pipeline_err)?;

    if !args.quiet {
        print!("{}", review::render(&p));
    }

    if args.validate_only {
        // Validation fails on fatal findings only; warnings are for the commit gate.
        if let Some(f) = p.report.errors().next() {
            return Err(MainError::Reconcile(format!("{} {f}", f.code())));
        }
        info!("validate-only: inputs OK");
        return Ok(());
    }
    if args.draft {
        info!("draft preview only, nothing written");
        return Ok(());
    }

    let commit_opts = CommitOptions {
        accept_weight_mismatch: args.accept_weight_mismatch,
        confirm_provisional: args.confirm_provisional,
    };
    let record = commit(&p, &commit_opts).map_err(map_pipeline_err)?;

    fs::create_dir_all(&args.out)
        .map_err(|e| MainError::Io(format!("mkdir {}: {e}", args.out.display())))?;
    let path = args.out.join(CONFIG_FILE_NAME);
    write_config(&path, &record).map_err(map_io_err)?;

    if !args.quiet {
        println!("configuration written to {}", path.display());
    }
    Ok(())
}

/// Job file, or totals file + weight list. Exception flags override the job's block.
fn load_inputs(args: &Args) -> Result<(ShipmentTotals, PartialRequest, ExceptionInput), MainError> {
    let (totals, request, mut exception) = match (&args.job, &args.totals, &args.weights) {
        (Some(job), _, _) => {
            let job = loader::load_job(job).map_err(map_io_err)?;
            let request = job.request();
            (job.lta, request, job.exception)
        }
        (None, Some(totals), Some(weights)) => {
            let totals = loader::load_totals(totals).map_err(map_io_err)?;
            let request = loader::parse_weights(weights).map_err(map_io_err)?;
            (totals, request, ExceptionInput::default())
        }
        _ => return Err(MainError::Validation("either --job or --totals with --weights is required".into())),
    };

    if let Some(n) = args.smallest_positions {
        exception.smallest_partial_positions = Some(n);
    }
    if let Some(r) = &args.airport {
        exception.airport_reference = Some(r.clone());
    }
    Ok((totals, request, exception))
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Reconcile(_) => RECONCILE,
        MainError::Io(_) => IO,
        MainError::Refused(_) => REFUSED,
    }
}

fn map_io_err(e: lta_io::IoError) -> MainError {
    use lta_io::IoError::*;
    match e {
        Schema { .. } | Json { .. } | Invalid(_) | Digest { .. } => MainError::Validation(e.to_string()),
        Path(_) | Limit(_) => MainError::Io(e.to_string()),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Alloc(a) => MainError::Validation(a.to_string()),
        PipelineError::Reconcile(r) => MainError::Reconcile(r.to_string()),
        PipelineError::Refused(r) => MainError::Refused(format!("commit refused: {r}")),
        PipelineError::Io(io) => map_io_err(io),
    }
}
