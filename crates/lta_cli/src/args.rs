// crates/lta_cli/src/args.rs
//
// Argument surface for the `lta` binary.
// - Exactly one of: --job  XOR  (--totals + --weights)
// - Exception input (--smallest-positions, --airport) overrides the job file's block
// - --validate-only / --draft compute and print but never write
// - No networked paths (reject any scheme:// like http/https/file)

use clap::Parser;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use lta_pipeline::DEFAULT_WEIGHT_TOLERANCE_PCT;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "lta",
    disable_help_subcommand = true,
    about = "Distribute LTA units over partial shipments and write the partials configuration"
)]
pub struct Args {
    // --- Mode selection ---
    /// Job JSON bundling LTA totals, partial weights and exception input.
    #[arg(long, conflicts_with_all = ["totals", "weights"])]
    pub job: Option<PathBuf>,

    /// LTA totals JSON path (requires --weights).
    #[arg(long)]
    pub totals: Option<PathBuf>,
    /// Comma-separated partial weights in kg, in flight order (e.g. "500,500").
    #[arg(long)]
    pub weights: Option<String>,

    // --- Exception case ---
    /// Positions of the airport-cleared partial, as read from its clearance document.
    #[arg(long)]
    pub smallest_positions: Option<u32>,
    /// Airport clearance reference stored with the exception metadata.
    #[arg(long)]
    pub airport: Option<String>,

    // --- Reconciliation / commit ---
    /// Allowed drift between requested weights and the LTA weight, in percent.
    #[arg(long, default_value_t = DEFAULT_WEIGHT_TOLERANCE_PCT, value_parser = parse_tolerance)]
    pub tolerance_pct: f64,
    /// Commit even though requested weights drift beyond the tolerance.
    #[arg(long)]
    pub accept_weight_mismatch: bool,
    /// Commit proportionally estimated positions for the airport-cleared partial.
    #[arg(long)]
    pub confirm_provisional: bool,

    // --- Output ---
    /// Output directory for partials_config.json.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Load, allocate and reconcile; print the review and write nothing.
    #[arg(long)]
    pub validate_only: bool,
    /// Allow placeholder (0) partial rows; preview only, never written.
    #[arg(long)]
    pub draft: bool,

    /// Suppress the review table and lower logging to warnings.
    #[arg(long)]
    pub quiet: bool,
}

/// Errors surfaced by argument validation.
#[derive(Debug)]
pub enum CliError {
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Non-negative, finite percentage.
pub fn parse_tolerance(s: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|_| format!("not a number: {s:?}"))?;
    if !v.is_finite() || v < 0.0 {
        return Err("tolerance must be a finite percentage >= 0".into());
    }
    Ok(v)
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

pub fn validate(mut args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }

    if let Some(job) = &args.job {
        ensure_local_exists(job, "--job")?;
        args.job = Some(normalize_path(job));
    } else {
        let totals = args.totals.as_ref().ok_or(CliError::Missing("--job or --totals"))?;
        if args.weights.is_none() {
            return Err(CliError::Missing("--weights"));
        }
        ensure_local_exists(totals, "--totals")?;
        args.totals = Some(normalize_path(totals));
    }

    args.out = normalize_path(&args.out);
    Ok(args)
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [args.job.as_deref(), args.totals.as_deref(), Some(args.out.as_path())]
        .into_iter()
        .flatten()
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Absolute path; falls back to CWD-relative when the path does not exist yet.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
