//! Loader: read local JSON inputs (LTA totals, partial request, or a job file
//! bundling both), validate against the embedded schemas, and return core
//! types. No network I/O.
//!
//! The spreadsheet export that feeds these files is owned by an external
//! collaborator; this crate only sees its JSON form.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use lta_core::{ExceptionInput, PartialRequest, ShipmentTotals};

use crate::schema::{self, SchemaKind};
use crate::IoError;

/// Input files are small (a handful of units); anything larger is a mistake.
pub const MAX_INPUT_BYTES: u64 = 1024 * 1024;

/// Declared totals may drift from unit sums by this much before we warn (kg).
const DRIFT_WARN_KG: f64 = 0.5;

/// Totals + request (+ exception input) in one file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub lta: ShipmentTotals,
    pub partials: Vec<f64>,
    #[serde(default)]
    pub exception: ExceptionInput,
}

impl Job {
    pub fn request(&self) -> PartialRequest {
        PartialRequest::new(self.partials.clone())
    }
}

pub fn load_totals(path: &Path) -> Result<ShipmentTotals, IoError> {
    let v = read_json_value_with_limits(path)?;
    schema::validate_value(SchemaKind::ShipmentTotals, &v)?;
    let totals: ShipmentTotals = serde_json::from_value(v)?;
    note_drift(&totals);
    Ok(totals)
}

pub fn load_request(path: &Path) -> Result<PartialRequest, IoError> {
    let v = read_json_value_with_limits(path)?;
    schema::validate_value(SchemaKind::PartialRequest, &v)?;
    Ok(serde_json::from_value(v)?)
}

pub fn load_job(path: &Path) -> Result<Job, IoError> {
    let v = read_json_value_with_limits(path)?;
    schema::validate_value(SchemaKind::Job, &v)?;
    let job: Job = serde_json::from_value(v)?;
    note_drift(&job.lta);
    Ok(job)
}

/// Parse `s` as a comma-separated weight list (`"500, 500"`).
pub fn parse_weights(s: &str) -> Result<PartialRequest, IoError> {
    let weights = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| IoError::Invalid(format!("not a weight: {t:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PartialRequest::new(weights))
}

fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let meta = fs::metadata(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    if meta.len() > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!(
            "{} is {} bytes (max {MAX_INPUT_BYTES})",
            path.display(),
            meta.len()
        )));
    }
    let text = fs::read_to_string(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), bytes = text.len(), "read input");
    Ok(serde_json::from_str(&text)?)
}

fn note_drift(totals: &ShipmentTotals) {
    let drift = totals.drift();
    if !drift.is_exact(DRIFT_WARN_KG) {
        warn!(
            weight_drift = drift.weight,
            position_drift = drift.positions,
            "declared LTA totals differ from the sum of their units"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        let mut f = fs::File::create(&p).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        p
    }

    #[test]
    fn loads_job_with_exception_input() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(
            &dir,
            "job.json",
            r#"{
                "lta": {"total_weight": 1000, "total_positions": 100,
                        "units": [{"number": 1, "weight": 600, "positions": 60},
                                  {"number": 2, "weight": 400, "positions": 40}]},
                "partials": [50, 950],
                "exception": {"smallest_partial_positions": 5, "airport_reference": "VCP-88"}
            }"#,
        );
        let job = load_job(&p).unwrap();
        assert_eq!(job.lta.units.len(), 2);
        assert_eq!(job.request().weights, vec![50.0, 950.0]);
        assert_eq!(job.exception.smallest_partial_positions, Some(5));
    }

    #[test]
    fn exception_block_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(
            &dir,
            "job.json",
            r#"{"lta": {"total_weight": 10, "total_positions": 1,
                        "units": [{"number": 1, "weight": 10, "positions": 1}]},
                "partials": [5, 5]}"#,
        );
        assert_eq!(load_job(&p).unwrap().exception, ExceptionInput::default());
    }

    #[test]
    fn schema_violation_is_reported_before_deserialization() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(&dir, "totals.json", r#"{"total_weight": 0, "total_positions": 1, "units": []}"#);
        assert!(matches!(load_totals(&p), Err(IoError::Schema { .. })));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(&dir, "req.json", r#"{"weights": [1, 2"#);
        assert!(matches!(load_request(&p), Err(IoError::Json { .. })));
    }

    #[test]
    fn oversized_input_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let big = format!("{{\"weights\": [1, 2], \"pad\": \"{}\"}}", "x".repeat(MAX_INPUT_BYTES as usize));
        let p = write_tmp(&dir, "big.json", &big);
        assert!(matches!(load_request(&p), Err(IoError::Limit(_))));
    }

    #[test]
    fn parses_weight_lists() {
        assert_eq!(parse_weights("500, 500").unwrap().weights, vec![500.0, 500.0]);
        assert_eq!(parse_weights("300,300,400,").unwrap().len(), 3);
        assert!(parse_weights("300,abc").is_err());
    }
}
