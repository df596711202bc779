//! Configuration writer/reader.
//!
//! Persists a committed `Distribution` keyed by partial index so a later,
//! independent automation run can reload exactly which unit fragments belong
//! to which physical partial flight. The record carries two digests:
//! `inputs_sha256` (canonical totals + requested weights) and
//! `partials_sha256` (canonical partials block, verified on read).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use lta_core::{
    Distribution, ExceptionMetadata, PartialAllocation, PartialRequest, ShipmentTotals, UnitPortion,
};

use crate::canonical_json::write_canonical_file;
use crate::hasher::{is_sha256_hex, sha256_canonical};
use crate::IoError;

pub const FORMAT_VERSION: u32 = 1;

/// File name used by the CLI inside `--out`.
pub const CONFIG_FILE_NAME: &str = "partials_config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LtaSummary {
    pub total_weight: f64,
    pub total_positions: u32,
    pub unit_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub target_weight: f64,
    pub positions: u32,
    pub requires_customs_depot_statement: bool,
    pub units: Vec<UnitPortion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub format_version: u32,
    pub lta: LtaSummary,
    pub is_exception_case: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionMetadata>,
    /// Keyed by 1-based partial index.
    pub partials: BTreeMap<u32, PartialRecord>,
    pub inputs_sha256: String,
    pub partials_sha256: String,
}

impl ConfigRecord {
    pub fn from_distribution(
        totals: &ShipmentTotals,
        request: &PartialRequest,
        distribution: &Distribution,
    ) -> Result<Self, IoError> {
        let partials: BTreeMap<u32, PartialRecord> = distribution
            .allocations
            .iter()
            .map(|a| {
                (
                    a.partial_index,
                    PartialRecord {
                        target_weight: a.target_weight,
                        positions: a.computed_positions,
                        requires_customs_depot_statement: a.requires_customs_depot_statement,
                        units: a.portions.clone(),
                    },
                )
            })
            .collect();

        Ok(ConfigRecord {
            format_version: FORMAT_VERSION,
            lta: LtaSummary {
                total_weight: totals.total_weight,
                total_positions: totals.total_positions,
                unit_count: totals.units.len() as u32,
            },
            is_exception_case: distribution.is_exception_case,
            exception: distribution.exception_metadata.clone(),
            inputs_sha256: inputs_digest(totals, request)?,
            partials_sha256: sha256_canonical(&partials)?,
            partials,
        })
    }

    /// Rebuild the `Distribution` for a later automation phase.
    pub fn to_distribution(&self) -> Distribution {
        Distribution {
            allocations: self
                .partials
                .iter()
                .map(|(&partial_index, p)| PartialAllocation {
                    partial_index,
                    target_weight: p.target_weight,
                    computed_positions: p.positions,
                    portions: p.units.clone(),
                    requires_customs_depot_statement: p.requires_customs_depot_statement,
                })
                .collect(),
            is_exception_case: self.is_exception_case,
            exception_metadata: self.exception.clone(),
        }
    }

    /// Whether this record was produced from exactly these inputs.
    pub fn matches_inputs(&self, totals: &ShipmentTotals, request: &PartialRequest) -> Result<bool, IoError> {
        Ok(self.inputs_sha256 == inputs_digest(totals, request)?)
    }

    fn verify(&self) -> Result<(), IoError> {
        if self.format_version != FORMAT_VERSION {
            return Err(IoError::Invalid(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        for (what, digest) in [("inputs", &self.inputs_sha256), ("partials", &self.partials_sha256)] {
            if !is_sha256_hex(digest) {
                return Err(IoError::Invalid(format!("{what}_sha256 is not a lowercase sha-256 hex digest")));
            }
        }
        let found = sha256_canonical(&self.partials)?;
        if found != self.partials_sha256 {
            return Err(IoError::Digest {
                what: "partials",
                expected: self.partials_sha256.clone(),
                found,
            });
        }
        Ok(())
    }
}

pub fn inputs_digest(totals: &ShipmentTotals, request: &PartialRequest) -> Result<String, IoError> {
    sha256_canonical(&json!({ "lta": totals, "partials": request.weights }))
}

pub fn write_config(path: &Path, record: &ConfigRecord) -> Result<(), IoError> {
    write_canonical_file(path, record)?;
    info!(
        path = %path.display(),
        partials = record.partials.len(),
        exception = record.is_exception_case,
        "configuration written"
    );
    Ok(())
}

pub fn read_config(path: &Path) -> Result<ConfigRecord, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let record: ConfigRecord = serde_json::from_str(&text)?;
    record.verify()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use lta_core::{PortionRole, Unit};

    fn sample() -> (ShipmentTotals, PartialRequest, Distribution) {
        let totals = ShipmentTotals::new(1000.0, 100, vec![Unit::new(1, 600.0, 60), Unit::new(2, 400.0, 40)]);
        let request = PartialRequest::new(vec![500.0, 500.0]);
        let distribution = Distribution {
            allocations: vec![
                PartialAllocation {
                    partial_index: 1,
                    target_weight: 500.0,
                    computed_positions: 50,
                    portions: vec![UnitPortion::fragment(1, 1, 500.0, 50, PortionRole::Normal)],
                    requires_customs_depot_statement: true,
                },
                PartialAllocation {
                    partial_index: 2,
                    target_weight: 500.0,
                    computed_positions: 50,
                    portions: vec![
                        UnitPortion::fragment(1, 2, 100.0, 10, PortionRole::SplitContinuation),
                        UnitPortion::whole(2, 400.0, 40, PortionRole::Normal),
                    ],
                    requires_customs_depot_statement: true,
                },
            ],
            is_exception_case: false,
            exception_metadata: None,
        };
        (totals, request, distribution)
    }

    #[test]
    fn record_is_keyed_by_partial_index_with_split_labels() {
        let (t, r, d) = sample();
        let record = ConfigRecord::from_distribution(&t, &r, &d).unwrap();
        let v = serde_json::to_value(&record).unwrap();
        assert_json_include!(
            actual: v,
            expected: json!({
                "partials": {
                    "2": {
                        "positions": 50,
                        "units": [
                            {"unit_number": 1, "split_label": "1/2", "role": "SPLIT_CONTINUATION"},
                            {"unit_number": 2, "role": "NORMAL", "is_split": false}
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn write_then_read_restores_distribution() {
        let (t, r, d) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let record = ConfigRecord::from_distribution(&t, &r, &d).unwrap();
        write_config(&path, &record).unwrap();

        let back = read_config(&path).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.to_distribution(), d);
        assert!(back.matches_inputs(&t, &r).unwrap());
        assert!(!back.matches_inputs(&t, &PartialRequest::new(vec![400.0, 600.0])).unwrap());
    }

    #[test]
    fn edited_partials_fail_digest_check() {
        let (t, r, d) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut record = ConfigRecord::from_distribution(&t, &r, &d).unwrap();
        write_config(&path, &record).unwrap();

        record.partials.get_mut(&1).unwrap().positions = 49;
        std::fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();
        assert!(matches!(read_config(&path), Err(IoError::Digest { what: "partials", .. })));
    }

    #[test]
    fn malformed_digest_is_rejected() {
        let (t, r, d) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut record = ConfigRecord::from_distribution(&t, &r, &d).unwrap();
        record.inputs_sha256 = record.inputs_sha256.to_uppercase();
        std::fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();
        assert!(matches!(read_config(&path), Err(IoError::Invalid(_))));
    }

    #[test]
    fn fractional_weights_survive_reload() {
        for a in 1..200u32 {
            let u1 = 300.0 + f64::from(a) * 0.37;
            let u2 = 200.0 + f64::from(a) * 0.11;
            let total = u1 + u2;
            let first = total * 0.45;
            let second = total - first;
            let t = ShipmentTotals::new(total, 100, vec![Unit::new(1, u1, 60), Unit::new(2, u2, 40)]);
            let r = PartialRequest::new(vec![first, second]);
            let d = Distribution {
                allocations: vec![
                    PartialAllocation {
                        partial_index: 1,
                        target_weight: first,
                        computed_positions: 45,
                        portions: vec![UnitPortion::fragment(1, 1, first, 45, PortionRole::Normal)],
                        requires_customs_depot_statement: true,
                    },
                    PartialAllocation {
                        partial_index: 2,
                        target_weight: second,
                        computed_positions: 55,
                        portions: vec![
                            UnitPortion::fragment(1, 2, u1 - first, 15, PortionRole::SplitContinuation),
                            UnitPortion::whole(2, u2, 40, PortionRole::Normal),
                        ],
                        requires_customs_depot_statement: true,
                    },
                ],
                is_exception_case: false,
                exception_metadata: None,
            };

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(CONFIG_FILE_NAME);
            let record = ConfigRecord::from_distribution(&t, &r, &d).unwrap();
            write_config(&path, &record).unwrap();

            let back = read_config(&path).unwrap_or_else(|e| panic!("a={a}: {e}"));
            assert_eq!(back.to_distribution(), d, "a={a}");
            assert!(back.matches_inputs(&t, &r).unwrap());
        }
    }
}
