//! Embedded JSON Schemas for input files, checked before deserialization so
//! operators get a pointer to the offending field.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::IoError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaKind {
    ShipmentTotals,
    PartialRequest,
    Job,
}

impl SchemaKind {
    fn source(self) -> &'static str {
        match self {
            SchemaKind::ShipmentTotals => include_str!("../schemas/shipment_totals.schema.json"),
            SchemaKind::PartialRequest => include_str!("../schemas/partial_request.schema.json"),
            SchemaKind::Job => include_str!("../schemas/job.schema.json"),
        }
    }
}

/// Validate `instance` against the schema for `kind`; reports the first violation.
pub fn validate_value(kind: SchemaKind, instance: &Value) -> Result<(), IoError> {
    let schema: Value = serde_json::from_str(kind.source())?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|e| IoError::Schema { pointer: e.schema_path.to_string(), msg: e.to_string() })?;

    if let Err(mut errors) = compiled.validate(instance) {
        if let Some(first) = errors.next() {
            let pointer = match first.instance_path.to_string() {
                p if p.is_empty() => "/".to_string(),
                p => p,
            };
            return Err(IoError::Schema { pointer, msg: first.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_schemas_compile_and_accept_valid_input() {
        let totals = json!({
            "total_weight": 1000.0,
            "total_positions": 100,
            "units": [{"number": 1, "weight": 600.0, "positions": 60}]
        });
        assert!(validate_value(SchemaKind::ShipmentTotals, &totals).is_ok());
        assert!(validate_value(SchemaKind::PartialRequest, &json!({"weights": [1.0, 2.0]})).is_ok());
        assert!(validate_value(
            SchemaKind::Job,
            &json!({"lta": totals, "partials": [500, 500], "exception": {"smallest_partial_positions": null}})
        )
        .is_ok());
    }

    #[test]
    fn points_at_offending_field() {
        let bad = json!({
            "total_weight": 1000.0,
            "total_positions": 100,
            "units": [{"number": 1, "weight": -5.0, "positions": 60}]
        });
        match validate_value(SchemaKind::ShipmentTotals, &bad) {
            Err(IoError::Schema { pointer, .. }) => assert_eq!(pointer, "/units/0/weight"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn single_partial_is_rejected() {
        assert!(validate_value(SchemaKind::PartialRequest, &json!({"weights": [1.0]})).is_err());
    }
}
