use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{ConvertError, Result};

static TRI_SCHEMA: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/tri.v1.json")));
static VIOLATIONS_SCHEMA: Lazy<Value> =
    Lazy::new(|| embedded(include_str!("../../schemas/violations.v1.json")));
static SUPERFUND_SCHEMA: Lazy<Value> =
    Lazy::new(|| embedded(include_str!("../../schemas/superfund.v1.json")));

fn embedded(text: &str) -> Value {
    serde_json::from_str(text).expect("embedded schema is valid JSON")
}

/// Shape contract of each dataset the page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSchema {
    Tri,
    Violations,
    Superfund,
}

impl DatasetSchema {
    pub fn name(&self) -> &'static str {
        match self {
            DatasetSchema::Tri => "tri",
            DatasetSchema::Violations => "violations",
            DatasetSchema::Superfund => "superfund",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tri" => Some(DatasetSchema::Tri),
            "violations" => Some(DatasetSchema::Violations),
            "superfund" => Some(DatasetSchema::Superfund),
            _ => None,
        }
    }

    pub fn schema(&self) -> &'static Value {
        match self {
            DatasetSchema::Tri => Lazy::force(&TRI_SCHEMA),
            DatasetSchema::Violations => Lazy::force(&VIOLATIONS_SCHEMA),
            DatasetSchema::Superfund => Lazy::force(&SUPERFUND_SCHEMA),
        }
    }

    pub fn validate(&self, instance: &Value) -> Result<()> {
        validate_against(self.name(), self.schema(), instance)
    }
}

/// Validate `instance` against a schema, collecting every violation into one error.
pub fn validate_against(dataset: &str, schema: &'static Value, instance: &Value) -> Result<()> {
    let compiled = JSONSchema::options()
        .compile(schema)
        .map_err(|e| ConvertError::Schema {
            dataset: dataset.to_string(),
            message: format!("schema does not compile: {e}"),
        })?;

    let result = compiled.validate(instance).map_err(|errors| {
        errors
            .map(|error| format!("{} at {}", error, error.instance_path))
            .collect::<Vec<_>>()
            .join("; ")
    });
    result.map_err(|message| ConvertError::Schema {
        dataset: dataset.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emitted_shapes_are_valid() {
        assert!(DatasetSchema::Tri
            .validate(&json!([{"facility": "Acme", "chemical": "Lead", "release_lbs": 150, "year": 2023}]))
            .is_ok());
        assert!(DatasetSchema::Violations
            .validate(&json!([{"facility": "Plant", "type": "General violation", "count": 3, "penalty": 50000,
                               "lat": null, "lon": null}]))
            .is_ok());
        assert!(DatasetSchema::Superfund
            .validate(&json!({"national_count": 0, "as_of": "2025-11-10", "sites": []}))
            .is_ok());
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(DatasetSchema::Tri.validate(&json!({"records": []})).is_err());
        assert!(DatasetSchema::Violations.validate(&json!([{"count": true}])).is_err());

        let err = DatasetSchema::Superfund
            .validate(&json!({"national_count": "412"}))
            .unwrap_err();
        match err {
            ConvertError::Schema { dataset, message } => {
                assert_eq!(dataset, "superfund");
                assert!(message.contains("national_count"), "message: {message}");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn names_round_trip() {
        for schema in [DatasetSchema::Tri, DatasetSchema::Violations, DatasetSchema::Superfund] {
            assert_eq!(DatasetSchema::from_name(schema.name()), Some(schema));
        }
        assert_eq!(DatasetSchema::from_name("placeholder"), None);
    }
}
