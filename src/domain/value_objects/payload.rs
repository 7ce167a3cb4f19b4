use super::table::{ColumnKind, TableSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed record payload. Always a JSON object; field types are checked
/// against the owning table's schema before the payload enters the store.
/// Raw JSON text only exists at the SQLite and remote-adapter edges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordPayload(Value);

impl RecordPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        if !value.is_object() {
            return Err("Record payload must be a JSON object".to_string());
        }
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(name))
    }

    /// Checks the payload against a static table schema: required columns
    /// must be present and non-null, known columns must match their declared
    /// kind. Unknown fields are rejected so schema drift shows up at the
    /// write site rather than on a remote constraint violation.
    pub fn validate_against(&self, schema: &TableSchema) -> Result<(), String> {
        let map = self
            .0
            .as_object()
            .expect("payload is an object by construction");

        for column in schema.columns {
            match map.get(column.name) {
                Some(Value::Null) | None if column.required => {
                    return Err(format!("Missing required field: {}", column.name));
                }
                Some(value) if !value.is_null() && !kind_matches(column.kind, value) => {
                    return Err(format!(
                        "Field {} has wrong type (expected {:?})",
                        column.name, column.kind
                    ));
                }
                _ => {}
            }
        }

        for field in map.keys() {
            if schema.column(field).is_none() {
                return Err(format!("Unknown field: {field}"));
            }
        }

        Ok(())
    }
}

fn kind_matches(kind: ColumnKind, value: &Value) -> bool {
    match kind {
        ColumnKind::Text => value.is_string(),
        ColumnKind::Integer => value.is_i64() || value.is_u64(),
        ColumnKind::Real => value.is_number(),
        ColumnKind::Boolean => value.is_boolean(),
        ColumnKind::Json => value.is_object() || value.is_array(),
    }
}

impl From<RecordPayload> for Value {
    fn from(payload: RecordPayload) -> Self {
        payload.0
    }
}
