//! Read-response model: rows plus the metadata block that drives
//! identity, default-null population and required-column checks.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RemoteError;

// ============================================================================
// Field metadata
// ============================================================================

/// Declared column type, used to coerce values returned by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Boolean,
    Date,
    #[default]
    #[serde(other)]
    Auto,
}

impl FieldType {
    /// Coerce `value` to this type. Null and empty strings become null;
    /// values that cannot be coerced are returned unchanged.
    pub fn convert(self, value: &Value) -> Value {
        if value.is_null() || value.as_str().is_some_and(str::is_empty) {
            return Value::Null;
        }
        match self {
            Self::Int => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => value.clone(),
                Value::Number(n) => n
                    .as_f64()
                    .map(|f| Value::from(f.trunc() as i64))
                    .unwrap_or_else(|| value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| value.clone()),
                Value::Bool(b) => Value::from(i64::from(*b)),
                _ => value.clone(),
            },
            Self::Float => match value {
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| value.clone()),
                _ => value.clone(),
            },
            Self::Boolean => match value {
                Value::Bool(_) => value.clone(),
                Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
                Value::String(s) => Value::Bool(matches!(
                    s.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes" | "on"
                )),
                _ => value.clone(),
            },
            Self::String => match value {
                Value::Number(_) | Value::Bool(_) => Value::String(value.to_string()),
                _ => value.clone(),
            },
            Self::Date | Self::Auto => value.clone(),
        }
    }
}

/// Lookup target of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupMeta {
    #[serde(alias = "schemaName")]
    pub schema: String,
    #[serde(alias = "queryName")]
    pub table: String,
    #[serde(default)]
    pub display_column: Option<String>,
    #[serde(default)]
    pub key_column: Option<String>,
    #[serde(default)]
    pub container_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub lookup: Option<LookupMeta>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: None,
            field_type: FieldType::Auto,
            required: false,
            lookup: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModelEntry {
    pub data_index: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMetadata {
    /// Name of the identity column.
    pub id: Option<String>,
    pub fields: Vec<FieldMeta>,
    /// Key holding the row array (default `rows`).
    pub root: Option<String>,
    /// Key holding the total row count (default `rowCount`).
    pub total_property: Option<String>,
}

// ============================================================================
// SelectRowsResponse
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectRowsResponse {
    pub meta_data: ResponseMetadata,
    pub rows: Vec<Map<String, Value>>,
    pub column_model: Option<Vec<ColumnModelEntry>>,
    pub row_count: Option<u64>,
}

impl SelectRowsResponse {
    pub fn from_json(json: Value) -> Result<Self, RemoteError> {
        let Value::Object(mut body) = json else {
            return Err(RemoteError::Decode(
                "read response is not a JSON object".to_string(),
            ));
        };

        let meta_data: ResponseMetadata = match body.remove("metaData") {
            Some(meta) => serde_json::from_value(meta)
                .map_err(|e| RemoteError::Decode(format!("metaData: {e}")))?,
            None => ResponseMetadata::default(),
        };

        let root = meta_data.root.as_deref().unwrap_or("rows");
        let rows = match body.remove(root) {
            Some(Value::Array(rows)) => rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(RemoteError::Decode(format!("\"{root}\" is not an array")));
            }
        };

        let column_model = match body.remove("columnModel") {
            Some(Value::Null) | None => None,
            Some(cm) => Some(
                serde_json::from_value(cm)
                    .map_err(|e| RemoteError::Decode(format!("columnModel: {e}")))?,
            ),
        };

        let total = meta_data.total_property.as_deref().unwrap_or("rowCount");
        let row_count = body.get(total).and_then(Value::as_u64);

        Ok(Self {
            meta_data,
            rows,
            column_model,
            row_count,
        })
    }
}
