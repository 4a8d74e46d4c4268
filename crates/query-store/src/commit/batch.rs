//! Wire model for the save and delete endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::{Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCommand {
    Insert,
    Update,
}

/// One entry of the pending write batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRow {
    pub command: RowCommand,
    pub values: Map<String, Value>,
    pub old_keys: Map<String, Value>,
    /// The cached record this row was built from.
    #[serde(skip)]
    pub record: RecordId,
}

impl PendingRow {
    pub(crate) fn from_record(record: &Record, id_name: &str) -> Self {
        let mut old_keys = Map::new();
        old_keys.insert(id_name.to_string(), record.key().clone());
        Self {
            command: if record.is_new() {
                RowCommand::Insert
            } else {
                RowCommand::Update
            },
            values: normalize_values(record.data()),
            old_keys,
            record: record.id(),
        }
    }
}

/// Empty strings go out as null; everything else passes through.
pub fn normalize_values(data: &Map<String, Value>) -> Map<String, Value> {
    data.iter()
        .map(|(field, value)| {
            let value = match value {
                Value::String(s) if s.is_empty() => Value::Null,
                other => other.clone(),
            };
            (field.clone(), value)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRowsRequest {
    pub schema_name: String,
    pub query_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_path: Option<String>,
    pub rows: Vec<PendingRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRowsRequest {
    pub schema_name: String,
    pub query_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_path: Option<String>,
    pub rows: Vec<Map<String, Value>>,
}

// ============================================================================
// Response
// ============================================================================

/// A reconciled row: identity before the save, server values after it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRow {
    #[serde(default)]
    pub old_keys: Map<String, Value>,
    #[serde(default)]
    pub values: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CommandResult {
    #[serde(default)]
    rows: Vec<SavedRow>,
}

/// Accepts `{"rows": [...]}` and the older `{"result": [{"rows": [...]}]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRowsResponse {
    #[serde(default)]
    rows: Vec<SavedRow>,
    #[serde(default)]
    result: Vec<CommandResult>,
}

impl SaveRowsResponse {
    pub fn from_json(json: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }

    pub fn into_rows(self) -> Vec<SavedRow> {
        let mut rows = self.rows;
        rows.extend(self.result.into_iter().flat_map(|r| r.rows));
        rows
    }
}
