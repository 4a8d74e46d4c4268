//! A single cached row with its edit-tracking state.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

/// Stable handle for a cached record. Unlike the identity key, it never
/// changes for the lifetime of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record-{}", self.0)
    }
}

/// Per-cell extras from the extended (9.1) response format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedValue {
    pub display_value: Option<Value>,
    pub mv_value: Option<Value>,
    pub url: Option<String>,
}

impl ExtendedValue {
    fn is_empty(&self) -> bool {
        self.display_value.is_none() && self.mv_value.is_none() && self.url.is_none()
    }
}

/// Write lifecycle of a record.
///
/// `Clean → Dirty` on a local edit, `Dirty → InFlight` when batched,
/// `InFlight → Clean` on success or back to `Dirty` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Clean,
    Dirty,
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    /// Identity value. Provisional while `is_new`.
    key: Value,
    data: Map<String, Value>,
    /// Last-synchronized value of every locally changed field.
    modified: Map<String, Value>,
    extended: HashMap<String, ExtendedValue>,
    /// What the server holds once the in-flight save lands: the values
    /// sent, updated with any server values for unedited fields.
    in_flight: Option<Map<String, Value>>,
    is_new: bool,
    save_operation_in_progress: bool,
}

impl Record {
    pub(crate) fn new(id: RecordId, key: Value, data: Map<String, Value>, is_new: bool) -> Self {
        Self {
            id,
            key,
            data,
            modified: Map::new(),
            extended: HashMap::new(),
            in_flight: None,
            is_new,
            save_operation_in_progress: false,
        }
    }

    pub(crate) fn with_extended(mut self, extended: HashMap<String, ExtendedValue>) -> Self {
        self.extended = extended;
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    /// The identity value as a lookup string.
    pub fn key_string(&self) -> String {
        key_string(&self.key).unwrap_or_default()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn extended(&self, field: &str) -> Option<&ExtendedValue> {
        self.extended.get(field)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_save_operation_in_progress(&self) -> bool {
        self.save_operation_in_progress
    }

    /// Changed since the last load/commit, or never committed.
    pub fn is_dirty(&self) -> bool {
        self.is_new || !self.modified.is_empty()
    }

    pub fn modified_fields(&self) -> impl Iterator<Item = &str> {
        self.modified.keys().map(String::as_str)
    }

    pub fn write_state(&self) -> WriteState {
        if self.save_operation_in_progress {
            WriteState::InFlight
        } else if self.is_dirty() {
            WriteState::Dirty
        } else {
            WriteState::Clean
        }
    }

    /// Local edit. Returns `false` when the value is unchanged. Setting a
    /// field back to its synchronized value makes it clean again.
    pub(crate) fn set(&mut self, field: &str, value: Value) -> bool {
        let current = self.data.get(field).cloned().unwrap_or(Value::Null);
        if current == value {
            return false;
        }
        match self.modified.get(field).cloned() {
            Some(original) if original == value => {
                self.modified.remove(field);
            }
            Some(_) => {}
            None => {
                self.modified.insert(field.to_string(), current);
            }
        }
        self.data.insert(field.to_string(), value);
        self.clear_display(field);
        true
    }

    /// Server-authoritative value; not tracked as a modification. A field
    /// edited while its save was in flight keeps the local edit.
    pub(crate) fn apply_server_value(&mut self, field: &str, value: Value) {
        if let Some(sent) = self.in_flight.as_mut() {
            let edited = sent.get(field) != self.data.get(field);
            sent.insert(field.to_string(), value.clone());
            if edited {
                return;
            }
        }
        self.data.insert(field.to_string(), value);
        self.clear_display(field);
    }

    fn clear_display(&mut self, field: &str) {
        if let Some(ext) = self.extended.get_mut(field) {
            ext.display_value = None;
            ext.mv_value = None;
            if ext.is_empty() {
                self.extended.remove(field);
            }
        }
    }

    pub(crate) fn set_key(&mut self, key: Value) {
        self.key = key;
    }

    /// Mark in flight and remember the values being sent.
    pub(crate) fn begin_save(&mut self) {
        self.save_operation_in_progress = true;
        self.in_flight = Some(self.data.clone());
    }

    pub(crate) fn end_save(&mut self) {
        self.save_operation_in_progress = false;
        self.in_flight = None;
    }

    /// Accept the saved values as the synchronized snapshot. Fields that
    /// differ from what was sent stay modified against the saved value.
    pub(crate) fn commit(&mut self) {
        match self.in_flight.take() {
            Some(saved) => {
                let mut still_modified = Map::new();
                for (field, value) in &self.data {
                    let synced = saved.get(field).cloned().unwrap_or(Value::Null);
                    if *value != synced {
                        still_modified.insert(field.clone(), synced);
                    }
                }
                self.modified = still_modified;
            }
            None => self.modified.clear(),
        }
        self.is_new = false;
        self.save_operation_in_progress = false;
    }

    /// Restore every modified field. Returns whether anything changed.
    pub(crate) fn reject(&mut self) -> bool {
        if self.modified.is_empty() {
            return false;
        }
        for (field, original) in std::mem::take(&mut self.modified) {
            self.data.insert(field, original);
        }
        true
    }
}

/// Lookup string for an identity value; `None` for null and structured values.
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split an extended-format row into plain values and per-cell extras.
/// Cells of shape `{"value": .., "displayValue": .., "mvValue": .., "url": ..}`
/// collapse to their `value`; anything else passes through.
pub(crate) fn unwrap_extended_row(
    row: Map<String, Value>,
) -> (Map<String, Value>, HashMap<String, ExtendedValue>) {
    let mut data = Map::with_capacity(row.len());
    let mut extended = HashMap::new();
    for (field, cell) in row {
        match cell {
            Value::Object(mut obj) if obj.contains_key("value") => {
                let value = obj.remove("value").unwrap_or(Value::Null);
                let ext = ExtendedValue {
                    display_value: obj.remove("displayValue"),
                    mv_value: obj.remove("mvValue"),
                    url: obj
                        .remove("url")
                        .and_then(|u| u.as_str().map(str::to_string)),
                };
                if !ext.is_empty() {
                    extended.insert(field.clone(), ext);
                }
                data.insert(field, value);
            }
            other => {
                data.insert(field, other);
            }
        }
    }
    (data, extended)
}
