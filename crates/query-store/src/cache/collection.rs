//! RecordCache — the ordered working set of records.
//!
//! Records live in an `IndexMap` keyed by identity string, so insertion order
//! and key lookup share one structure. A side index maps each [`RecordId`]
//! to its current key. Every key change goes through [`RecordCache::rekey`],
//! which moves the entry without changing its slot.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::NullRecordConfig;
use crate::error::LoadError;
use crate::proxy::{ColumnModelEntry, FieldMeta, SelectRowsResponse};

use super::record::{key_string, unwrap_extended_row, Record, RecordId};

#[derive(Debug, Default)]
pub struct RecordCache {
    records: IndexMap<String, Record>,
    keys: HashMap<RecordId, String>,
    next_id: u64,
    next_placeholder: u64,
    id_name: Option<String>,
    fields: Vec<FieldMeta>,
    column_model: Option<Vec<ColumnModelEntry>>,
    total_count: Option<u64>,
    load_error: Option<LoadError>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Replace the working set with a read response. Returns the new
    /// records in order.
    pub fn load(&mut self, response: SelectRowsResponse) -> Vec<RecordId> {
        self.records.clear();
        self.keys.clear();
        self.id_name = response.meta_data.id;
        self.fields = response.meta_data.fields;
        self.column_model = response.column_model;
        self.total_count = response.row_count;
        self.load_error = None;

        let mut ids = Vec::with_capacity(response.rows.len());
        for row in response.rows {
            let (data, extended) = unwrap_extended_row(row);
            let key = self
                .id_name
                .as_ref()
                .and_then(|name| data.get(name))
                .filter(|v| key_string(v).is_some())
                .cloned();
            let key = match key {
                Some(key) => key,
                None => self.placeholder_key(),
            };
            let id = self.allocate_id();
            let record = Record::new(id, key, data, false).with_extended(extended);
            self.insert_at(self.records.len(), record);
            ids.push(id);
        }
        ids
    }

    /// Prepend the synthetic blank row used by lookup combos.
    pub fn insert_null_record(&mut self, config: &NullRecordConfig, caption: &str) -> RecordId {
        let mut data = Map::new();
        if let Some(id_name) = &self.id_name {
            data.insert(id_name.clone(), Value::String(String::new()));
        }
        data.insert(
            config.display_column.clone(),
            Value::String(caption.to_string()),
        );
        self.fill_declared_fields(&mut data);

        let id = self.allocate_id();
        let record = Record::new(id, Value::String(String::new()), data, false);
        self.insert_at(0, record);
        id
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Create a new record from partial data. Every declared field missing
    /// from `data` is set to null. Returns the record and its final index.
    pub fn add(&mut self, data: Option<Map<String, Value>>, index: Option<usize>) -> (RecordId, usize) {
        let mut data = data.unwrap_or_default();
        self.fill_declared_fields(&mut data);

        let id = self.allocate_id();
        let key = self.placeholder_key();
        let index = index.unwrap_or(self.records.len()).min(self.records.len());
        let index = self.insert_at(index, Record::new(id, key, data, true));
        (id, index)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        let key = self.keys.get(&id)?;
        self.records.get_mut(key)
    }

    /// Move `id` to `new_key`, keeping its position. A stale entry already
    /// holding `new_key` is evicted.
    pub fn rekey(&mut self, id: RecordId, new_key: Value) -> bool {
        let Some(new_str) = key_string(&new_key) else {
            return false;
        };
        let Some(old_key) = self.keys.get(&id).cloned() else {
            return false;
        };

        if old_key == new_str {
            if let Some(record) = self.records.get_mut(&old_key) {
                record.set_key(new_key);
            }
            return true;
        }
        let Some(mut index) = self.records.get_index_of(&old_key) else {
            return false;
        };

        if let Some(stale) = self.records.get_index_of(&new_str) {
            warn!(key = %new_str, "evicting stale record that held the reassigned key");
            if let Some((_, evicted)) = self.records.shift_remove_index(stale) {
                self.keys.remove(&evicted.id());
            }
            if stale < index {
                index -= 1;
            }
        }

        let Some((_, mut record)) = self.records.shift_remove_index(index) else {
            return false;
        };
        record.set_key(new_key);
        self.records.shift_insert(index, new_str.clone(), record);
        self.keys.insert(id, new_str);
        true
    }

    /// Roll back local edits on every record. Returns the records touched.
    pub fn reject_all(&mut self) -> Vec<RecordId> {
        self.records
            .values_mut()
            .filter_map(|r| r.reject().then(|| r.id()))
            .collect()
    }

    pub fn set_load_error(&mut self, error: LoadError) {
        self.load_error = Some(error);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(self.keys.get(&id)?)
    }

    /// Identity lookup.
    pub fn get_by_key(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn index_of(&self, id: RecordId) -> Option<usize> {
        self.records.get_index_of(self.keys.get(&id)?)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records changed since the last sync, plus new records, in cache order.
    pub fn modified(&self) -> Vec<RecordId> {
        self.records
            .values()
            .filter(|r| r.is_dirty())
            .map(Record::id)
            .collect()
    }

    /// Every column the column model marks required, except the identity
    /// column, must hold a non-empty value.
    pub fn ready_for_save(&self, record: &Record) -> bool {
        let Some(column_model) = &self.column_model else {
            return true;
        };
        column_model.iter().all(|col| {
            !col.required
                || self.id_name.as_deref() == Some(col.data_index.as_str())
                || has_value(record.get(&col.data_index))
        })
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn id_name(&self) -> Option<&str> {
        self.id_name.as_deref()
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn column_model(&self) -> Option<&[ColumnModelEntry]> {
        self.column_model.as_deref()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }

    fn placeholder_key(&mut self) -> Value {
        self.next_placeholder += 1;
        Value::String(format!("new-record-{}", self.next_placeholder))
    }

    fn fill_declared_fields(&self, data: &mut Map<String, Value>) {
        for field in &self.fields {
            data.entry(field.name.clone()).or_insert(Value::Null);
        }
    }

    /// Insert keeping keys unique; a clashing row gets a placeholder key.
    fn insert_at(&mut self, index: usize, mut record: Record) -> usize {
        let mut key = record.key_string();
        if self.records.contains_key(&key) {
            warn!(key = %key, "duplicate identity value; using a placeholder key");
            let placeholder = self.placeholder_key();
            key = key_string(&placeholder).unwrap_or_default();
            record.set_key(placeholder);
        }
        let index = index.min(self.records.len());
        self.keys.insert(record.id(), key.clone());
        self.records.shift_insert(index, key, record);
        index
    }
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
