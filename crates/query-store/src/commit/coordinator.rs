//! Commit coordinator: batch dirty records into one save, reconcile the
//! response, and route failures to listeners and the user notifier.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::cache::{key_string, Record, RecordId};
use crate::error::{RemoteError, Result, StoreError};
use crate::events::{StoreEvent, UpdateOperation};
use crate::params::ParamMap;
use crate::store::Store;
use crate::transport::{HttpRequest, HttpResponse};

use super::batch::{DeleteRowsRequest, PendingRow, SaveRowsRequest, SaveRowsResponse, SavedRow};

const SAVE_ALERT_TITLE: &str = "Error During Save";
const SAVE_ALERT_PREFIX: &str = "Could not save changes due to the following error:";
const DELETE_ALERT_TITLE: &str = "Error During Delete";
const DELETE_ALERT_PREFIX: &str = "Could not delete records due to the following error:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No record was dirty, ready and idle; nothing was sent.
    NothingToCommit,
    /// A `BeforeCommit` listener vetoed the batch.
    Cancelled,
    /// The server accepted the batch. Lists the records reconciled.
    Committed { records: Vec<RecordId> },
    /// The save failed; `CommitException` has fired.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NothingToDelete,
    /// The server confirmed the delete and the store reloaded.
    Deleted { records: Vec<RecordId> },
    Failed { message: String },
}

impl Store {
    /// Send every dirty record in one save request.
    ///
    /// Records already in flight, or missing a required value (unless
    /// `noValidationCheck` is set), are left out. `Err` is only returned
    /// for misuse; server and network failures come back as
    /// [`CommitOutcome::Failed`].
    #[instrument(skip(self), fields(schema = %self.config.schema_name, query = %self.config.query_label()))]
    pub async fn commit_changes(&self) -> Result<CommitOutcome> {
        self.ensure_updatable()?;

        let rows = self.prepare_batch()?;
        if rows.is_empty() {
            debug!("nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }
        let batch: Vec<RecordId> = rows.iter().map(|row| row.record).collect();

        let flow = self.events.dispatch(&StoreEvent::BeforeCommit {
            records: batch.clone(),
            rows: rows.clone(),
        });
        if flow.is_cancel() {
            debug!("commit canceled by listener");
            self.end_save(&batch);
            return Ok(CommitOutcome::Cancelled);
        }

        let request = SaveRowsRequest {
            schema_name: self.config.schema_name.clone(),
            query_name: self.config.query_label(),
            container_path: self.config.container_path.clone(),
            rows,
        };
        debug!(rows = batch.len(), "sending save batch");

        let saved = match self.post("saveRows.api", &request).await {
            Ok(response) => decode_save_response(&response),
            Err(err) => Err(err),
        };

        match saved {
            Ok(saved) => {
                let records = self.reconcile(saved, &batch);
                self.events.dispatch(&StoreEvent::CommitComplete {
                    records: records.clone(),
                });
                Ok(CommitOutcome::Committed { records })
            }
            Err(err) => {
                self.end_save(&batch);
                let message = self.report_failure(&err, SAVE_ALERT_TITLE, SAVE_ALERT_PREFIX);
                Ok(CommitOutcome::Failed { message })
            }
        }
    }

    /// Delete records on the server, then reload. The cache is never
    /// edited locally.
    #[instrument(skip(self), fields(schema = %self.config.schema_name, query = %self.config.query_label()))]
    pub async fn delete_records(&self, ids: &[RecordId]) -> Result<DeleteOutcome> {
        self.ensure_updatable()?;
        if ids.is_empty() {
            return Ok(DeleteOutcome::NothingToDelete);
        }

        let rows = {
            let cache = self.cache.lock();
            let id_name = cache.id_name().ok_or(StoreError::IdentityUnknown)?;
            ids.iter()
                .map(|id| {
                    let record = cache.get(*id).ok_or(StoreError::UnknownRecord(*id))?;
                    let mut key = Map::new();
                    key.insert(id_name.to_string(), record.key().clone());
                    Ok(key)
                })
                .collect::<Result<Vec<_>>>()?
        };

        let request = DeleteRowsRequest {
            schema_name: self.config.schema_name.clone(),
            query_name: self.config.query_label(),
            container_path: self.config.container_path.clone(),
            rows,
        };
        debug!(rows = ids.len(), "sending delete");

        match self.post("deleteRows.api", &request).await {
            Ok(_) => {
                self.events.dispatch(&StoreEvent::CommitComplete {
                    records: ids.to_vec(),
                });
                self.reload().await;
                Ok(DeleteOutcome::Deleted {
                    records: ids.to_vec(),
                })
            }
            Err(err) => {
                let message = self.report_failure(&err, DELETE_ALERT_TITLE, DELETE_ALERT_PREFIX);
                Ok(DeleteOutcome::Failed { message })
            }
        }
    }

    // =======================================================================
    // Internals
    // =======================================================================

    /// Collect the batch and mark its records in flight, under one lock.
    fn prepare_batch(&self) -> Result<Vec<PendingRow>> {
        let mut cache = self.cache.lock();
        let modified = cache.modified();
        if modified.is_empty() {
            return Ok(Vec::new());
        }
        let id_name = cache
            .id_name()
            .ok_or(StoreError::IdentityUnknown)?
            .to_string();

        let mut rows = Vec::with_capacity(modified.len());
        for id in modified {
            let Some(record) = cache.get(id) else {
                continue;
            };
            if record.is_save_operation_in_progress() {
                debug!(record = %id, "already in flight; skipped");
                continue;
            }
            if !self.config.no_validation_check && !cache.ready_for_save(record) {
                debug!(record = %id, "required value missing; left out of the batch");
                continue;
            }
            rows.push(PendingRow::from_record(record, &id_name));
        }

        for row in &rows {
            if let Some(record) = cache.get_mut(row.record) {
                record.begin_save();
            }
        }
        Ok(rows)
    }

    /// Apply saved rows to the records of `batch`. Batched records the
    /// response does not mention stay dirty.
    fn reconcile(&self, saved: Vec<SavedRow>, batch: &[RecordId]) -> Vec<RecordId> {
        let mut committed = Vec::with_capacity(saved.len());
        {
            let mut cache = self.cache.lock();
            let id_name = cache.id_name().map(str::to_string).unwrap_or_default();

            for row in saved {
                let Some(old_key) = row.old_keys.get(&id_name).and_then(key_string) else {
                    warn!("saved row has no old key; skipped");
                    continue;
                };
                let Some(values) = row.values else {
                    warn!(key = %old_key, "saved row has no values; skipped");
                    continue;
                };
                let Some(id) = cache
                    .get_by_key(&old_key)
                    .map(Record::id)
                    .filter(|id| batch.contains(id))
                else {
                    warn!(key = %old_key, "saved row matches no record of this batch; skipped");
                    continue;
                };
                if committed.contains(&id) {
                    warn!(key = %old_key, "saved row repeats a reconciled record; skipped");
                    continue;
                }

                let values: Vec<(String, Value)> = values
                    .into_iter()
                    .map(|(field, value)| {
                        let field_type = cache
                            .find_field(&field)
                            .map(|meta| meta.field_type)
                            .unwrap_or_default();
                        let value = field_type.convert(&value);
                        (field, value)
                    })
                    .collect();
                let new_key = values
                    .iter()
                    .find(|(field, _)| *field == id_name)
                    .map(|(_, value)| value.clone())
                    .filter(|key| key_string(key).is_some());

                if let Some(record) = cache.get_mut(id) {
                    for (field, value) in values {
                        record.apply_server_value(&field, value);
                    }
                    record.commit();
                }
                if let Some(new_key) = new_key {
                    if key_string(&new_key).as_deref() != Some(old_key.as_str()) {
                        debug!(old = %old_key, new = %new_key, "identity reassigned");
                    }
                    cache.rekey(id, new_key);
                }
                committed.push(id);
            }

            for id in batch {
                if !committed.contains(id) {
                    if let Some(record) = cache.get_mut(*id) {
                        record.end_save();
                    }
                }
            }
        }

        for id in &committed {
            self.events.dispatch(&StoreEvent::Update {
                record: *id,
                operation: UpdateOperation::Commit,
            });
        }
        committed
    }

    fn end_save(&self, batch: &[RecordId]) {
        let mut cache = self.cache.lock();
        for id in batch {
            if let Some(record) = cache.get_mut(*id) {
                record.end_save();
            }
        }
    }

    /// Fire `CommitException`; alert the user unless a listener canceled.
    fn report_failure(&self, err: &RemoteError, title: &str, prefix: &str) -> String {
        let message = err.user_message();
        warn!(status = ?err.status(), error = %message, "{}", title);

        let flow = self.events.dispatch(&StoreEvent::CommitException {
            message: message.clone(),
            status: err.status(),
        });
        if !flow.is_cancel() {
            self.notifier.alert(title, &format!("{prefix}\n{message}"));
        }
        message
    }

    async fn post(&self, action: &str, body: &impl Serialize) -> Result<HttpResponse, RemoteError> {
        let body = serde_json::to_value(body)
            .map_err(|e| RemoteError::Decode(format!("request body: {e}")))?;
        let url = self.urls.build(
            "query",
            action,
            self.config.container_path.as_deref(),
            &ParamMap::new(),
        )?;
        debug!(%url, "dispatching write");

        let response = self.transport.send(HttpRequest::post_json(url, body)).await?;
        if !response.is_success() {
            return Err(RemoteError::Request(response.into_failure()));
        }
        Ok(response)
    }
}

fn decode_save_response(response: &HttpResponse) -> Result<Vec<SavedRow>, RemoteError> {
    let json = response
        .decode_json()
        .ok_or_else(|| RemoteError::Decode("save response is not JSON".to_string()))?;
    SaveRowsResponse::from_json(json)
        .map(SaveRowsResponse::into_rows)
        .map_err(|e| RemoteError::Decode(format!("save response: {e}")))
}
