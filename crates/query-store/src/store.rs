//! Store — the public face of the crate.
//!
//! Composes the remote proxy, the record cache, the event emitter and the
//! lookup-store memo. Every method takes `&self`; state lives behind
//! `parking_lot::Mutex` and no guard is held across an `.await`, so a
//! `Store` can sit in an `Arc` shared between tasks.
//!
//! Network failures never come back as `Err`: reads record a
//! [`LoadError`] and emit [`StoreEvent::LoadException`]; writes emit
//! [`StoreEvent::CommitException`] (see [`crate::commit`]).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::cache::{Record, RecordCache, RecordId};
use crate::config::{ConnectionConfig, NullRecordConfig, StoreConfig, DEFAULT_NULL_CAPTION};
use crate::error::{LoadError, RemoteError, Result, StoreError};
use crate::events::{EventEmitter, StoreEvent, UpdateOperation};
use crate::filter::{append_filter_params, QueryFilter};
use crate::notify::{LogNotifier, UserNotifier};
use crate::params::{set_param, ParamMap};
use crate::proxy::{ColumnModelEntry, FieldMeta, LoadOptions, RemoteProxy};
use crate::transport::{ActionUrlBuilder, ReqwestTransport, Transport};

/// Download format for [`Store::export_url`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Excel,
    Tsv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Tsv => "tsv",
        }
    }
}

pub struct Store {
    pub(crate) config: StoreConfig,
    proxy: RemoteProxy,
    pub(crate) cache: Mutex<RecordCache>,
    pub(crate) events: EventEmitter<StoreEvent>,
    lookup_stores: Mutex<HashMap<String, Arc<Store>>>,
    user_filters: Mutex<Vec<QueryFilter>>,
    last_options: Mutex<LoadOptions>,
    loading: AtomicBool,
    pub(crate) notifier: Arc<dyn UserNotifier>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) urls: ActionUrlBuilder,
}

impl Store {
    // =======================================================================
    // Construction
    // =======================================================================

    pub fn new(
        config: StoreConfig,
        transport: Arc<dyn Transport>,
        urls: ActionUrlBuilder,
    ) -> Result<Self> {
        config.validate()?;
        let proxy = RemoteProxy::new(&config, Arc::clone(&transport), urls.clone());
        Ok(Self {
            config,
            proxy,
            cache: Mutex::new(RecordCache::new()),
            events: EventEmitter::new(),
            lookup_stores: Mutex::new(HashMap::new()),
            user_filters: Mutex::new(Vec::new()),
            last_options: Mutex::new(LoadOptions::default()),
            loading: AtomicBool::new(false),
            notifier: Arc::new(LogNotifier),
            transport,
            urls,
        })
    }

    /// A store talking HTTP through [`ReqwestTransport`].
    pub fn connect(config: StoreConfig, connection: &ConnectionConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(ReqwestTransport::new(connection)),
            ActionUrlBuilder::new(connection),
        )
    }

    /// Replace the default [`LogNotifier`].
    pub fn with_notifier(mut self, notifier: Arc<dyn UserNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn events(&self) -> &EventEmitter<StoreEvent> {
        &self.events
    }

    pub fn proxy(&self) -> &RemoteProxy {
        &self.proxy
    }

    // =======================================================================
    // Loading
    // =======================================================================

    /// Read from the server and replace the cache.
    ///
    /// Returns `true` when the cache was replaced. A canceled `BeforeLoad`
    /// or a failed read returns `false`; the failure is kept in
    /// [`Store::load_error`].
    #[instrument(skip(self), fields(schema = %self.config.schema_name, query = %self.config.query_label()))]
    pub async fn load(&self, options: LoadOptions) -> bool {
        let user_filters = self.user_filters.lock().clone();
        let params = self.proxy.prepare(&options, &user_filters);

        if self
            .events
            .dispatch(&StoreEvent::BeforeLoad {
                params: params.clone(),
            })
            .is_cancel()
        {
            debug!("load canceled by listener");
            return false;
        }

        *self.last_options.lock() = options;
        self.loading.store(true, Ordering::SeqCst);
        let result = self.proxy.read(&params).await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(response) => {
                let records = {
                    let mut cache = self.cache.lock();
                    let mut records = cache.load(response);
                    if let Some(null_record) = &self.config.null_record {
                        let caption = null_record
                            .null_caption
                            .as_deref()
                            .unwrap_or(DEFAULT_NULL_CAPTION);
                        records.insert(0, cache.insert_null_record(null_record, caption));
                    }
                    records
                };
                debug!(count = records.len(), "load complete");
                self.events.dispatch(&StoreEvent::Load { records });
                true
            }
            Err(err) => {
                warn!(error = %err, "load failed");
                let error = LoadError::from(&err);
                self.cache.lock().set_load_error(error.clone());
                self.events.dispatch(&StoreEvent::LoadException { error });
                false
            }
        }
    }

    /// Repeat the last load with the same paging and sort.
    pub async fn reload(&self) -> bool {
        let options = self.last_options.lock().clone();
        self.load(options).await
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The last read failure; cleared by the next successful load.
    pub fn load_error(&self) -> Option<LoadError> {
        self.cache.lock().load_error().cloned()
    }

    // =======================================================================
    // Metadata and records
    // =======================================================================

    /// Name of the identity column, known after the first load.
    pub fn id_name(&self) -> Option<String> {
        self.cache.lock().id_name().map(str::to_string)
    }

    pub fn fields(&self) -> Vec<FieldMeta> {
        self.cache.lock().fields().to_vec()
    }

    pub fn column_model(&self) -> Option<Vec<ColumnModelEntry>> {
        self.cache.lock().column_model().map(<[_]>::to_vec)
    }

    /// Server-reported row count for the whole query, not just this page.
    pub fn total_count(&self) -> Option<u64> {
        self.cache.lock().total_count()
    }

    pub fn count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Snapshot of every record, in cache order.
    pub fn records(&self) -> Vec<Record> {
        self.cache.lock().records().cloned().collect()
    }

    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.cache.lock().get(id).cloned()
    }

    /// Identity lookup.
    pub fn get_by_id(&self, key: &str) -> Option<Record> {
        self.cache.lock().get_by_key(key).cloned()
    }

    pub fn index_of(&self, id: RecordId) -> Option<usize> {
        self.cache.lock().index_of(id)
    }

    /// Run `f` against the cache without cloning records out.
    pub fn with_cache<R>(&self, f: impl FnOnce(&RecordCache) -> R) -> R {
        f(&self.cache.lock())
    }

    // =======================================================================
    // Local edits
    // =======================================================================

    /// Create a record locally; nothing is sent until
    /// [`Store::commit_changes`].
    pub fn add_record(
        &self,
        data: Option<Map<String, Value>>,
        index: Option<usize>,
    ) -> Result<RecordId> {
        self.ensure_updatable()?;
        let (id, index) = self.cache.lock().add(data, index);
        self.events.dispatch(&StoreEvent::Add {
            records: vec![id],
            index,
        });
        Ok(id)
    }

    /// Edit one field. Returns whether the value changed.
    pub fn set_value(&self, id: RecordId, field: &str, value: impl Into<Value>) -> Result<bool> {
        let changed = {
            let mut cache = self.cache.lock();
            let record = cache.get_mut(id).ok_or(StoreError::UnknownRecord(id))?;
            record.set(field, value.into())
        };
        if changed {
            self.events.dispatch(&StoreEvent::Update {
                record: id,
                operation: UpdateOperation::Edit {
                    field: field.to_string(),
                },
            });
        }
        Ok(changed)
    }

    /// Records edited since the last load or commit, and new records.
    pub fn get_modified_records(&self) -> Vec<RecordId> {
        self.cache.lock().modified()
    }

    pub fn is_update_in_progress(&self, id: RecordId) -> bool {
        self.cache
            .lock()
            .get(id)
            .is_some_and(Record::is_save_operation_in_progress)
    }

    /// Roll back every local edit. New records stay in the cache.
    pub fn reject_changes(&self) -> Vec<RecordId> {
        let rejected = self.cache.lock().reject_all();
        for id in &rejected {
            self.events.dispatch(&StoreEvent::Update {
                record: *id,
                operation: UpdateOperation::Reject,
            });
        }
        rejected
    }

    // =======================================================================
    // Filters
    // =======================================================================

    /// Filters applied on top of the configured `filterArray` from the next
    /// load on.
    pub fn set_user_filters(&self, filters: Vec<QueryFilter>) {
        *self.user_filters.lock() = filters;
    }

    pub fn user_filters(&self) -> Vec<QueryFilter> {
        self.user_filters.lock().clone()
    }

    // =======================================================================
    // Lookups
    // =======================================================================

    /// Store over the table `column` looks up into, created once per column
    /// and not loaded. `None` when the column has no lookup.
    pub fn get_lookup_store(&self, column: &str, include_null_record: bool) -> Option<Arc<Store>> {
        let mut stores = self.lookup_stores.lock();
        if let Some(store) = stores.get(column) {
            return Some(Arc::clone(store));
        }

        let lookup = self.cache.lock().find_field(column)?.lookup.clone()?;
        let mut config = StoreConfig::new(lookup.schema, lookup.table);
        config.container_path = lookup
            .container_path
            .or_else(|| self.config.container_path.clone());
        if include_null_record {
            config.null_record = lookup.display_column.map(|display_column| NullRecordConfig {
                display_column,
                null_caption: Some(
                    self.config
                        .lookup_null_caption
                        .clone()
                        .unwrap_or_else(|| DEFAULT_NULL_CAPTION.to_string()),
                ),
            });
        }

        let store = match Store::new(config, Arc::clone(&self.transport), self.urls.clone()) {
            Ok(store) => store.with_notifier(Arc::clone(&self.notifier)),
            Err(err) => {
                warn!(column, error = %err, "lookup metadata does not describe a usable store");
                return None;
            }
        };
        let store = Arc::new(store);
        stores.insert(column.to_string(), Arc::clone(&store));
        Some(store)
    }

    // =======================================================================
    // Export
    // =======================================================================

    /// URL that downloads every row matching the store's query, filters and
    /// sort in `format`.
    pub fn export_url(&self, format: ExportFormat) -> Result<String> {
        let container = self.config.container_path.as_deref();
        let mut params = ParamMap::new();
        set_param(&mut params, "schemaName", self.config.schema_name.as_str());

        if let Some(sql) = &self.config.sql {
            set_param(&mut params, "sql", sql.as_str());
            set_param(&mut params, "format", format.as_str());
            if let Some(filter) = &self.config.container_filter {
                set_param(&mut params, "containerFilter", filter.as_str());
            }
            return self
                .urls
                .build("query", "exportSql.view", container, &params)
                .map_err(|e| RemoteError::from(e).into());
        }

        if let Some(query) = &self.config.query_name {
            set_param(&mut params, "query.queryName", query.as_str());
        }
        if let Some(filter) = &self.config.container_filter {
            set_param(&mut params, "query.containerFilterName", filter.as_str());
        }
        set_param(&mut params, "query.showRows", "all");
        if let Some(columns) = &self.config.columns {
            set_param(&mut params, "query.columns", columns.joined());
        }
        append_filter_params(&mut params, &self.config.filter_array, None);
        if let Some(sort) = self.config.sort_param() {
            set_param(&mut params, "query.sort", sort);
        }
        append_filter_params(&mut params, &self.user_filters.lock(), None);

        let action = match format {
            ExportFormat::Excel => "exportRowsExcel.view",
            ExportFormat::Tsv => "exportRowsTsv.view",
        };
        self.urls
            .build("query", action, container, &params)
            .map_err(|e| RemoteError::from(e).into())
    }

    // =======================================================================
    // Internals
    // =======================================================================

    pub(crate) fn ensure_updatable(&self) -> Result<()> {
        if self.config.is_updatable() {
            Ok(())
        } else {
            Err(StoreError::NotUpdatable {
                schema: self.config.schema_name.clone(),
                query: self.config.query_label(),
            })
        }
    }
}
