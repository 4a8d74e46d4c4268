use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{RemoteError, TransportError};
use crate::filter::{append_filter_params, QueryFilter};
use crate::params::{apply_if_absent, ParamMap, ParamValue};
use crate::transport::{ActionUrlBuilder, HttpRequest, Transport};

use super::request::{base_params, is_filter_param, merge_request_params, LoadOptions};
use super::response::SelectRowsResponse;

/// Translates a store config into read requests and parses the responses.
///
/// The proxy never touches the record cache; the caller applies the parsed
/// [`SelectRowsResponse`].
pub struct RemoteProxy {
    schema_name: String,
    container_path: Option<String>,
    is_sql: bool,
    filter_array: Vec<QueryFilter>,
    base_params: Mutex<ParamMap>,
    transport: Arc<dyn Transport>,
    urls: ActionUrlBuilder,
}

impl RemoteProxy {
    pub fn new(config: &StoreConfig, transport: Arc<dyn Transport>, urls: ActionUrlBuilder) -> Self {
        Self {
            schema_name: config.schema_name.clone(),
            container_path: config.container_path.clone(),
            is_sql: config.sql.is_some(),
            filter_array: config.filter_array.clone(),
            base_params: Mutex::new(base_params(config)),
            transport,
            urls,
        }
    }

    pub fn base_params(&self) -> ParamMap {
        self.base_params.lock().clone()
    }

    pub fn set_base_param(&self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.base_params.lock().insert(name.into(), value.into());
    }

    /// Build the full parameter set for one read.
    ///
    /// Filter parameters in the base set are replaced by the current base
    /// filters plus user filters (base filters win on a name clash), then the
    /// per-request paging/sort parameters are laid on top.
    pub fn prepare(&self, options: &LoadOptions, user_filters: &[QueryFilter]) -> ParamMap {
        let mut filters = ParamMap::new();
        append_filter_params(&mut filters, &self.filter_array, None);
        let mut user = ParamMap::new();
        append_filter_params(&mut user, user_filters, None);
        apply_if_absent(&mut filters, &user);

        let base = {
            let mut base = self.base_params.lock();
            base.retain(|name, _| !is_filter_param(name));
            for (name, value) in filters {
                base.insert(name, value);
            }
            base.clone()
        };

        merge_request_params(&base, &options.to_params())
    }

    pub fn read_url(&self, params: &ParamMap) -> Result<String, TransportError> {
        let action = if self.is_sql {
            "executeSql.api"
        } else {
            "selectRows.api"
        };
        self.urls
            .build("query", action, self.container_path.as_deref(), params)
    }

    /// Issue the read. Non-2xx responses and undecodable bodies come back as
    /// [`RemoteError`]; nothing is thrown past this point.
    pub async fn read(&self, params: &ParamMap) -> Result<SelectRowsResponse, RemoteError> {
        let url = self.read_url(params)?;
        debug!(schema = %self.schema_name, %url, "dispatching read");

        let response = self.transport.send(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(RemoteError::Request(response.into_failure()));
        }
        let json = response
            .decode_json()
            .ok_or_else(|| RemoteError::Decode("read response is not JSON".to_string()))?;
        SelectRowsResponse::from_json(json)
    }
}
