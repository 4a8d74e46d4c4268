//! Read-request parameters: the fixed base set derived from the store
//! config, and the per-load paging/sort overlay.

use crate::config::{sort_param, SortDirection, StoreConfig};
use crate::params::{set_param, ParamMap};

/// Response format version requested from the server (extended row values).
pub const API_VERSION: &str = "9.1";

/// `query.*` parameters that configure the query rather than filter it.
const RESERVED_QUERY_PREFIXES: &[&str] = &[
    "columns",
    "containerFilterName",
    "ignoreFilter",
    "maxRows",
    "param",
    "queryName",
    "sort",
    "viewName",
];

/// Base parameters sent with every read.
pub fn base_params(config: &StoreConfig) -> ParamMap {
    let mut params = ParamMap::new();
    set_param(&mut params, "schemaName", config.schema_name.as_str());
    // Key and other non-requested columns must come back for commits to work.
    set_param(&mut params, "minimalColumns", "false");

    let is_sql = config.sql.is_some();
    if let (Some(query), false) = (&config.query_name, is_sql) {
        set_param(&mut params, "query.queryName", query.as_str());
    }
    if let Some(sql) = &config.sql {
        set_param(&mut params, "sql", sql.as_str());
    }
    if let Some(sort) = config.sort_param() {
        set_param(&mut params, "query.sort", sort);
    }
    for (name, value) in &config.parameters {
        set_param(&mut params, format!("query.param.{name}"), scalar_to_string(value));
    }
    if !is_sql {
        if let Some(view) = &config.view_name {
            set_param(&mut params, "query.viewName", view.as_str());
        }
        if let Some(columns) = &config.columns {
            set_param(&mut params, "query.columns", columns.joined());
        }
    }
    if let Some(container_filter) = &config.container_filter {
        set_param(&mut params, "containerFilter", container_filter.as_str());
    }
    if config.ignore_filter {
        set_param(&mut params, "query.ignoreFilter", "1");
    }
    if let Some(max_rows) = config.max_rows {
        let name = if is_sql { "maxRows" } else { "query.maxRows" };
        set_param(&mut params, name, max_rows.to_string());
    }
    set_param(&mut params, "apiVersion", API_VERSION);
    params
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// True for `query.<x>` filter parameters, i.e. anything under `query.` whose
/// first segment is not a reserved configuration name.
pub fn is_filter_param(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("query.") else {
        return false;
    };
    let prefix = rest.split('.').next().unwrap_or_default();
    !RESERVED_QUERY_PREFIXES.contains(&prefix)
}

// ============================================================================
// LoadOptions
// ============================================================================

/// Per-load paging and sorting in generic grid vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
}

impl LoadOptions {
    pub fn page(start: u32, limit: u32) -> Self {
        Self {
            start: Some(start),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, field: impl Into<String>, dir: SortDirection) -> Self {
        self.sort = Some(field.into());
        self.dir = Some(dir);
        self
    }

    /// Translate to the server's vocabulary: `start` → `query.offset`,
    /// `limit` → `query.maxRows`, `sort`+`dir` → `query.sort` with a `-`
    /// prefix for descending.
    pub fn to_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        if let Some(start) = self.start {
            set_param(&mut params, "query.offset", start.to_string());
        }
        if let Some(limit) = self.limit {
            set_param(&mut params, "query.maxRows", limit.to_string());
        }
        if let Some(sort) = &self.sort {
            set_param(&mut params, "query.sort", sort_param(sort, self.dir.unwrap_or_default()));
        }
        params
    }
}

/// Overlay request parameters onto the base set; request values win.
pub fn merge_request_params(base: &ParamMap, request: &ParamMap) -> ParamMap {
    let mut merged = base.clone();
    for (name, value) in request {
        merged.insert(name.clone(), value.clone());
    }
    merged
}
