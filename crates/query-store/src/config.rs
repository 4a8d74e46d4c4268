//! Store and connection configuration.
//!
//! `StoreConfig` deserializes from a camelCase JSON object, so store
//! configs can be kept as data.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::filter::QueryFilter;

// ============================================================================
// Sorting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortDirection {
    /// Anything other than a case-insensitive `DESC` sorts ascending.
    pub fn parse(dir: &str) -> Self {
        if dir.eq_ignore_ascii_case("DESC") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Field-plus-direction sort, turned into a `-`-prefixed sort string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SortInfo {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortInfo {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn to_sort_param(&self) -> String {
        sort_param(&self.field, self.direction)
    }
}

/// `Name` ascending, `-Name` descending.
pub fn sort_param(field: &str, direction: SortDirection) -> String {
    match direction {
        SortDirection::Asc => field.to_string(),
        SortDirection::Desc => format!("-{field}"),
    }
}

// ============================================================================
// StoreConfig
// ============================================================================

/// Column list, given either as a comma-delimited string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    Joined(String),
    List(Vec<String>),
}

impl Columns {
    pub fn joined(&self) -> String {
        match self {
            Self::Joined(s) => s.clone(),
            Self::List(cols) => cols.join(","),
        }
    }
}

/// Synthetic blank row for lookup stores bound to a combo box.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullRecordConfig {
    pub display_column: String,
    #[serde(default)]
    pub null_caption: Option<String>,
}

pub const DEFAULT_NULL_CAPTION: &str = "[none]";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    pub schema_name: String,
    pub query_name: Option<String>,
    /// Ad-hoc SQL. Makes the store read-only.
    pub sql: Option<String>,
    pub view_name: Option<String>,
    pub columns: Option<Columns>,
    /// Comma-delimited sort; a leading `-` sorts that column descending.
    pub sort: Option<String>,
    pub sort_info: Option<SortInfo>,
    pub filter_array: Vec<QueryFilter>,
    /// Parameterized-query values, sent as `query.param.<name>`.
    pub parameters: Map<String, Value>,
    pub container_path: Option<String>,
    pub container_filter: Option<String>,
    pub ignore_filter: bool,
    pub max_rows: Option<u32>,
    pub updatable: Option<bool>,
    /// Skip the required-column check before commit.
    pub no_validation_check: bool,
    pub lookup_null_caption: Option<String>,
    pub null_record: Option<NullRecordConfig>,
}

impl StoreConfig {
    pub fn new(schema_name: impl Into<String>, query_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            query_name: Some(query_name.into()),
            ..Self::default()
        }
    }

    pub fn from_sql(schema_name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            sql: Some(sql.into()),
            ..Self::default()
        }
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_view(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = Some(view_name.into());
        self
    }

    pub fn with_columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(Columns::Joined(columns.into()));
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter_array.push(filter);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_container_path(mut self, path: impl Into<String>) -> Self {
        self.container_path = Some(path.into());
        self
    }

    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn with_null_record(mut self, null_record: NullRecordConfig) -> Self {
        self.null_record = Some(null_record);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_name.trim().is_empty() {
            return Err(StoreError::Config("schemaName is required".to_string()));
        }
        let has_query = self.query_name.as_deref().is_some_and(|q| !q.trim().is_empty());
        if !has_query && self.sql.is_none() {
            return Err(StoreError::Config(
                "either queryName or sql is required".to_string(),
            ));
        }
        Ok(())
    }

    /// SQL-backed stores are never updatable.
    pub fn is_updatable(&self) -> bool {
        self.sql.is_none() && self.updatable.unwrap_or(true)
    }

    /// The configured sort, from `sort` or else `sortInfo`.
    pub fn sort_param(&self) -> Option<String> {
        self.sort
            .clone()
            .or_else(|| self.sort_info.as_ref().map(SortInfo::to_sort_param))
    }

    pub(crate) fn query_label(&self) -> String {
        self.query_name
            .clone()
            .unwrap_or_else(|| "<sql>".to_string())
    }
}

// ============================================================================
// ConnectionConfig
// ============================================================================

/// Where the server lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Scheme, host and port, e.g. `https://labkey.example.org`.
    pub base_url: String,
    /// Web application context path, e.g. `/labkey`. Empty for root deployments.
    pub context_path: String,
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            context_path: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}
