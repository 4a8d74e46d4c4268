//! Column filters and their URL encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::{append_param, ParamMap};

use super::types::FilterType;

/// Default data region prefix for filter and sort parameters.
pub const DEFAULT_REGION: &str = "query";

/// A `(column, operator, value)` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub column: String,
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub filter_type: FilterType,
}

impl QueryFilter {
    pub fn new(column: impl Into<String>, value: impl Into<Value>, filter_type: FilterType) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            filter_type,
        }
    }

    /// Equality filter, the default operator.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, value, FilterType::Equal)
    }

    /// `{region}.{column}~{suffix}`
    pub fn url_parameter_name(&self, region: Option<&str>) -> String {
        format!(
            "{}.{}~{}",
            region.unwrap_or(DEFAULT_REGION),
            self.column,
            self.filter_type.url_suffix()
        )
    }

    /// Wire value: empty for value-less operators, `None` when a required
    /// value is null. Lists are joined with `;`.
    pub fn url_parameter_value(&self) -> Option<String> {
        if !self.filter_type.is_data_value_required() {
            return Some(String::new());
        }
        encode_value(&self.value)
    }
}

fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(encode_value)
                .collect::<Vec<_>>()
                .join(";"),
        ),
        other => Some(other.to_string()),
    }
}

/// Append each filter's parameter to `params`. Filters whose required value
/// is null are no-ops; repeated names accumulate.
pub fn append_filter_params(params: &mut ParamMap, filters: &[QueryFilter], region: Option<&str>) {
    for filter in filters {
        let Some(value) = filter.url_parameter_value() else {
            continue;
        };
        append_param(params, filter.url_parameter_name(region), value);
    }
}

/// Replace every filter on `column` in `base` with `column_filters`.
pub fn merge_filters(
    base: &[QueryFilter],
    column: &str,
    column_filters: Option<&[QueryFilter]>,
) -> Vec<QueryFilter> {
    let mut merged: Vec<QueryFilter> = base
        .iter()
        .filter(|f| f.column != column)
        .cloned()
        .collect();
    if let Some(extra) = column_filters {
        merged.extend_from_slice(extra);
    }
    merged
}

/// Rebuild filters from URL parameters of the form `{region}.{column}~{suffix}`.
/// Unknown operator suffixes are ignored.
pub fn filters_from_params(params: &ParamMap, region: Option<&str>) -> Vec<QueryFilter> {
    let prefix = format!("{}.", region.unwrap_or(DEFAULT_REGION));
    let mut filters = Vec::new();
    for (name, value) in params {
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        let Some((column, suffix)) = rest.split_once('~') else {
            continue;
        };
        let Some(filter_type) = FilterType::from_url_suffix(suffix) else {
            continue;
        };
        let values = value.values();
        let value = match values.as_slice() {
            [single] => Value::String((*single).to_string()),
            many => Value::Array(many.iter().map(|v| Value::String((*v).to_string())).collect()),
        };
        filters.push(QueryFilter::new(column, value, filter_type));
    }
    filters
}

/// Human-readable description of the filters on `column`,
/// e.g. `Is Greater Than 5 AND Is Less Than 10`.
pub fn describe_filters(filters: &[QueryFilter], column: &str) -> String {
    filters
        .iter()
        .filter(|f| f.column == column)
        .map(|f| {
            let value = f.url_parameter_value().unwrap_or_default();
            if value.is_empty() {
                f.filter_type.display_text().to_string()
            } else {
                format!("{} {}", f.filter_type.display_text(), value)
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
