//! Query filters — operator table and URL parameter encoding.

pub mod query_filter;
pub mod types;

pub use query_filter::{
    append_filter_params, describe_filters, filters_from_params, merge_filters, QueryFilter,
    DEFAULT_REGION,
};
pub use types::FilterType;
