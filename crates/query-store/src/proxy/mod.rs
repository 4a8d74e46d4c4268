//! Remote collection proxy — read requests against the query API.
//!
//! # Modules
//!
//! - [`request`] — base parameters, paging/sort translation, filter-param detection.
//! - [`response`] — [`SelectRowsResponse`] and the field/column metadata it carries.
//! - [`remote`] — [`RemoteProxy`], which dispatches reads through a [`crate::Transport`].

pub mod remote;
pub mod request;
pub mod response;

pub use remote::RemoteProxy;
pub use request::{base_params, is_filter_param, merge_request_params, LoadOptions, API_VERSION};
pub use response::{
    ColumnModelEntry, FieldMeta, FieldType, LookupMeta, ResponseMetadata, SelectRowsResponse,
};
