//! Client-side record store over a remote query API.
//!
//! A [`Store`] reads rows through the remote proxy, keeps them in an ordered
//! record cache with per-field edit tracking, and writes every dirty record
//! back in one batched save, swapping in server-assigned keys on the way.

pub mod cache;
pub mod commit;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod notify;
pub mod params;
pub mod proxy;
pub mod store;
pub mod transport;

pub use cache::{Record, RecordCache, RecordId, WriteState};
pub use commit::{CommitOutcome, DeleteOutcome, PendingRow, RowCommand};
pub use config::{ConnectionConfig, NullRecordConfig, SortDirection, SortInfo, StoreConfig};
pub use error::{LoadError, RemoteError, Result, StoreError, TransportError};
pub use events::{EventEmitter, Flow, ListenerId, StoreEvent, UpdateOperation};
pub use filter::{FilterType, QueryFilter};
pub use notify::{LogNotifier, UserNotifier};
pub use params::{ParamMap, ParamValue};
pub use proxy::{FieldMeta, FieldType, LoadOptions};
pub use store::{ExportFormat, Store};
pub use transport::{
    ActionUrlBuilder, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport,
};
