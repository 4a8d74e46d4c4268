//! Commit coordinator — batched saves, key reconciliation, deletes.
//!
//! # Modules
//!
//! - [`batch`] — wire model of the save/delete requests and the save response.
//! - [`coordinator`] — `Store::commit_changes` and `Store::delete_records`.

pub mod batch;
pub mod coordinator;

pub use batch::{
    normalize_values, DeleteRowsRequest, PendingRow, RowCommand, SaveRowsRequest,
    SaveRowsResponse, SavedRow,
};
pub use coordinator::{CommitOutcome, DeleteOutcome};
