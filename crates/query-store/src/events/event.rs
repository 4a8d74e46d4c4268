//! StoreEvent — what a [`crate::Store`] tells its listeners.

use crate::cache::RecordId;
use crate::events::{EventEmitter, Flow};
use crate::commit::PendingRow;
use crate::error::LoadError;
use crate::params::ParamMap;

/// Why an `Update` event fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOperation {
    /// A local field edit.
    Edit { field: String },
    /// The record was saved and server values applied.
    Commit,
    /// Local edits were rolled back.
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// About to read. Cancelable.
    BeforeLoad { params: ParamMap },
    /// The cache was replaced by a read.
    Load { records: Vec<RecordId> },
    /// The read failed; the same error is kept in `load_error()`.
    LoadException { error: LoadError },
    /// Records were created locally.
    Add { records: Vec<RecordId>, index: usize },
    Update {
        record: RecordId,
        operation: UpdateOperation,
    },
    /// A batch is ready to send. Cancelable.
    BeforeCommit {
        records: Vec<RecordId>,
        rows: Vec<PendingRow>,
    },
    /// A save or delete round trip finished successfully.
    CommitComplete { records: Vec<RecordId> },
    /// A save or delete failed. Canceling suppresses the user alert.
    CommitException {
        message: String,
        status: Option<u16>,
    },
}

impl StoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeLoad { .. } => "beforeload",
            Self::Load { .. } => "load",
            Self::LoadException { .. } => "loadexception",
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::BeforeCommit { .. } => "beforecommit",
            Self::CommitComplete { .. } => "commitcomplete",
            Self::CommitException { .. } => "commitexception",
        }
    }

    /// Whether a [`Flow::Cancel`] from a listener has any effect.
    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            Self::BeforeLoad { .. } | Self::BeforeCommit { .. } | Self::CommitException { .. }
        )
    }
}

impl EventEmitter<StoreEvent> {
    /// Emit `event`, honoring [`Flow::Cancel`] only for cancelable events.
    /// Non-cancelable events reach every listener and yield
    /// [`Flow::Continue`].
    pub fn dispatch(&self, event: &StoreEvent) -> Flow {
        if event.is_cancelable() {
            self.emit_cancelable(event)
        } else {
            self.emit(event);
            Flow::Continue
        }
    }
}
