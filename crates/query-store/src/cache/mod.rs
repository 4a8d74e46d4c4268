//! Record cache — ordered, key-indexed working set with edit tracking.

pub mod collection;
pub mod record;

pub use collection::RecordCache;
pub use record::{key_string, ExtendedValue, Record, RecordId, WriteState};
