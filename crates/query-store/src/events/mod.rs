//! Store events — typed, synchronous, optionally cancelable.
//!
//! # Modules
//!
//! - [`event`] — [`StoreEvent`] and [`UpdateOperation`].
//! - [`emitter`] — generic [`EventEmitter<T>`] with [`Flow`]-based cancellation.

pub mod emitter;
pub mod event;

pub use emitter::{EventEmitter, Flow, ListenerId};
pub use event::{StoreEvent, UpdateOperation};
