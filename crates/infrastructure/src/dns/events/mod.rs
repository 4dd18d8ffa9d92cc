//! Per-query observability events.
//!
//! The request path hands a `QueryEvent` to the `QueryEventEmitter`, which
//! never waits: a full queue drops the event with a warning. The
//! `QueryLogger` task drains the queue into the access log.

pub mod emitter;
pub mod logger;
pub mod types;

pub use emitter::QueryEventEmitter;
pub use logger::QueryLogger;
pub use types::QueryEvent;
