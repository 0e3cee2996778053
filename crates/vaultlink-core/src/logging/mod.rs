//! Injected logging handles
//!
//! Components never reach for a global logger; each one is handed a
//! `SharedLogger` when it is built.

mod traits;
mod noop;
mod tracing_logger;
mod memory;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;
pub use memory::{MemoryLogger, LogEntry, LogLevel};
