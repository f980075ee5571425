//! Report sinks: consume simulation events for logging and inspection.
//!
//! ## Contents
//! - [`ReportSink`] the sink contract
//! - [`SinkSet`] per-sink queues and worker tasks (non-blocking fan-out)
//! - [`LogWriter`] built-in line printer (stdout or file)

mod log;
mod set;
mod sink;

pub use log::LogWriter;
pub use set::SinkSet;
pub use sink::ReportSink;
