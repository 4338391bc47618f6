//! Concrete ambient observers
//!
//! - [`UsageTracker`] - token and cost accumulator
//! - [`TracerSession`] - session label bound to a [`TraceExporter`]
//! - [`RunCollector`] - buffer of completed runs

mod run_collector;
mod tracer;
mod usage;

pub use run_collector::RunCollector;
pub use tracer::{InMemoryExporter, LogExporter, TraceExporter, TraceRecord, TracerSession};
pub use usage::{model_cost_per_1k, UsageTotals, UsageTracker};
