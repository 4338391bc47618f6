//! Tracing session binding
//!
//! A [`TracerSession`] tags every event it receives with its session label
//! and hands it to a [`TraceExporter`]. The exporter is shared by reference;
//! the session does not own the backend.

use crate::error::Result;
use crate::event::RunEvent;
use crate::kind::CallbackHandler;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// A run event tagged with the session it was traced under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub session: String,
    pub event: RunEvent,
}

/// Destination for trace records
pub trait TraceExporter: Send + Sync {
    /// Export one record
    ///
    /// Errors are logged by the session and never reach the call tree.
    fn export(&self, record: &TraceRecord) -> Result<()>;
}

/// Emits each record as a structured `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogExporter;

impl TraceExporter for LogExporter {
    fn export(&self, record: &TraceRecord) -> Result<()> {
        let payload = serde_json::to_string(&record.event.payload)?;
        info!(
            session = %record.session,
            run_id = %record.event.run_id,
            parent_run_id = ?record.event.parent_run_id,
            name = %record.event.name,
            run_type = ?record.event.run_type,
            phase = ?record.event.phase,
            payload = %payload,
            "run event"
        );
        Ok(())
    }
}

/// Buffers records in memory
#[derive(Debug, Default)]
pub struct InMemoryExporter {
    records: Mutex<Vec<TraceRecord>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records exported so far, in order
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl TraceExporter for InMemoryExporter {
    fn export(&self, record: &TraceRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Session label plus the exporter its events go to
pub struct TracerSession {
    session_name: String,
    exporter: Arc<dyn TraceExporter>,
    exported: AtomicU64,
}

impl TracerSession {
    /// Bind a session label to an exporter
    pub fn new(session_name: impl Into<String>, exporter: Arc<dyn TraceExporter>) -> Self {
        Self {
            session_name: session_name.into(),
            exporter,
            exported: AtomicU64::new(0),
        }
    }

    /// Session that writes through [`LogExporter`]
    pub fn with_log_exporter(session_name: impl Into<String>) -> Self {
        Self::new(session_name, Arc::new(LogExporter))
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// The exporter this session writes to
    pub fn exporter(&self) -> &Arc<dyn TraceExporter> {
        &self.exporter
    }

    /// Number of records exported successfully
    pub fn exported_count(&self) -> u64 {
        self.exported.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for TracerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerSession")
            .field("session_name", &self.session_name)
            .field("exported", &self.exported_count())
            .finish()
    }
}

impl CallbackHandler for TracerSession {
    fn on_event(&self, event: &RunEvent) {
        let record = TraceRecord {
            session: self.session_name.clone(),
            event: event.clone(),
        };

        match self.exporter.export(&record) {
            Ok(()) => {
                self.exported.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(
                session = %self.session_name,
                run_id = %event.run_id,
                error = %e,
                "Failed to export trace record"
            ),
        }
    }
}
