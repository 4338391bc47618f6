//! Buffer of completed runs

use crate::event::RunEvent;
use crate::kind::CallbackHandler;
use parking_lot::Mutex;

/// Collects every run that ends or errors while it is active
#[derive(Debug, Default)]
pub struct RunCollector {
    runs: Mutex<Vec<RunEvent>>,
}

impl RunCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed runs in the order they finished
    pub fn traced_runs(&self) -> Vec<RunEvent> {
        self.runs.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }

    pub fn clear(&self) {
        self.runs.lock().clear();
    }
}

impl CallbackHandler for RunCollector {
    fn on_event(&self, event: &RunEvent) {
        if event.is_terminal() {
            self.runs.lock().push(event.clone());
        }
    }
}
