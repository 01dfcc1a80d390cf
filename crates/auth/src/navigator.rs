//! Navigation seam
//!
//! The tracker triggers navigation in exactly two situations: routing
//! after login and the logout redirect on irrecoverable expiry. The
//! host decides what "navigate" means; targets are fixed relative paths.

use std::sync::{Arc, Mutex};

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Default host hook that only records the intent in the log.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigation requested");
    }
}

/// Test navigator that records every requested path.
#[derive(Default, Clone)]
pub struct RecordingNavigator {
    paths: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .expect("paths lock poisoned — prior test panicked")
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths
            .lock()
            .expect("paths lock poisoned — prior test panicked")
            .push(path.to_string());
    }
}
