use std::sync::{Arc, Mutex};

use relaunch::process::LogSink;

/// Log sink that keeps everything for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(String, String)>>>,
    notices: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(step, line)` pairs in arrival order.
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn output_of(&self, step: &str) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == step)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn has_notice(&self, needle: &str) -> bool {
        self.notices.lock().unwrap().iter().any(|n| n.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn output(&self, step: &str, line: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((step.to_string(), line.to_string()));
    }

    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}
