use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// Oldest events are dropped from memory past this many; the file keeps all
const MAX_EVENTS_IN_MEMORY: usize = 500;

/// One line of the activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    pub operator: String,
    pub event_type: EventType,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    InvocationStarted { tool: String },
    InvocationFinished { tool: String, classification: String, duration_ms: u64 },
    InvocationRejected { tool: String, warning: String },
    CleanupFailed { path: String, error: String },
    LoginSucceeded,
    LoginFailed,
}

/// Appends activity events as JSON lines. A log without a file only keeps
/// events in memory, which is what tests and one-shot runs use.
#[derive(Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl ActivityLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        if let Some(parent) = path.as_ref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).ok();
            }
        }

        Self {
            path,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn record(&self, operator: &str, event_type: EventType, message: String, details: Option<serde_json::Value>) {
        let event = ActivityEvent {
            timestamp: Utc::now(),
            operator: operator.to_string(),
            event_type,
            message,
            details,
        };

        if let Some(path) = &self.path {
            if let Ok(json) = serde_json::to_string(&event) {
                if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) {
                    writeln!(file, "{}", json).ok();
                }
            }
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
            if events.len() > MAX_EVENTS_IN_MEMORY {
                let excess = events.len() - MAX_EVENTS_IN_MEMORY;
                events.drain(..excess);
            }
        }
    }

    pub fn invocation_started(&self, operator: &str, tool: &str, query: &str) {
        self.record(
            operator,
            EventType::InvocationStarted { tool: tool.to_string() },
            format!("{} started for '{}'", tool, query),
            None,
        );
    }

    pub fn invocation_finished(&self, operator: &str, tool: &str, classification: &str, duration_ms: u64, message: &str) {
        self.record(
            operator,
            EventType::InvocationFinished {
                tool: tool.to_string(),
                classification: classification.to_string(),
                duration_ms,
            },
            message.to_string(),
            None,
        );
    }

    pub fn invocation_rejected(&self, operator: &str, tool: &str, warning: &str) {
        self.record(
            operator,
            EventType::InvocationRejected {
                tool: tool.to_string(),
                warning: warning.to_string(),
            },
            warning.to_string(),
            None,
        );
    }

    pub fn cleanup_failed(&self, operator: &str, path: &Path, error: &str) {
        self.record(
            operator,
            EventType::CleanupFailed {
                path: path.display().to_string(),
                error: error.to_string(),
            },
            format!("Error deleting {}: {}", path.display(), error),
            None,
        );
    }

    pub fn login(&self, login: &str, success: bool) {
        let (event_type, message) = if success {
            (EventType::LoginSucceeded, format!("{} logged in", login))
        } else {
            (EventType::LoginFailed, format!("failed login for {}", login))
        };
        self.record(login, event_type, message, None);
    }

    pub fn get_events(&self) -> Vec<ActivityEvent> {
        if let Ok(events) = self.events.lock() {
            events.clone()
        } else {
            Vec::new()
        }
    }

    /// Read events back from a log file, skipping malformed lines
    pub fn read_events_from_file(path: &Path) -> Vec<ActivityEvent> {
        let mut events = Vec::new();

        if let Ok(content) = fs::read_to_string(path) {
            for line in content.lines() {
                if let Ok(event) = serde_json::from_str::<ActivityEvent>(line) {
                    events.push(event);
                }
            }
        }

        events
    }
}
