use std::sync::{Arc, Mutex};

use crate::{backend::ComponentRegistration, log::Level};

/// Prefix of every line written for a completed registration.
pub const REGISTER_MARKER: &str = "<<<REGISTER>>>";

/// Receives one line of text per completed registration.
pub trait TraceSink: Send + Sync {
    fn write_line(&self, line: &str);
}

pub type SharedTraceSink = Arc<dyn TraceSink>;

pub fn format_register_line(registration: &ComponentRegistration) -> String {
    format!("{REGISTER_MARKER} {registration}")
}

/// Forwards trace lines to `tracing` at a fixed level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn shared(level: Level) -> SharedTraceSink {
        Arc::new(Self::new(level))
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl TraceSink for TracingSink {
    fn write_line(&self, line: &str) {
        match self.level {
            Level::Trace => tracing::trace!(target: "ferrule::registration", "{line}"),
            Level::Debug => tracing::debug!(target: "ferrule::registration", "{line}"),
            Level::Info => tracing::info!(target: "ferrule::registration", "{line}"),
            Level::Warn => tracing::warn!(target: "ferrule::registration", "{line}"),
            Level::Error => tracing::error!(target: "ferrule::registration", "{line}"),
            Level::Off => {}
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for MemorySink {
    fn write_line(&self, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}
