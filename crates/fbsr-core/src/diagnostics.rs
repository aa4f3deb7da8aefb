//! Diagnostics accumulated while rendering one blueprint.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic. Ordered so that `max` yields the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Info,
    Warning,
    Error,
}

impl Level {
    /// Display color as RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            Level::Info => [0x00, 0x7f, 0xff],
            Level::Warning => [0xff, 0xa5, 0x00],
            Level::Error => [0xff, 0x00, 0x00],
        }
    }

    /// The display color darkened, used for the outline around a flagged render.
    pub fn outline_color(self) -> [u8; 3] {
        self.color().map(|c| (c as f64 * 0.7) as u8)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => f.write_str("info"),
            Level::Warning => f.write_str("warning"),
            Level::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Caller-owned sink for render diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Reporting {
    entries: Vec<Diagnostic>,
    new_format: bool,
}

impl Reporting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, level: Level, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            level,
            message: message.into(),
        });
    }

    pub fn add_info(&mut self, message: impl Into<String>) {
        self.add(Level::Info, message);
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.add(Level::Warning, message);
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.add(Level::Error, message);
    }

    /// Record a caught failure. Always error severity.
    pub fn add_exception(&mut self, error: &dyn std::error::Error) {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.add(Level::Error, message);
    }

    /// Highest severity seen, `Info` when nothing was reported.
    pub fn level(&self) -> Level {
        self.entries.iter().map(|d| d.level).max().unwrap_or_default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_new_format_detected(&mut self, new_format: bool) {
        self.new_format = new_format;
    }

    pub fn new_format_detected(&self) -> bool {
        self.new_format
    }
}
