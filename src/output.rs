// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (silent runs), and JSON output modes.

use crate::diagnostics::StrategyReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Only the final result and errors
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn select(json: bool, silent: bool) -> Self {
        if json {
            OutputMode::Json
        } else if silent {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet mode).
    pub fn progress(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => println!("{message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit_stdout("progress", message, None),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_stdout("success", message, self.duration()),
        }
    }

    /// Print a warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit_stderr("warning", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.emit_stderr("error", message),
        }
    }

    /// Print every warning and failure of a finished run.
    pub fn report(&self, report: &StrategyReport) {
        for warning in report.warnings() {
            self.warning(&warning.message);
        }
        for failure in report.failures() {
            self.error(&failure.to_string());
        }
    }

    fn emit_stdout(&self, event: &str, message: &str, duration_secs: Option<f64>) {
        if let Some(json) = JsonEvent::new(event, message, duration_secs).to_line() {
            println!("{json}");
        }
    }

    fn emit_stderr(&self, event: &str, message: &str) {
        if let Some(json) = JsonEvent::new(event, message, self.duration()).to_line() {
            eprintln!("{json}");
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    timestamp: DateTime<Utc>,
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl<'a> JsonEvent<'a> {
    fn new(event: &'a str, message: &'a str, duration_secs: Option<f64>) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            message,
            duration_secs,
        }
    }

    fn to_line(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}
