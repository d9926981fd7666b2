// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::checklist::StepStatus;
use crate::rpc::messages::CountPerDb;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
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

    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn duration_secs(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => match self.duration_secs() {
                Some(elapsed) => println!("{message} ({elapsed:.1}s)"),
                None => println!("{message}"),
            },
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_event("success", message, false),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.emit_event("error", message, true),
        }
    }

    /// Print the upgrade checklist, one step per line.
    pub fn status(&self, statuses: &[StepStatus]) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => print!("{}", render_status_table(statuses)),
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(statuses) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print table counts, one database per line.
    pub fn object_counts(&self, counts: &[CountPerDb]) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => print!("{}", render_count_table(counts)),
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(counts) {
                    println!("{json}");
                }
            }
        }
    }

    fn emit_event(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration_secs(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

/// Two aligned columns: status, then step code.
pub fn render_status_table(statuses: &[StepStatus]) -> String {
    let width = statuses
        .iter()
        .map(|s| s.status.to_string().len())
        .max()
        .unwrap_or(0);

    statuses
        .iter()
        .map(|s| {
            let code = serde_json::to_value(s.step)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| s.step.to_string());
            format!("{:<width$} - {}\n", s.status.to_string(), code, width = width)
        })
        .collect()
}

pub fn render_count_table(counts: &[CountPerDb]) -> String {
    let width = counts.iter().map(|c| c.db_name.len()).max().unwrap_or(0);

    counts
        .iter()
        .map(|c| {
            format!(
                "{:<width$}  AO/CO: {}  heap: {}\n",
                c.db_name,
                c.ao_count,
                c.heap_count,
                width = width
            )
        })
        .collect()
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
