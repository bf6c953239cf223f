//! Operation Reports and Output Envelopes
//!
//! Every menu operation produces a [`Report`]: the ordered lines shown to the
//! operator plus the outcome of its transaction. A report renders either as
//! text for the terminal or as a JSON envelope.
//!
//! # Output Contract (JSON)
//! - Success: `{"ok": true, "engine": "...", "command": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "engine": "...", "command": "...", "error": {"code": "...", "message": "..."}}`

use serde::{Deserialize, Serialize};

use crate::error::WorkforceError;

/// Report rendering selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON envelope per operation
    Json,
}

/// A named value inside a row or preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    pub value: String,
}

impl Cell {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self { name: name.into(), value: value.to_string() }
    }
}

/// One line of operation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Line {
    /// Completed step or result summary
    Success { text: String },
    /// Failure explaining why the operation stopped
    Failure { text: String },
    /// Labeled attribute of a single looked-up row
    Field { label: String, value: String },
    /// Numbered row of a listing
    Row { number: usize, cells: Vec<Cell> },
    /// Projected result shown before confirmation
    Preview { cells: Vec<Cell> },
}

/// Output and outcome of one menu operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Stable command name (e.g. `employee-by-id`)
    pub command: String,
    /// Whether the transaction was committed
    pub committed: bool,
    pub lines: Vec<Line>,
    /// Rows listed or affected, when the operation counts any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Set when the operation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub execution_ms: u64,
}

impl Report {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            committed: false,
            lines: Vec::new(),
            rows: None,
            error: None,
            execution_ms: 0,
        }
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Success { text: text.into() });
    }

    pub fn field(&mut self, label: impl Into<String>, value: impl ToString) {
        self.lines.push(Line::Field { label: label.into(), value: value.to_string() });
    }

    /// Append a listing row, numbered from 1
    pub fn row(&mut self, cells: Vec<Cell>) {
        let number = self.lines.iter().filter(|l| matches!(l, Line::Row { .. })).count() + 1;
        self.lines.push(Line::Row { number, cells });
    }

    pub fn preview(&mut self, cells: Vec<Cell>) {
        self.lines.push(Line::Preview { cells });
    }

    /// Failure line that is not an error (e.g. the operator declined)
    pub fn failure(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Failure { text: text.into() });
    }

    /// Record a failure line and the error behind it
    pub fn fail(&mut self, err: &WorkforceError) {
        self.failure(err.message());
        self.error = Some(ErrorInfo::from(err));
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Render for the terminal
    ///
    /// Previews are left out: the prompter already showed them when asking
    /// for confirmation.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Success { text } => out.push_str(&format!("[✓] {text}\n")),
                Line::Failure { text } => out.push_str(&format!("[✗] {text}\n")),
                Line::Field { label, value } => out.push_str(&format!("\t{label}: {value}\n")),
                Line::Row { number, cells } => {
                    out.push_str(&format!("\tRow {number}: {}\n", bracketed(cells)));
                }
                Line::Preview { .. } => {}
            }
        }
        out
    }

    /// Render as a success or error envelope
    pub fn render_json(&self, engine: &str) -> serde_json::Result<String> {
        match &self.error {
            Some(info) => serde_json::to_string(&ErrorEnvelope::new(
                engine,
                self.command.as_str(),
                info.clone(),
            )),
            None => {
                let data = ReportData { committed: self.committed, lines: &self.lines };
                let meta = Metadata { execution_ms: self.execution_ms, rows: self.rows };
                serde_json::to_string(&SuccessEnvelope::new(engine, self.command.as_str(), data, meta))
            }
        }
    }
}

/// `[name: value, ...]`, the layout used for rows and previews
#[must_use]
pub fn bracketed(cells: &[Cell]) -> String {
    let inner: Vec<String> = cells.iter().map(|c| format!("{}: {}", c.name, c.value)).collect();
    format!("[{}]", inner.join(", "))
}

/// Payload of a success envelope
#[derive(Debug, Clone, Serialize)]
pub struct ReportData<'a> {
    pub committed: bool,
    pub lines: &'a [Line],
}

/// Success envelope for operation results
///
/// Generic over the data type to support different operation return values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Database engine used for this operation (postgres, sqlite)
    pub engine: String,

    /// Menu command that was executed
    pub command: String,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(engine: impl Into<String>, command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, engine: engine.into(), command: command.into(), data, meta }
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Database engine (empty string if the failure happened before connecting)
    pub engine: String,

    /// Command that was attempted
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(engine: impl Into<String>, command: impl Into<String>, error: ErrorInfo) -> Self {
        Self { ok: false, engine: engine.into(), command: command.into(), error }
    }

    /// Create error envelope from a `WorkforceError`
    pub fn from_error(
        engine: impl Into<String>,
        command: impl Into<String>,
        err: &WorkforceError,
    ) -> Self {
        Self::new(engine, command, ErrorInfo::from(err))
    }
}

/// Error information structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "MISSING_INPUT", "REJECTED")
    pub code: String,

    /// Operator-facing message
    pub message: String,
}

impl From<&WorkforceError> for ErrorInfo {
    fn from(err: &WorkforceError) -> Self {
        Self { code: err.error_code().to_string(), message: err.message() }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    /// Rows listed or affected (omitted when the operation counts none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}
