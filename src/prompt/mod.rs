//! Operator Input
//!
//! Menu operations declare the fields they need as a static list of [`Field`]s.
//! [`collect`] asks for each one through a [`Prompter`] and parses the answers
//! into a [`Record`]. Nothing here touches the database: a missing or malformed
//! value aborts the operation before a transaction is opened.
//!
//! # Prompters
//! - [`TerminalPrompter`]: `dialoguer` prompts, used when stdin is a terminal
//! - [`LinePrompter`]: plain line reads over any `BufRead` (piped input, tests)

use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

use crate::error::{Result, WorkforceError};

/// Type a field's answer is parsed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

/// One value requested from the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Key used to read the value back from the `Record`
    pub name: &'static str,
    /// Prompt text, also used in "is required" messages
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    #[must_use]
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, required: true }
    }

    #[must_use]
    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, required: false }
    }

    fn parse(&self, text: &str) -> Result<Value> {
        match self.kind {
            FieldKind::Int => text.parse::<i32>().map(Value::Int).map_err(|_| {
                WorkforceError::invalid_input(format!(
                    "{} must be an integer, got '{text}'",
                    self.label
                ))
            }),
            FieldKind::Float => match text.parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(Value::Float(number)),
                _ => Err(WorkforceError::invalid_input(format!(
                    "{} must be a number, got '{text}'",
                    self.label
                ))),
            },
            FieldKind::Text => Ok(Value::Text(text.to_string())),
        }
    }
}

/// A parsed answer
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
    Text(String),
}

/// Answers collected for one operation, in field order
///
/// Optional fields left empty are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<(&'static str, Option<Value>)>,
}

impl Record {
    fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| *n == name).and_then(|(_, v)| v.as_ref())
    }

    #[must_use]
    pub fn int(&self, name: &str) -> Option<i32> {
        match self.get(name) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Float(v)) => Some(*v),
            Some(Value::Int(v)) => Some(f64::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn require_int(&self, name: &str) -> Result<i32> {
        self.int(name).ok_or_else(|| WorkforceError::missing_input(name))
    }

    pub fn require_float(&self, name: &str) -> Result<f64> {
        self.float(name).ok_or_else(|| WorkforceError::missing_input(name))
    }

    pub fn require_text(&self, name: &str) -> Result<&str> {
        self.text(name).ok_or_else(|| WorkforceError::missing_input(name))
    }
}

/// Source of operator answers
pub trait Prompter {
    /// Ask for one line of input, returned without surrounding whitespace
    fn ask(&mut self, label: &str) -> Result<String>;

    /// Show a projected result and ask whether to apply it
    fn confirm(&mut self, preview: &str) -> Result<bool>;
}

/// Ask every field in order and parse the answers
///
/// Stops at the first missing required field or unparsable value.
pub fn collect<P: Prompter + ?Sized>(prompter: &mut P, fields: &[Field]) -> Result<Record> {
    let mut record = Record::default();

    for field in fields {
        let label = if field.required {
            field.label.to_string()
        } else {
            format!("{} (optional)", field.label)
        };
        let answer = prompter.ask(&label)?;

        let value = if answer.is_empty() {
            if field.required {
                return Err(WorkforceError::missing_input(field.label));
            }
            None
        } else {
            Some(field.parse(&answer)?)
        };
        record.values.push((field.name, value));
    }

    Ok(record)
}

/// Interpret a confirmation answer
///
/// Anything other than an explicit no confirms.
#[must_use]
pub fn parse_confirmation(answer: &str) -> bool {
    let answer = answer.trim();
    !(answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no"))
}

/// Line-oriented prompter over any reader and writer
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Consume the prompter, returning the writer (used by tests to inspect prompts)
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).map_err(io_error)?;
        if read == 0 {
            return Err(WorkforceError::InputClosed);
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.writer, "{label}: ").map_err(io_error)?;
        self.writer.flush().map_err(io_error)?;
        self.read_line()
    }

    fn confirm(&mut self, preview: &str) -> Result<bool> {
        writeln!(self.writer, "RESULT: {preview}").map_err(io_error)?;
        write!(self.writer, "Apply changes? [Y/n]: ").map_err(io_error)?;
        self.writer.flush().map_err(io_error)?;
        Ok(parse_confirmation(&self.read_line()?))
    }
}

/// Interactive prompter for a terminal session
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, label: &str) -> Result<String> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .map_err(terminal_error)?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, preview: &str) -> Result<bool> {
        println!("RESULT: {preview}");
        Confirm::with_theme(&self.theme)
            .with_prompt("Apply changes?")
            .default(true)
            .interact()
            .map_err(terminal_error)
    }
}

/// Prompter for the process's standard input
#[must_use]
pub fn stdin_prompter() -> Box<dyn Prompter> {
    if io::stdin().is_terminal() {
        Box::new(TerminalPrompter::default())
    } else {
        tracing::debug!("stdin is not a terminal, reading answers line by line");
        Box::new(LinePrompter::new(io::stdin().lock(), io::stdout()))
    }
}

fn io_error(e: io::Error) -> WorkforceError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        WorkforceError::InputClosed
    } else {
        WorkforceError::prompt_failed(e.to_string())
    }
}

fn terminal_error(e: dialoguer::Error) -> WorkforceError {
    match e {
        dialoguer::Error::IO(e) => io_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const FIELDS: &[Field] = &[
        Field::required("id", "Employee id", FieldKind::Int),
        Field::optional("commission", "Commission", FieldKind::Float),
        Field::required("name", "Name", FieldKind::Text),
    ];

    fn prompter(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_collect_all_fields() {
        let mut p = prompter("7\n12.5\n  Ana Pérez \n");
        let record = collect(&mut p, FIELDS).unwrap();

        assert_eq!(record.int("id"), Some(7));
        assert_eq!(record.float("commission"), Some(12.5));
        assert_eq!(record.text("name"), Some("Ana Pérez"));

        let prompts = String::from_utf8(p.into_writer()).unwrap();
        assert_eq!(prompts, "Employee id: Commission (optional): Name: ");
    }

    #[test]
    fn test_empty_optional_field_is_none() {
        let mut p = prompter("7\n\nAna\n");
        let record = collect(&mut p, FIELDS).unwrap();
        assert_eq!(record.float("commission"), None);
        assert_eq!(record.require_text("name").unwrap(), "Ana");
    }

    #[test]
    fn test_missing_required_field_stops_prompting() {
        let mut p = prompter("\n12.5\nAna\n");
        let err = collect(&mut p, FIELDS).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_INPUT");
        assert_eq!(err.message(), "Employee id is required");

        let prompts = String::from_utf8(p.into_writer()).unwrap();
        assert_eq!(prompts, "Employee id: ");
    }

    #[test]
    fn test_invalid_number() {
        let mut p = prompter("seven\n");
        let err = collect(&mut p, FIELDS).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.message().contains("'seven'"));

        let mut p = prompter("7\nNaN\n");
        let err = collect(&mut p, FIELDS).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_end_of_input() {
        let mut p = prompter("7\n");
        let err = collect(&mut p, FIELDS).unwrap_err();
        assert!(matches!(err, WorkforceError::InputClosed));
    }

    #[test]
    fn test_parse_confirmation() {
        assert!(parse_confirmation(""));
        assert!(parse_confirmation("y"));
        assert!(parse_confirmation("S"));
        assert!(parse_confirmation("whatever"));
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("N"));
        assert!(!parse_confirmation(" No "));
    }

    #[test]
    fn test_line_confirm_shows_preview() {
        let mut p = prompter("n\n");
        assert!(!p.confirm("[id: 7, name: Ana]").unwrap());

        let output = String::from_utf8(p.into_writer()).unwrap();
        assert_eq!(output, "RESULT: [id: 7, name: Ana]\nApply changes? [Y/n]: ");
    }

    #[test]
    fn test_require_on_absent_value() {
        let record = Record::default();
        assert_eq!(record.require_int("id").unwrap_err().error_code(), "MISSING_INPUT");
    }
}
