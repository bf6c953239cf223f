//! Interactive Menu
//!
//! Shows the numbered menu, reads a choice, runs the matching operation and
//! prints its report, until the operator quits or input ends.

use std::io::Write;

use crate::engine::Store;
use crate::error::{Result, WorkforceError};
use crate::operations::{self, Operation, Session};
use crate::output::{ErrorEnvelope, OutputFormat, Report};
use crate::prompt::Prompter;

/// Menu choice that ends the session
pub const QUIT_KEY: &str = "q";

/// Numbered list of operations followed by the quit entry
#[must_use]
pub fn menu_text() -> String {
    let mut text = String::from("\n==== MENU ====\n");
    for op in Operation::ALL {
        text.push_str(&format!("{:>2}. {}\n", op.menu_key(), op.title()));
    }
    text.push_str(&format!("{QUIT_KEY:>2}. Quit\n"));
    text
}

/// Run the menu loop until `q` or end of input
///
/// Failures, whether from an operation or from reading the menu choice, are
/// printed and the loop continues. Only output errors end the loop early.
pub async fn run_menu<S, P, W>(
    store: &mut S,
    prompter: &mut P,
    out: &mut W,
    session: &Session,
    format: OutputFormat,
) -> Result<()>
where
    S: Store,
    P: Prompter + ?Sized,
    W: Write,
{
    let engine = store.engine().as_str();

    loop {
        write!(out, "{}", menu_text()).map_err(write_error)?;
        out.flush().map_err(write_error)?;

        let choice = match prompter.ask("Option") {
            Ok(choice) => choice,
            Err(WorkforceError::InputClosed) => {
                tracing::info!("Input closed, leaving menu");
                break;
            }
            Err(err) => {
                tracing::debug!(code = err.error_code(), error = %err, "Menu prompt failed");
                print_menu_error(out, engine, &err, format)?;
                continue;
            }
        };

        if choice.eq_ignore_ascii_case(QUIT_KEY) {
            break;
        }

        let Some(op) = Operation::from_menu_key(&choice) else {
            let err = WorkforceError::invalid_input(format!("Unknown option '{choice}'"));
            print_menu_error(out, engine, &err, format)?;
            continue;
        };

        tracing::info!(command = op.command(), "Running operation");
        let report = operations::run(op, store, prompter, session).await;
        print_report(out, &report, engine, format)?;

        if report.error.as_ref().is_some_and(|e| e.code == "INPUT_CLOSED") {
            tracing::info!("Input closed during an operation, leaving menu");
            break;
        }
    }

    Ok(())
}

fn print_report<W: Write>(
    out: &mut W,
    report: &Report,
    engine: &str,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write!(out, "{}", report.render_text()).map_err(write_error),
        OutputFormat::Json => {
            let json = report.render_json(engine).map_err(|e| {
                WorkforceError::prompt_failed(format!("Could not render report: {e}"))
            })?;
            writeln!(out, "{json}").map_err(write_error)
        }
    }
}

/// Print a failure raised by the menu itself, outside any operation
fn print_menu_error<W: Write>(
    out: &mut W,
    engine: &str,
    err: &WorkforceError,
    format: OutputFormat,
) -> Result<()> {
    let written = match format {
        OutputFormat::Text => writeln!(out, "[✗] {}", err.message()),
        OutputFormat::Json => writeln!(out, "{}", envelope_json(engine, err)),
    };
    written.map_err(write_error)
}

fn envelope_json(engine: &str, err: &WorkforceError) -> String {
    serde_json::to_string(&ErrorEnvelope::from_error(engine, "menu", err))
        .unwrap_or_else(|_| format!(r#"{{"ok":false,"error":{{"code":"{}"}}}}"#, err.error_code()))
}

fn write_error(e: std::io::Error) -> WorkforceError {
    WorkforceError::prompt_failed(format!("Could not write output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_lists_every_operation() {
        let text = menu_text();
        assert!(text.contains(" 1. Show employee by id\n"));
        assert!(text.contains("22. Add department to project\n"));
        assert!(text.contains(" q. Quit\n"));
        assert_eq!(text.lines().filter(|l| !l.trim().is_empty()).count(), 24);
    }
}
