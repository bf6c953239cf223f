//! workforce CLI Entry Point
//!
//! Resolves the connection from the configuration file, connects, and runs the
//! interactive menu until the operator quits.
//!
//! Menu and reports go to stdout. Logs go to stderr.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;

use workforce::logging::{init_logging, LoggingConfig};
use workforce::output::{ErrorEnvelope, OutputFormat};
use workforce::{menu, prompt, resolve_connection, DatabaseType, Session, Store, WorkforceError};

/// workforce - Staffing database console
#[derive(Parser)]
#[command(name = "workforce")]
#[command(about = "Menu-driven console for the employees, departments and projects database")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./dbconfig.json, then the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Named connection within the configuration file
    #[arg(long, value_name = "NAME")]
    connection: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&LoggingConfig { debug: cli.debug }) {
        eprintln!("Warning: could not initialize logging: {err}");
    }

    let format = cli.output;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Session ended with an error");
            match (format, err.downcast_ref::<WorkforceError>()) {
                (OutputFormat::Json, Some(workforce_err)) => {
                    let envelope = ErrorEnvelope::from_error("", "connect", workforce_err);
                    match serde_json::to_string(&envelope) {
                        Ok(json) => println!("{json}"),
                        Err(_) => println!("[✗] {}", workforce_err.message()),
                    }
                }
                _ => println!("[✗] {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let resolved = resolve_connection(cli.config.as_deref(), cli.connection.as_deref())?;
    let session = Session { connection: resolved.name.clone(), readonly: resolved.readonly };

    println!("Connecting to {}...", resolved.config.target());

    match resolved.config.engine {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => {
            let store = workforce::PostgresStore::connect(&resolved.config)
                .await
                .context("Unable to connect")?;
            serve(store, &session, cli.output).await
        }
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => {
            let store =
                workforce::SqliteStore::open(&resolved.config).context("Unable to connect")?;
            serve(store, &session, cli.output).await
        }
        #[allow(unreachable_patterns)]
        other => Err(anyhow!("Engine '{other}' is not enabled in this build")),
    }
}

async fn serve<S: Store>(mut store: S, session: &Session, format: OutputFormat) -> anyhow::Result<()> {
    println!("[✓] Connected.");
    if session.readonly {
        println!("Connection '{}' is read-only: only queries (1-9) are available.", session.connection);
    }

    let mut prompter = prompt::stdin_prompter();
    let mut stdout = io::stdout();
    menu::run_menu(&mut store, prompter.as_mut(), &mut stdout, session, format).await?;

    drop(store);
    println!("[✓] Connection closed.");
    Ok(())
}
