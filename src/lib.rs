//! workforce - Staffing Database Console
//!
//! An interactive, menu-driven front-end for a relational schema of employees,
//! departments, projects, staffing assignments and department participation.
//! The operator queries, inserts, updates and deletes rows through a numbered
//! menu; every operation runs in one short transaction that is committed or
//! rolled back before the menu returns.
//!
//! # Core Principles
//! - The database enforces constraints; the program checks references before writing
//! - Missing input is reported before any database access
//! - Pure reads run at read committed, everything that writes at serializable
//! - Constraint violations become operator messages, never panics
//!
//! # Module Organization
//! - [`error`] - Error types and stable error codes
//! - [`engine`] - Store trait, row types and the `PostgreSQL`/`SQLite` stores
//! - [`config`] - Configuration file discovery and named connections
//! - [`prompt`] - Field schemas and operator prompters
//! - [`operations`] - The 22 menu operations and the transaction runner
//! - [`output`] - Reports, text rendering and JSON envelopes
//! - [`menu`] - The interactive menu loop
//! - [`logging`] - Tracing subscriber setup

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod menu;
pub mod operations;
pub mod output;
pub mod prompt;

pub use config::{resolve_connection, ConfigFile, ConnectionRegistry, ResolvedConnection, StoredConnection};
pub use engine::{
    AssignmentRow, ConnectionConfig, DatabaseType, Department, Employee, Isolation, Key, Project,
    SalaryRow, Store, Summary,
};
pub use error::{Result, Violation, WorkforceError};
pub use operations::{Disposition, Operation, Session};
pub use output::{ErrorEnvelope, ErrorInfo, Line, OutputFormat, Report, SuccessEnvelope};
pub use prompt::{Field, FieldKind, LinePrompter, Prompter, Record, TerminalPrompter};

#[cfg(feature = "postgres")]
pub use engine::postgres::PostgresStore;
#[cfg(feature = "sqlite")]
pub use engine::sqlite::SqliteStore;
