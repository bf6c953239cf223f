//! Database Engine Traits and Core Types
//!
//! This module defines the store abstraction the menu operations run against.
//! Each engine (`PostgreSQL`, `SQLite`) implements the `Store` trait over a single
//! session-long connection.
//!
//! # Transactions
//! Operations never manage transactions themselves. `operations::run` calls
//! `begin` with the operation's isolation level and always finishes with exactly
//! one `commit` or `rollback`.
//!
//! # Engine Isolation
//! Each engine implementation is completely independent and owns its SQL text.
//! Both bind to the same external schema (`empleado`, `departamento`, `proyecto`,
//! `EmpleadoProyecto`, `DepartamentoProyecto`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;

use crate::error::Result;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Supported database engine types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[default]
    Postgres,
    /// `SQLite` database
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection configuration for database engines
///
/// Field names follow the libpq/psycopg2 keyword set, so an existing
/// `{"host", "user", "password", "dbname"}` file deserializes unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database engine type (defaults to postgres)
    #[serde(default)]
    pub engine: DatabaseType,

    /// Hostname (for postgres)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port number (for postgres, defaults to 5432)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username (for postgres)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password (for postgres)
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database name (for postgres)
    #[serde(alias = "dbname", skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Database file path (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Create a new `PostgreSQL` connection config
    #[must_use]
    pub const fn postgres(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::Postgres,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub const fn sqlite(file: PathBuf) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            file: Some(file),
        }
    }

    /// Short description of the target, safe to log (never includes credentials)
    #[must_use]
    pub fn target(&self) -> String {
        match self.engine {
            DatabaseType::Postgres => format!(
                "{}@{}:{}/{}",
                self.user.as_deref().unwrap_or("?"),
                self.host.as_deref().unwrap_or("?"),
                self.port.unwrap_or(5432),
                self.database.as_deref().unwrap_or("?"),
            ),
            DatabaseType::SQLite => self
                .file
                .as_ref()
                .map_or_else(|| "?".to_string(), |f| f.display().to_string()),
        }
    }
}

/// Transaction isolation level requested by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Pure reads
    ReadCommitted,
    /// Writes, and reads that decide whether to write
    Serializable,
}

impl Isolation {
    /// SQL spelling of the level
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "READ COMMITTED",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Row identity used by existence pre-checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Employee(i32),
    Department(i32),
    Project(i32),
    /// `EmpleadoProyecto` row
    Assignment { employee: i32, project: i32 },
    /// `DepartamentoProyecto` row
    Participation { department: i32, project: i32 },
}

/// Employee row (`empleado`)
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub job: String,
    pub hire_date: NaiveDate,
    pub salary: f64,
    pub commission: Option<f64>,
    pub manager_id: Option<i32>,
    pub department_id: Option<i32>,
}

/// Department row (`departamento`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub location: String,
    pub director_id: Option<i32>,
}

/// Project row (`proyecto`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub location: String,
}

/// Id and salary of an employee, as listed by salary filters
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRow {
    pub id: i32,
    pub name: String,
    pub salary: f64,
}

/// Id and name of a department or project
///
/// The name is optional because relationship listings left-join the named table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub id: i32,
    pub name: Option<String>,
}

/// A project an employee is assigned to, with the hours worked on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRow {
    pub project_id: i32,
    pub project_name: Option<String>,
    pub hours: i32,
}

/// Session-long connection to the staffing database
///
/// Statement methods run inside the transaction opened by `begin`.
/// Mutating methods return the number of affected rows.
pub trait Store {
    /// Engine behind this store
    fn engine(&self) -> DatabaseType;

    /// Open a transaction at the given isolation level
    fn begin(&mut self, isolation: Isolation) -> impl Future<Output = Result<()>> + Send;

    /// Commit the open transaction
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Roll back the open transaction
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Whether a row with the given key exists
    fn exists(&mut self, key: Key) -> impl Future<Output = Result<bool>> + Send;

    fn employee(&mut self, id: i32) -> impl Future<Output = Result<Option<Employee>>> + Send;

    fn department(&mut self, id: i32) -> impl Future<Output = Result<Option<Department>>> + Send;

    fn project(&mut self, id: i32) -> impl Future<Output = Result<Option<Project>>> + Send;

    /// Employees whose salary is strictly greater than `salary`
    fn employees_paid_over(
        &mut self,
        salary: f64,
    ) -> impl Future<Output = Result<Vec<SalaryRow>>> + Send;

    /// Departments whose location equals `location`
    fn departments_at(&mut self, location: &str)
        -> impl Future<Output = Result<Vec<Summary>>> + Send;

    /// Projects whose location equals `location`
    fn projects_at(&mut self, location: &str) -> impl Future<Output = Result<Vec<Summary>>> + Send;

    /// Assignments of an employee, joined with project names
    fn projects_of(
        &mut self,
        employee: i32,
    ) -> impl Future<Output = Result<Vec<AssignmentRow>>> + Send;

    /// Departments participating in a project, joined with department names
    fn departments_in_project(
        &mut self,
        project: i32,
    ) -> impl Future<Output = Result<Vec<Summary>>> + Send;

    /// Departments whose director is `employee`
    fn departments_directed_by(
        &mut self,
        employee: i32,
    ) -> impl Future<Output = Result<Vec<Summary>>> + Send;

    /// Hours recorded on an assignment, `None` when the assignment does not exist
    fn hours(
        &mut self,
        employee: i32,
        project: i32,
    ) -> impl Future<Output = Result<Option<i32>>> + Send;

    fn insert_employee(&mut self, employee: &Employee)
        -> impl Future<Output = Result<u64>> + Send;

    fn insert_department(
        &mut self,
        department: &Department,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn insert_project(&mut self, project: &Project) -> impl Future<Output = Result<u64>> + Send;

    fn insert_assignment(
        &mut self,
        employee: i32,
        project: i32,
        hours: i32,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn insert_participation(
        &mut self,
        department: i32,
        project: i32,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Increase salary by `percentage` percent
    fn raise_salary(
        &mut self,
        employee: i32,
        percentage: f64,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Set (or clear, with `None`) the commission
    fn set_commission(
        &mut self,
        employee: i32,
        commission: Option<f64>,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn set_director(
        &mut self,
        department: i32,
        employee: i32,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Add `hours` to an assignment's recorded hours
    fn add_hours(
        &mut self,
        employee: i32,
        project: i32,
        hours: i32,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn delete_employee(&mut self, id: i32) -> impl Future<Output = Result<u64>> + Send;

    /// Delete departments whose name contains `keyword`
    fn delete_departments_named_like(
        &mut self,
        keyword: &str,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Delete projects whose location matches the `LIKE` pattern
    fn delete_projects_at(&mut self, pattern: &str) -> impl Future<Output = Result<u64>> + Send;

    fn delete_assignment(
        &mut self,
        employee: i32,
        project: i32,
    ) -> impl Future<Output = Result<u64>> + Send;
}
