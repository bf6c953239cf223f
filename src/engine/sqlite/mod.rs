//! `SQLite` Store Implementation
//!
//! This module implements the `Store` trait for `SQLite` databases holding the
//! same staffing schema as the `PostgreSQL` deployment.
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver, no async needed)
//! - Foreign key enforcement is switched on when the store is opened
//! - `SQLite` transactions are always serializable; read committed maps to
//!   `BEGIN DEFERRED` and serializable to `BEGIN IMMEDIATE` (takes the write lock up front)
//! - Extended result codes are classified into `Violation`s

use rusqlite::{ffi, params, Connection, OpenFlags, OptionalExtension, Params, Row};

use crate::engine::{
    AssignmentRow, ConnectionConfig, DatabaseType, Department, Employee, Isolation, Key, Project,
    SalaryRow, Store, Summary,
};
use crate::error::{Result, Violation, WorkforceError};

/// `SQLite` store over a single connection
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database file named in the configuration
    ///
    /// The file must already exist and contain the schema.
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        if config.engine != DatabaseType::SQLite {
            return Err(WorkforceError::connection_failed(format!(
                "Expected SQLite engine, got {}",
                config.engine
            )));
        }

        let file_path = config
            .file
            .as_ref()
            .ok_or_else(|| WorkforceError::config_error("SQLite requires 'file' parameter"))?;

        let conn = Connection::open_with_flags(file_path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| {
                WorkforceError::connection_failed(format!("Failed to open SQLite database: {e}"))
            })?;

        tracing::info!(target_db = %config.target(), "Opened SQLite database");

        Self::from_connection(conn)
    }

    /// Wrap an already open connection (used for in-memory databases)
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true).map_err(|e| {
            WorkforceError::connection_failed(format!("Failed to enable foreign keys: {e}"))
        })?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn run<P: Params>(&self, sql: &str, params: P) -> Result<u64> {
        tracing::debug!(sql = sql.trim(), "execute");
        let changed = self.conn.prepare_cached(sql).and_then(|mut s| s.execute(params));
        changed.map(|n| n as u64).map_err(sqlite_error)
    }

    fn fetch_opt<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        tracing::debug!(sql = sql.trim(), "query");
        self.conn.query_row(sql, params, map).optional().map_err(sqlite_error)
    }

    fn fetch<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        tracing::debug!(sql = sql.trim(), "query");
        let mut stmt = self.conn.prepare_cached(sql).map_err(sqlite_error)?;
        let rows = stmt.query_map(params, map).map_err(sqlite_error)?;
        let collected = rows.collect::<rusqlite::Result<Vec<T>>>();
        collected.map_err(sqlite_error)
    }

    fn summaries<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Summary>> {
        self.fetch(sql, params, |row| Ok(Summary { id: row.get(0)?, name: row.get(1)? }))
    }

    fn batch(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "transaction");
        self.conn.execute_batch(sql).map_err(sqlite_error)
    }
}

impl Store for SqliteStore {
    fn engine(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn begin(&mut self, isolation: Isolation) -> Result<()> {
        match isolation {
            Isolation::ReadCommitted => self.batch("BEGIN DEFERRED"),
            Isolation::Serializable => self.batch("BEGIN IMMEDIATE"),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        self.batch("COMMIT")
    }

    async fn rollback(&mut self) -> Result<()> {
        self.batch("ROLLBACK")
    }

    async fn exists(&mut self, key: Key) -> Result<bool> {
        let found = match key {
            Key::Employee(id) => {
                self.fetch_opt("SELECT 1 FROM empleado WHERE id = ?1", [id], |_| Ok(()))?
            }
            Key::Department(id) => {
                self.fetch_opt("SELECT 1 FROM departamento WHERE id = ?1", [id], |_| Ok(()))?
            }
            Key::Project(id) => {
                self.fetch_opt("SELECT 1 FROM proyecto WHERE id = ?1", [id], |_| Ok(()))?
            }
            Key::Assignment { employee, project } => self.fetch_opt(
                "SELECT 1 FROM EmpleadoProyecto WHERE id_empleado = ?1 AND id_proyecto = ?2",
                [employee, project],
                |_| Ok(()),
            )?,
            Key::Participation { department, project } => self.fetch_opt(
                "SELECT 1 FROM DepartamentoProyecto WHERE id_departamento = ?1 AND id_proyecto = ?2",
                [department, project],
                |_| Ok(()),
            )?,
        };
        Ok(found.is_some())
    }

    async fn employee(&mut self, id: i32) -> Result<Option<Employee>> {
        self.fetch_opt(
            "SELECT id, nombre, trabajo, fecha_contratacion, salario, comision, id_jefe, id_departamento
             FROM empleado WHERE id = ?1",
            [id],
            |row| {
                Ok(Employee {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    job: row.get(2)?,
                    hire_date: row.get(3)?,
                    salary: row.get(4)?,
                    commission: row.get(5)?,
                    manager_id: row.get(6)?,
                    department_id: row.get(7)?,
                })
            },
        )
    }

    async fn department(&mut self, id: i32) -> Result<Option<Department>> {
        self.fetch_opt(
            "SELECT id, nombre, localidad, id_director FROM departamento WHERE id = ?1",
            [id],
            |row| {
                Ok(Department {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    location: row.get(2)?,
                    director_id: row.get(3)?,
                })
            },
        )
    }

    async fn project(&mut self, id: i32) -> Result<Option<Project>> {
        self.fetch_opt("SELECT id, nombre, localidad FROM proyecto WHERE id = ?1", [id], |row| {
            Ok(Project { id: row.get(0)?, name: row.get(1)?, location: row.get(2)? })
        })
    }

    async fn employees_paid_over(&mut self, salary: f64) -> Result<Vec<SalaryRow>> {
        self.fetch(
            "SELECT id, nombre, salario FROM empleado WHERE salario > ?1 ORDER BY id",
            [salary],
            |row| Ok(SalaryRow { id: row.get(0)?, name: row.get(1)?, salary: row.get(2)? }),
        )
    }

    async fn departments_at(&mut self, location: &str) -> Result<Vec<Summary>> {
        self.summaries("SELECT id, nombre FROM departamento WHERE localidad = ?1 ORDER BY id", [location])
    }

    async fn projects_at(&mut self, location: &str) -> Result<Vec<Summary>> {
        self.summaries("SELECT id, nombre FROM proyecto WHERE localidad = ?1 ORDER BY id", [location])
    }

    async fn projects_of(&mut self, employee: i32) -> Result<Vec<AssignmentRow>> {
        self.fetch(
            "SELECT EmpleadoProyecto.id_proyecto, proyecto.nombre, EmpleadoProyecto.horas
             FROM EmpleadoProyecto
             LEFT JOIN proyecto ON EmpleadoProyecto.id_proyecto = proyecto.id
             WHERE EmpleadoProyecto.id_empleado = ?1
             ORDER BY EmpleadoProyecto.id_proyecto",
            [employee],
            |row| {
                Ok(AssignmentRow {
                    project_id: row.get(0)?,
                    project_name: row.get(1)?,
                    hours: row.get(2)?,
                })
            },
        )
    }

    async fn departments_in_project(&mut self, project: i32) -> Result<Vec<Summary>> {
        self.summaries(
            "SELECT DepartamentoProyecto.id_departamento, departamento.nombre
             FROM DepartamentoProyecto
             LEFT JOIN departamento ON DepartamentoProyecto.id_departamento = departamento.id
             WHERE DepartamentoProyecto.id_proyecto = ?1
             ORDER BY DepartamentoProyecto.id_departamento",
            [project],
        )
    }

    async fn departments_directed_by(&mut self, employee: i32) -> Result<Vec<Summary>> {
        self.summaries(
            "SELECT id, nombre FROM departamento WHERE id_director = ?1 ORDER BY id",
            [employee],
        )
    }

    async fn hours(&mut self, employee: i32, project: i32) -> Result<Option<i32>> {
        self.fetch_opt(
            "SELECT horas FROM EmpleadoProyecto WHERE id_empleado = ?1 AND id_proyecto = ?2",
            [employee, project],
            |row| row.get(0),
        )
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<u64> {
        self.run(
            "INSERT INTO empleado(id, nombre, trabajo, fecha_contratacion, salario, comision, id_jefe, id_departamento)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                employee.id,
                employee.name,
                employee.job,
                employee.hire_date,
                employee.salary,
                employee.commission,
                employee.manager_id,
                employee.department_id,
            ],
        )
    }

    async fn insert_department(&mut self, department: &Department) -> Result<u64> {
        self.run(
            "INSERT INTO departamento(id, nombre, localidad, id_director) VALUES (?1, ?2, ?3, ?4)",
            params![department.id, department.name, department.location, department.director_id],
        )
    }

    async fn insert_project(&mut self, project: &Project) -> Result<u64> {
        self.run(
            "INSERT INTO proyecto(id, nombre, localidad) VALUES (?1, ?2, ?3)",
            params![project.id, project.name, project.location],
        )
    }

    async fn insert_assignment(&mut self, employee: i32, project: i32, hours: i32) -> Result<u64> {
        self.run(
            "INSERT INTO EmpleadoProyecto(id_empleado, id_proyecto, horas) VALUES (?1, ?2, ?3)",
            [employee, project, hours],
        )
    }

    async fn insert_participation(&mut self, department: i32, project: i32) -> Result<u64> {
        self.run(
            "INSERT INTO DepartamentoProyecto(id_departamento, id_proyecto) VALUES (?1, ?2)",
            [department, project],
        )
    }

    async fn raise_salary(&mut self, employee: i32, percentage: f64) -> Result<u64> {
        self.run(
            "UPDATE empleado SET salario = salario + salario * ?1 / 100 WHERE id = ?2",
            params![percentage, employee],
        )
    }

    async fn set_commission(&mut self, employee: i32, commission: Option<f64>) -> Result<u64> {
        self.run("UPDATE empleado SET comision = ?1 WHERE id = ?2", params![commission, employee])
    }

    async fn set_director(&mut self, department: i32, employee: i32) -> Result<u64> {
        self.run("UPDATE departamento SET id_director = ?1 WHERE id = ?2", [employee, department])
    }

    async fn add_hours(&mut self, employee: i32, project: i32, hours: i32) -> Result<u64> {
        self.run(
            "UPDATE EmpleadoProyecto SET horas = horas + ?1 WHERE id_empleado = ?2 AND id_proyecto = ?3",
            [hours, employee, project],
        )
    }

    async fn delete_employee(&mut self, id: i32) -> Result<u64> {
        self.run("DELETE FROM empleado WHERE id = ?1", [id])
    }

    async fn delete_departments_named_like(&mut self, keyword: &str) -> Result<u64> {
        self.run("DELETE FROM departamento WHERE nombre LIKE ?1", [format!("%{keyword}%")])
    }

    async fn delete_projects_at(&mut self, pattern: &str) -> Result<u64> {
        self.run("DELETE FROM proyecto WHERE localidad LIKE ?1", [pattern])
    }

    async fn delete_assignment(&mut self, employee: i32, project: i32) -> Result<u64> {
        self.run(
            "DELETE FROM EmpleadoProyecto WHERE id_empleado = ?1 AND id_proyecto = ?2",
            [employee, project],
        )
    }
}

/// Classify a driver error by its extended result code
fn sqlite_error(e: rusqlite::Error) -> WorkforceError {
    let rusqlite::Error::SqliteFailure(failure, message) = &e else {
        return WorkforceError::database(None, None, e.to_string());
    };
    let violation = match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => Some(Violation::Unique),
        ffi::SQLITE_CONSTRAINT_CHECK => Some(Violation::Check),
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
        _ => None,
    };
    WorkforceError::database(
        Some(failure.extended_code.to_string()),
        violation,
        message.clone().unwrap_or_else(|| failure.to_string()),
    )
}
