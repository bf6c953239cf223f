//! `PostgreSQL` Store Implementation
//!
//! This module implements the `Store` trait for `PostgreSQL` databases.
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - One client per session; the connection task is spawned on the runtime
//! - Isolation is chosen per transaction with `BEGIN ISOLATION LEVEL ...`
//! - Money columns are read and bound as `float8` so `numeric` schemas work too
//! - Server error codes (SQLSTATE) are classified into `Violation`s

use tokio_postgres::error::SqlState;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::{Client, Config, NoTls, Row};

use crate::engine::{
    AssignmentRow, ConnectionConfig, DatabaseType, Department, Employee, Isolation, Key, Project,
    SalaryRow, Store, Summary,
};
use crate::error::{Result, Violation, WorkforceError};

const SELECT_EMPLOYEE: &str = "
    SELECT id, nombre, trabajo, fecha_contratacion, salario::float8, comision::float8,
           id_jefe, id_departamento
    FROM empleado
    WHERE id = $1";

const SELECT_DEPARTMENT: &str =
    "SELECT id, nombre, localidad, id_director FROM departamento WHERE id = $1";

const SELECT_PROJECT: &str = "SELECT id, nombre, localidad FROM proyecto WHERE id = $1";

const SELECT_PAID_OVER: &str = "
    SELECT id, nombre, salario::float8
    FROM empleado
    WHERE salario > $1::float8
    ORDER BY id";

const SELECT_DEPARTMENTS_AT: &str =
    "SELECT id, nombre FROM departamento WHERE localidad = $1 ORDER BY id";

const SELECT_PROJECTS_AT: &str = "SELECT id, nombre FROM proyecto WHERE localidad = $1 ORDER BY id";

const SELECT_PROJECTS_OF: &str = "
    SELECT EmpleadoProyecto.id_proyecto, proyecto.nombre, EmpleadoProyecto.horas
    FROM EmpleadoProyecto
    LEFT JOIN proyecto ON EmpleadoProyecto.id_proyecto = proyecto.id
    WHERE EmpleadoProyecto.id_empleado = $1
    ORDER BY EmpleadoProyecto.id_proyecto";

const SELECT_DEPARTMENTS_IN_PROJECT: &str = "
    SELECT DepartamentoProyecto.id_departamento, departamento.nombre
    FROM DepartamentoProyecto
    LEFT JOIN departamento ON DepartamentoProyecto.id_departamento = departamento.id
    WHERE DepartamentoProyecto.id_proyecto = $1
    ORDER BY DepartamentoProyecto.id_departamento";

const SELECT_DIRECTED_BY: &str =
    "SELECT id, nombre FROM departamento WHERE id_director = $1 ORDER BY id";

const SELECT_HOURS: &str =
    "SELECT horas FROM EmpleadoProyecto WHERE id_empleado = $1 AND id_proyecto = $2";

const INSERT_EMPLOYEE: &str = "
    INSERT INTO empleado(id, nombre, trabajo, fecha_contratacion, salario, comision, id_jefe, id_departamento)
    VALUES ($1, $2, $3, $4, $5::float8, $6::float8, $7, $8)";

const INSERT_DEPARTMENT: &str =
    "INSERT INTO departamento(id, nombre, localidad, id_director) VALUES ($1, $2, $3, $4)";

const INSERT_PROJECT: &str = "INSERT INTO proyecto(id, nombre, localidad) VALUES ($1, $2, $3)";

const INSERT_ASSIGNMENT: &str =
    "INSERT INTO EmpleadoProyecto(id_empleado, id_proyecto, horas) VALUES ($1, $2, $3)";

const INSERT_PARTICIPATION: &str =
    "INSERT INTO DepartamentoProyecto(id_departamento, id_proyecto) VALUES ($1, $2)";

const UPDATE_SALARY: &str =
    "UPDATE empleado SET salario = salario + salario * $1::float8 / 100 WHERE id = $2";

const UPDATE_COMMISSION: &str = "UPDATE empleado SET comision = $1::float8 WHERE id = $2";

const UPDATE_DIRECTOR: &str = "UPDATE departamento SET id_director = $1 WHERE id = $2";

const UPDATE_HOURS: &str = "
    UPDATE EmpleadoProyecto SET horas = horas + $1
    WHERE id_empleado = $2 AND id_proyecto = $3";

const DELETE_EMPLOYEE: &str = "DELETE FROM empleado WHERE id = $1";

const DELETE_DEPARTMENTS_LIKE: &str = "DELETE FROM departamento WHERE nombre LIKE $1";

const DELETE_PROJECTS_AT: &str = "DELETE FROM proyecto WHERE localidad LIKE $1";

const DELETE_ASSIGNMENT: &str =
    "DELETE FROM EmpleadoProyecto WHERE id_empleado = $1 AND id_proyecto = $2";

/// `PostgreSQL` store over a single session-long client
pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connect using the given configuration
    ///
    /// The connection task runs on the current tokio runtime until the store is dropped.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        if config.engine != DatabaseType::Postgres {
            return Err(WorkforceError::connection_failed(format!(
                "Expected PostgreSQL engine, got {}",
                config.engine
            )));
        }

        let pg_config = build_pg_config(config)?;

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            WorkforceError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Note: the error text never contains the password
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection closed with error");
            }
        });

        tracing::info!(target_db = %config.target(), "Connected to PostgreSQL");

        Ok(Self { client })
    }

    /// Borrow the underlying client
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    async fn fetch_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Option<Row>> {
        tracing::debug!(sql = sql.trim(), "query");
        self.client.query_opt(sql, params).await.map_err(pg_error)
    }

    async fn fetch(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        tracing::debug!(sql = sql.trim(), "query");
        self.client.query(sql, params).await.map_err(pg_error)
    }

    async fn run(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        tracing::debug!(sql = sql.trim(), "execute");
        self.client.execute(sql, params).await.map_err(pg_error)
    }

    async fn summaries(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Summary>> {
        self.fetch(sql, params)
            .await?
            .iter()
            .map(|row| Ok(Summary { id: column(row, 0)?, name: column(row, 1)? }))
            .collect()
    }
}

impl Store for PostgresStore {
    fn engine(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn begin(&mut self, isolation: Isolation) -> Result<()> {
        let sql = format!("BEGIN ISOLATION LEVEL {}", isolation.as_sql());
        tracing::debug!(sql = %sql, "transaction");
        self.client.batch_execute(&sql).await.map_err(pg_error)
    }

    async fn commit(&mut self) -> Result<()> {
        tracing::debug!("COMMIT");
        self.client.batch_execute("COMMIT").await.map_err(pg_error)
    }

    async fn rollback(&mut self) -> Result<()> {
        tracing::debug!("ROLLBACK");
        self.client.batch_execute("ROLLBACK").await.map_err(pg_error)
    }

    async fn exists(&mut self, key: Key) -> Result<bool> {
        let row = match key {
            Key::Employee(id) => {
                self.fetch_opt("SELECT 1 FROM empleado WHERE id = $1", &[&id]).await?
            }
            Key::Department(id) => {
                self.fetch_opt("SELECT 1 FROM departamento WHERE id = $1", &[&id]).await?
            }
            Key::Project(id) => {
                self.fetch_opt("SELECT 1 FROM proyecto WHERE id = $1", &[&id]).await?
            }
            Key::Assignment { employee, project } => {
                self.fetch_opt(
                    "SELECT 1 FROM EmpleadoProyecto WHERE id_empleado = $1 AND id_proyecto = $2",
                    &[&employee, &project],
                )
                .await?
            }
            Key::Participation { department, project } => {
                self.fetch_opt(
                    "SELECT 1 FROM DepartamentoProyecto WHERE id_departamento = $1 AND id_proyecto = $2",
                    &[&department, &project],
                )
                .await?
            }
        };
        Ok(row.is_some())
    }

    async fn employee(&mut self, id: i32) -> Result<Option<Employee>> {
        let Some(row) = self.fetch_opt(SELECT_EMPLOYEE, &[&id]).await? else {
            return Ok(None);
        };
        Ok(Some(Employee {
            id: column(&row, 0)?,
            name: column(&row, 1)?,
            job: column(&row, 2)?,
            hire_date: column(&row, 3)?,
            salary: column(&row, 4)?,
            commission: column(&row, 5)?,
            manager_id: column(&row, 6)?,
            department_id: column(&row, 7)?,
        }))
    }

    async fn department(&mut self, id: i32) -> Result<Option<Department>> {
        let Some(row) = self.fetch_opt(SELECT_DEPARTMENT, &[&id]).await? else {
            return Ok(None);
        };
        Ok(Some(Department {
            id: column(&row, 0)?,
            name: column(&row, 1)?,
            location: column(&row, 2)?,
            director_id: column(&row, 3)?,
        }))
    }

    async fn project(&mut self, id: i32) -> Result<Option<Project>> {
        let Some(row) = self.fetch_opt(SELECT_PROJECT, &[&id]).await? else {
            return Ok(None);
        };
        Ok(Some(Project {
            id: column(&row, 0)?,
            name: column(&row, 1)?,
            location: column(&row, 2)?,
        }))
    }

    async fn employees_paid_over(&mut self, salary: f64) -> Result<Vec<SalaryRow>> {
        self.fetch(SELECT_PAID_OVER, &[&salary])
            .await?
            .iter()
            .map(|row| {
                Ok(SalaryRow { id: column(row, 0)?, name: column(row, 1)?, salary: column(row, 2)? })
            })
            .collect()
    }

    async fn departments_at(&mut self, location: &str) -> Result<Vec<Summary>> {
        self.summaries(SELECT_DEPARTMENTS_AT, &[&location]).await
    }

    async fn projects_at(&mut self, location: &str) -> Result<Vec<Summary>> {
        self.summaries(SELECT_PROJECTS_AT, &[&location]).await
    }

    async fn projects_of(&mut self, employee: i32) -> Result<Vec<AssignmentRow>> {
        self.fetch(SELECT_PROJECTS_OF, &[&employee])
            .await?
            .iter()
            .map(|row| {
                Ok(AssignmentRow {
                    project_id: column(row, 0)?,
                    project_name: column(row, 1)?,
                    hours: column(row, 2)?,
                })
            })
            .collect()
    }

    async fn departments_in_project(&mut self, project: i32) -> Result<Vec<Summary>> {
        self.summaries(SELECT_DEPARTMENTS_IN_PROJECT, &[&project]).await
    }

    async fn departments_directed_by(&mut self, employee: i32) -> Result<Vec<Summary>> {
        self.summaries(SELECT_DIRECTED_BY, &[&employee]).await
    }

    async fn hours(&mut self, employee: i32, project: i32) -> Result<Option<i32>> {
        match self.fetch_opt(SELECT_HOURS, &[&employee, &project]).await? {
            Some(row) => Ok(Some(column(&row, 0)?)),
            None => Ok(None),
        }
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<u64> {
        self.run(
            INSERT_EMPLOYEE,
            &[
                &employee.id,
                &employee.name,
                &employee.job,
                &employee.hire_date,
                &employee.salary,
                &employee.commission,
                &employee.manager_id,
                &employee.department_id,
            ],
        )
        .await
    }

    async fn insert_department(&mut self, department: &Department) -> Result<u64> {
        self.run(
            INSERT_DEPARTMENT,
            &[&department.id, &department.name, &department.location, &department.director_id],
        )
        .await
    }

    async fn insert_project(&mut self, project: &Project) -> Result<u64> {
        self.run(INSERT_PROJECT, &[&project.id, &project.name, &project.location]).await
    }

    async fn insert_assignment(&mut self, employee: i32, project: i32, hours: i32) -> Result<u64> {
        self.run(INSERT_ASSIGNMENT, &[&employee, &project, &hours]).await
    }

    async fn insert_participation(&mut self, department: i32, project: i32) -> Result<u64> {
        self.run(INSERT_PARTICIPATION, &[&department, &project]).await
    }

    async fn raise_salary(&mut self, employee: i32, percentage: f64) -> Result<u64> {
        self.run(UPDATE_SALARY, &[&percentage, &employee]).await
    }

    async fn set_commission(&mut self, employee: i32, commission: Option<f64>) -> Result<u64> {
        self.run(UPDATE_COMMISSION, &[&commission, &employee]).await
    }

    async fn set_director(&mut self, department: i32, employee: i32) -> Result<u64> {
        self.run(UPDATE_DIRECTOR, &[&employee, &department]).await
    }

    async fn add_hours(&mut self, employee: i32, project: i32, hours: i32) -> Result<u64> {
        self.run(UPDATE_HOURS, &[&hours, &employee, &project]).await
    }

    async fn delete_employee(&mut self, id: i32) -> Result<u64> {
        self.run(DELETE_EMPLOYEE, &[&id]).await
    }

    async fn delete_departments_named_like(&mut self, keyword: &str) -> Result<u64> {
        let pattern = format!("%{keyword}%");
        self.run(DELETE_DEPARTMENTS_LIKE, &[&pattern]).await
    }

    async fn delete_projects_at(&mut self, pattern: &str) -> Result<u64> {
        self.run(DELETE_PROJECTS_AT, &[&pattern]).await
    }

    async fn delete_assignment(&mut self, employee: i32, project: i32) -> Result<u64> {
        self.run(DELETE_ASSIGNMENT, &[&employee, &project]).await
    }
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Result<Config> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| WorkforceError::config_error("PostgreSQL requires 'host' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| WorkforceError::config_error("PostgreSQL requires 'user' parameter"))?;

    let database = config.database.as_ref().ok_or_else(|| {
        WorkforceError::config_error("PostgreSQL requires 'dbname' (or 'database') parameter")
    })?;

    let mut pg_config = Config::new();
    pg_config.host(host).port(config.port.unwrap_or(5432)).user(user).dbname(database);

    // Password may legitimately be absent (trust or peer authentication)
    if let Some(password) = &config.password {
        pg_config.password(password);
    }

    Ok(pg_config)
}

/// Read one column, turning type mismatches into errors instead of panics
fn column<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<T> {
    row.try_get(idx).map_err(|e| {
        WorkforceError::database(None, None, format!("Failed to read column {idx}: {e}"))
    })
}

/// Classify a driver error by its SQLSTATE
fn pg_error(e: tokio_postgres::Error) -> WorkforceError {
    let Some(db) = e.as_db_error() else {
        return WorkforceError::database(None, None, e.to_string());
    };
    WorkforceError::database(
        Some(db.code().code().to_string()),
        classify(db.code()),
        db.message().to_string(),
    )
}

fn classify(code: &SqlState) -> Option<Violation> {
    if *code == SqlState::UNIQUE_VIOLATION {
        Some(Violation::Unique)
    } else if *code == SqlState::CHECK_VIOLATION {
        Some(Violation::Check)
    } else if *code == SqlState::FOREIGN_KEY_VIOLATION {
        Some(Violation::ForeignKey)
    } else {
        None
    }
}
