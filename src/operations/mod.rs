//! Menu Operations
//!
//! The 22 numbered menu entries and the runner that executes them.
//!
//! Every operation is described by an [`Operation`] value: its menu key, the
//! fields it asks for, the isolation level it runs at, and whether it mutates.
//! [`run`] drives one operation end to end:
//!
//! 1. refuse mutations on a read-only connection
//! 2. collect the operator's answers (no database access yet)
//! 3. open a transaction at the operation's isolation level
//! 4. execute, then commit or roll back according to the outcome
//!
//! Any failure after step 3 ends in a rollback, so a failed or declined
//! operation leaves the database as it found it.

mod lookup;
mod mutate;

use std::time::Instant;

use crate::engine::{Isolation, Key, Store};
use crate::error::{Result, WorkforceError};
use crate::output::Report;
use crate::prompt::{self, Field, FieldKind, Prompter, Record};

/// How the transaction of an operation ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Commit,
    Rollback,
}

/// Connection-level settings that apply to every operation
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Connection name, used in read-only refusals
    pub connection: String,
    pub readonly: bool,
}

/// A menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    EmployeeById,
    DepartmentById,
    ProjectById,
    EmployeesPaidOver,
    DepartmentsAtLocation,
    ProjectsAtLocation,
    ProjectsOfEmployee,
    DepartmentsInProject,
    DepartmentsDirectedBy,
    InsertEmployee,
    InsertDepartment,
    InsertProject,
    RaiseSalary,
    UpdateCommission,
    UpdateDirector,
    AddHours,
    ReplaceEmployee,
    DeleteEmployee,
    DeleteDepartments,
    DeleteProjects,
    AssignEmployee,
    AddParticipation,
}

const EMPLOYEE_ID: Field = Field::required("id", "Employee id", FieldKind::Int);
const DEPARTMENT_ID: Field = Field::required("id", "Department id", FieldKind::Int);
const PROJECT_ID: Field = Field::required("id", "Project id", FieldKind::Int);
const LOCATION: Field = Field::required("location", "Location", FieldKind::Text);

const EMPLOYEE_KEY: &[Field] = &[EMPLOYEE_ID];
const DEPARTMENT_KEY: &[Field] = &[DEPARTMENT_ID];
const PROJECT_KEY: &[Field] = &[PROJECT_ID];
const LOCATION_FILTER: &[Field] = &[LOCATION];
const SALARY_FILTER: &[Field] = &[Field::required("salary", "Salary", FieldKind::Float)];

const NEW_EMPLOYEE: &[Field] = &[
    EMPLOYEE_ID,
    Field::required("name", "Name", FieldKind::Text),
    Field::required("job", "Job", FieldKind::Text),
    Field::required("salary", "Salary", FieldKind::Float),
    Field::optional("commission", "Commission", FieldKind::Float),
    Field::optional("manager", "Manager id", FieldKind::Int),
    Field::optional("department", "Department id", FieldKind::Int),
];
const NEW_DEPARTMENT: &[Field] = &[
    DEPARTMENT_ID,
    Field::required("name", "Name", FieldKind::Text),
    LOCATION,
];
const NEW_PROJECT: &[Field] = &[PROJECT_ID, Field::required("name", "Name", FieldKind::Text), LOCATION];

const SALARY_RAISE: &[Field] =
    &[EMPLOYEE_ID, Field::required("percentage", "Percentage", FieldKind::Float)];
const COMMISSION_CHANGE: &[Field] =
    &[EMPLOYEE_ID, Field::optional("commission", "New commission", FieldKind::Float)];
const DIRECTOR_CHANGE: &[Field] = &[
    Field::required("department", "Department id", FieldKind::Int),
    Field::required("director", "New director id", FieldKind::Int),
];
const HOURS_CHANGE: &[Field] = &[
    Field::required("employee", "Employee id", FieldKind::Int),
    Field::required("project", "Project id", FieldKind::Int),
    Field::required("hours", "Hours to add", FieldKind::Int),
];
const REPLACEMENT: &[Field] = &[
    Field::required("outgoing", "Id of the employee to remove", FieldKind::Int),
    Field::required("incoming", "Id of the replacement employee", FieldKind::Int),
    Field::required("project", "Project id", FieldKind::Int),
];
const KEYWORD: &[Field] = &[Field::required("keyword", "Keyword", FieldKind::Text)];
const ASSIGNMENT: &[Field] = &[
    Field::required("employee", "Employee id", FieldKind::Int),
    Field::required("project", "Project id", FieldKind::Int),
];
const PARTICIPATION: &[Field] = &[
    Field::required("department", "Department id", FieldKind::Int),
    Field::required("project", "Project id", FieldKind::Int),
];

impl Operation {
    /// All operations in menu order
    pub const ALL: [Self; 22] = [
        Self::EmployeeById,
        Self::DepartmentById,
        Self::ProjectById,
        Self::EmployeesPaidOver,
        Self::DepartmentsAtLocation,
        Self::ProjectsAtLocation,
        Self::ProjectsOfEmployee,
        Self::DepartmentsInProject,
        Self::DepartmentsDirectedBy,
        Self::InsertEmployee,
        Self::InsertDepartment,
        Self::InsertProject,
        Self::RaiseSalary,
        Self::UpdateCommission,
        Self::UpdateDirector,
        Self::AddHours,
        Self::ReplaceEmployee,
        Self::DeleteEmployee,
        Self::DeleteDepartments,
        Self::DeleteProjects,
        Self::AssignEmployee,
        Self::AddParticipation,
    ];

    /// Number typed at the menu to select this operation
    #[must_use]
    pub fn menu_key(self) -> usize {
        Self::ALL.iter().position(|op| *op == self).map_or(0, |index| index + 1)
    }

    /// Look up an operation by its menu key
    #[must_use]
    pub fn from_menu_key(key: &str) -> Option<Self> {
        let index = key.trim().parse::<usize>().ok()?;
        index.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    /// Menu text
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::EmployeeById => "Show employee by id",
            Self::DepartmentById => "Show department by id",
            Self::ProjectById => "Show project by id",
            Self::EmployeesPaidOver => "List employees earning more than a salary",
            Self::DepartmentsAtLocation => "List departments at a location",
            Self::ProjectsAtLocation => "List projects at a location",
            Self::ProjectsOfEmployee => "List projects of an employee",
            Self::DepartmentsInProject => "List departments participating in a project",
            Self::DepartmentsDirectedBy => "List departments directed by an employee",
            Self::InsertEmployee => "Insert employee",
            Self::InsertDepartment => "Insert department",
            Self::InsertProject => "Insert project",
            Self::RaiseSalary => "Raise employee salary by a percentage",
            Self::UpdateCommission => "Update employee commission",
            Self::UpdateDirector => "Change department director",
            Self::AddHours => "Add worked hours to an employee on a project",
            Self::ReplaceEmployee => "Replace an employee on a project",
            Self::DeleteEmployee => "Delete employee by id",
            Self::DeleteDepartments => "Delete departments whose name contains a keyword",
            Self::DeleteProjects => "Delete projects by location",
            Self::AssignEmployee => "Assign employee to project",
            Self::AddParticipation => "Add department to project",
        }
    }

    /// Stable command name used in JSON output and logs
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::EmployeeById => "employee-by-id",
            Self::DepartmentById => "department-by-id",
            Self::ProjectById => "project-by-id",
            Self::EmployeesPaidOver => "employees-paid-over",
            Self::DepartmentsAtLocation => "departments-at-location",
            Self::ProjectsAtLocation => "projects-at-location",
            Self::ProjectsOfEmployee => "projects-of-employee",
            Self::DepartmentsInProject => "departments-in-project",
            Self::DepartmentsDirectedBy => "departments-directed-by",
            Self::InsertEmployee => "insert-employee",
            Self::InsertDepartment => "insert-department",
            Self::InsertProject => "insert-project",
            Self::RaiseSalary => "raise-salary",
            Self::UpdateCommission => "update-commission",
            Self::UpdateDirector => "update-director",
            Self::AddHours => "add-hours",
            Self::ReplaceEmployee => "replace-employee",
            Self::DeleteEmployee => "delete-employee",
            Self::DeleteDepartments => "delete-departments",
            Self::DeleteProjects => "delete-projects",
            Self::AssignEmployee => "assign-employee",
            Self::AddParticipation => "add-participation",
        }
    }

    /// Whether the operation writes to the database
    #[must_use]
    pub const fn mutates(self) -> bool {
        !matches!(
            self,
            Self::EmployeeById
                | Self::DepartmentById
                | Self::ProjectById
                | Self::EmployeesPaidOver
                | Self::DepartmentsAtLocation
                | Self::ProjectsAtLocation
                | Self::ProjectsOfEmployee
                | Self::DepartmentsInProject
                | Self::DepartmentsDirectedBy
        )
    }

    /// Read committed for pure reads, serializable for anything that writes
    #[must_use]
    pub const fn isolation(self) -> Isolation {
        if self.mutates() {
            Isolation::Serializable
        } else {
            Isolation::ReadCommitted
        }
    }

    /// Fields asked for, in prompt order
    #[must_use]
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::EmployeeById | Self::ProjectsOfEmployee | Self::DepartmentsDirectedBy => {
                EMPLOYEE_KEY
            }
            Self::DeleteEmployee => EMPLOYEE_KEY,
            Self::DepartmentById => DEPARTMENT_KEY,
            Self::ProjectById | Self::DepartmentsInProject => PROJECT_KEY,
            Self::EmployeesPaidOver => SALARY_FILTER,
            Self::DepartmentsAtLocation | Self::ProjectsAtLocation | Self::DeleteProjects => {
                LOCATION_FILTER
            }
            Self::InsertEmployee => NEW_EMPLOYEE,
            Self::InsertDepartment => NEW_DEPARTMENT,
            Self::InsertProject => NEW_PROJECT,
            Self::RaiseSalary => SALARY_RAISE,
            Self::UpdateCommission => COMMISSION_CHANGE,
            Self::UpdateDirector => DIRECTOR_CHANGE,
            Self::AddHours => HOURS_CHANGE,
            Self::ReplaceEmployee => REPLACEMENT,
            Self::DeleteDepartments => KEYWORD,
            Self::AssignEmployee => ASSIGNMENT,
            Self::AddParticipation => PARTICIPATION,
        }
    }

    /// Validate answers that contradict each other, before any database access
    pub fn check(self, record: &Record) -> Result<()> {
        if self == Self::ReplaceEmployee
            && record.require_int("outgoing")? == record.require_int("incoming")?
        {
            return Err(WorkforceError::conflict("An employee cannot replace themselves"));
        }
        Ok(())
    }

    /// Run the operation's statements inside the open transaction
    pub async fn execute<S, P>(
        self,
        record: &Record,
        store: &mut S,
        prompter: &mut P,
        report: &mut Report,
    ) -> Result<Disposition>
    where
        S: Store,
        P: Prompter + ?Sized,
    {
        match self {
            Self::EmployeeById => lookup::employee_by_id(record, store, report).await,
            Self::DepartmentById => lookup::department_by_id(record, store, report).await,
            Self::ProjectById => lookup::project_by_id(record, store, report).await,
            Self::EmployeesPaidOver => lookup::employees_paid_over(record, store, report).await,
            Self::DepartmentsAtLocation => lookup::departments_at(record, store, report).await,
            Self::ProjectsAtLocation => lookup::projects_at(record, store, report).await,
            Self::ProjectsOfEmployee => lookup::projects_of(record, store, report).await,
            Self::DepartmentsInProject => {
                lookup::departments_in_project(record, store, report).await
            }
            Self::DepartmentsDirectedBy => {
                lookup::departments_directed_by(record, store, report).await
            }
            Self::InsertEmployee => mutate::insert_employee(record, store, report).await,
            Self::InsertDepartment => mutate::insert_department(record, store, report).await,
            Self::InsertProject => mutate::insert_project(record, store, report).await,
            Self::RaiseSalary => mutate::raise_salary(record, store, prompter, report).await,
            Self::UpdateCommission => {
                mutate::update_commission(record, store, prompter, report).await
            }
            Self::UpdateDirector => mutate::update_director(record, store, report).await,
            Self::AddHours => mutate::add_hours(record, store, prompter, report).await,
            Self::ReplaceEmployee => mutate::replace_employee(record, store, report).await,
            Self::DeleteEmployee => mutate::delete_employee(record, store, report).await,
            Self::DeleteDepartments => mutate::delete_departments(record, store, report).await,
            Self::DeleteProjects => mutate::delete_projects(record, store, report).await,
            Self::AssignEmployee => mutate::assign_employee(record, store, report).await,
            Self::AddParticipation => mutate::add_participation(record, store, report).await,
        }
    }
}

/// Run one operation end to end and report what happened
///
/// Never returns an error: failures are recorded in the report. The one
/// exception callers need to see is end of input, which the report carries as
/// an `INPUT_CLOSED` error code.
pub async fn run<S, P>(op: Operation, store: &mut S, prompter: &mut P, session: &Session) -> Report
where
    S: Store,
    P: Prompter + ?Sized,
{
    let started = Instant::now();
    let mut report = Report::new(op.command());

    match perform(op, store, prompter, session, &mut report).await {
        Ok(committed) => report.committed = committed,
        Err(err) => {
            tracing::debug!(command = op.command(), code = err.error_code(), error = %err, "Operation failed");
            report.fail(&err);
        }
    }

    report.execution_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    report
}

/// Returns whether the transaction was committed
async fn perform<S, P>(
    op: Operation,
    store: &mut S,
    prompter: &mut P,
    session: &Session,
    report: &mut Report,
) -> Result<bool>
where
    S: Store,
    P: Prompter + ?Sized,
{
    if session.readonly && op.mutates() {
        return Err(WorkforceError::ReadOnly(session.connection.clone()));
    }

    let record = prompt::collect(prompter, op.fields())?;
    op.check(&record)?;

    tracing::debug!(command = op.command(), isolation = op.isolation().as_sql(), "Begin");
    store.begin(op.isolation()).await?;

    match op.execute(&record, store, prompter, report).await {
        Ok(Disposition::Commit) => match store.commit().await {
            Ok(()) => {
                tracing::debug!(command = op.command(), "Committed");
                Ok(true)
            }
            Err(err) => {
                abandon(store).await;
                Err(err)
            }
        },
        Ok(Disposition::Rollback) => {
            store.rollback().await?;
            tracing::debug!(command = op.command(), "Rolled back");
            Ok(false)
        }
        Err(err) => {
            abandon(store).await;
            Err(err)
        }
    }
}

/// Roll back after a failure; the failure that triggered it is what gets reported
async fn abandon<S: Store>(store: &mut S) {
    if let Err(err) = store.rollback().await {
        tracing::warn!(error = %err, "Rollback failed");
    }
}

/// Fail with `NOT_FOUND` unless the row exists
async fn ensure_exists<S: Store>(store: &mut S, key: Key) -> Result<()> {
    if store.exists(key).await? {
        return Ok(());
    }
    Err(WorkforceError::not_found(match key {
        Key::Employee(id) => format!("Employee {id} does not exist"),
        Key::Department(id) => format!("Department {id} does not exist"),
        Key::Project(id) => format!("Project {id} does not exist"),
        Key::Assignment { employee, project } => {
            format!("Employee {employee} is not assigned to project {project}")
        }
        Key::Participation { department, project } => {
            format!("Department {department} does not participate in project {project}")
        }
    }))
}

/// Fail with `CONFLICT` if the relation already exists
async fn ensure_absent<S: Store>(store: &mut S, key: Key) -> Result<()> {
    if !store.exists(key).await? {
        return Ok(());
    }
    Err(WorkforceError::conflict(match key {
        Key::Assignment { employee, project } => {
            format!("Employee {employee} is already assigned to project {project}")
        }
        Key::Participation { department, project } => {
            format!("Department {department} already participates in project {project}")
        }
        Key::Employee(id) => format!("Employee {id} already exists"),
        Key::Department(id) => format!("Department {id} already exists"),
        Key::Project(id) => format!("Project {id} already exists"),
    }))
}

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn affected(rows: u64) -> usize {
    usize::try_from(rows).unwrap_or(usize::MAX)
}
