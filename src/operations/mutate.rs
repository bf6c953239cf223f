//! Mutating menu operations (keys 10-22)
//!
//! Referenced rows are checked inside the transaction before any write.
//! Constraint violations the operator can act on are turned into specific
//! messages with `WorkforceError::explain`; anything else surfaces as a
//! generic database error. The runner rolls back on every error.

use chrono::Local;

use super::{affected, ensure_absent, ensure_exists, money, or_dash, Disposition};
use crate::engine::{Department, Employee, Key, Project, Store};
use crate::error::{Result, Violation, WorkforceError};
use crate::output::{bracketed, Cell, Report};
use crate::prompt::{Prompter, Record};

pub(super) async fn insert_employee<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;
    let manager_id = record.int("manager");
    let department_id = record.int("department");

    if let Some(manager) = manager_id {
        if !store.exists(Key::Employee(manager)).await? {
            return Err(WorkforceError::not_found(format!(
                "No employee with id {manager} to set as manager"
            )));
        }
    }
    if let Some(department) = department_id {
        ensure_exists(store, Key::Department(department)).await?;
    }

    let employee = Employee {
        id,
        name: record.require_text("name")?.to_string(),
        job: record.require_text("job")?.to_string(),
        hire_date: Local::now().date_naive(),
        salary: record.require_float("salary")?,
        commission: record.float("commission"),
        manager_id,
        department_id,
    };

    let inserted = store.insert_employee(&employee).await.map_err(|e| {
        e.explain(Violation::Unique, || format!("An employee with id {id} already exists"))
            .explain(Violation::Check, || "Salary and commission must be positive".to_string())
    })?;

    report.success(format!("Employee {id} inserted"));
    report.rows = Some(affected(inserted));
    Ok(Disposition::Commit)
}

pub(super) async fn insert_department<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let department = Department {
        id: record.require_int("id")?,
        name: record.require_text("name")?.to_string(),
        location: record.require_text("location")?.to_string(),
        director_id: None,
    };
    let id = department.id;

    let inserted = store.insert_department(&department).await.map_err(|e| {
        e.explain(Violation::Unique, || format!("A department with id {id} already exists"))
    })?;

    report.success(format!("Department {id} inserted"));
    report.rows = Some(affected(inserted));
    Ok(Disposition::Commit)
}

pub(super) async fn insert_project<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let project = Project {
        id: record.require_int("id")?,
        name: record.require_text("name")?.to_string(),
        location: record.require_text("location")?.to_string(),
    };
    let id = project.id;

    let inserted = store.insert_project(&project).await.map_err(|e| {
        e.explain(Violation::Unique, || format!("A project with id {id} already exists"))
    })?;

    report.success(format!("Project {id} inserted"));
    report.rows = Some(affected(inserted));
    Ok(Disposition::Commit)
}

pub(super) async fn raise_salary<S, P>(
    record: &Record,
    store: &mut S,
    prompter: &mut P,
    report: &mut Report,
) -> Result<Disposition>
where
    S: Store,
    P: Prompter + ?Sized,
{
    let id = record.require_int("id")?;
    let percentage = record.require_float("percentage")?;

    let employee = store
        .employee(id)
        .await?
        .ok_or_else(|| WorkforceError::not_found(format!("Employee {id} does not exist")))?;
    let projected = employee.salary + employee.salary * percentage / 100.0;

    let preview = vec![
        Cell::new("id", id),
        Cell::new("name", &employee.name),
        Cell::new("new salary", money(projected)),
    ];
    if !confirmed(prompter, report, preview)? {
        return Ok(Disposition::Rollback);
    }

    let updated = store
        .raise_salary(id, percentage)
        .await
        .map_err(|e| e.explain(Violation::Check, || "Salary must be positive".to_string()))?;

    report.success("Salary updated");
    report.rows = Some(affected(updated));
    Ok(Disposition::Commit)
}

pub(super) async fn update_commission<S, P>(
    record: &Record,
    store: &mut S,
    prompter: &mut P,
    report: &mut Report,
) -> Result<Disposition>
where
    S: Store,
    P: Prompter + ?Sized,
{
    let id = record.require_int("id")?;
    let commission = record.float("commission");

    let employee = store
        .employee(id)
        .await?
        .ok_or_else(|| WorkforceError::not_found(format!("Employee {id} does not exist")))?;

    let preview = vec![
        Cell::new("id", id),
        Cell::new("name", &employee.name),
        Cell::new("new commission", or_dash(commission.map(money))),
    ];
    if !confirmed(prompter, report, preview)? {
        return Ok(Disposition::Rollback);
    }

    let updated = store
        .set_commission(id, commission)
        .await
        .map_err(|e| e.explain(Violation::Check, || "Commission must be positive".to_string()))?;

    report.success("Commission updated");
    report.rows = Some(affected(updated));
    Ok(Disposition::Commit)
}

pub(super) async fn update_director<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let department = record.require_int("department")?;
    let director = record.require_int("director")?;

    ensure_exists(store, Key::Department(department)).await?;
    ensure_exists(store, Key::Employee(director)).await?;

    let updated = store.set_director(department, director).await?;

    report.success(format!("Director updated: employee {director} now directs department {department}"));
    report.rows = Some(affected(updated));
    Ok(Disposition::Commit)
}

pub(super) async fn add_hours<S, P>(
    record: &Record,
    store: &mut S,
    prompter: &mut P,
    report: &mut Report,
) -> Result<Disposition>
where
    S: Store,
    P: Prompter + ?Sized,
{
    let employee = record.require_int("employee")?;
    let project = record.require_int("project")?;
    let hours = record.require_int("hours")?;

    ensure_exists(store, Key::Employee(employee)).await?;
    ensure_exists(store, Key::Project(project)).await?;

    let current = store.hours(employee, project).await?.ok_or_else(|| {
        WorkforceError::not_found(format!(
            "Employee {employee} is not assigned to project {project}"
        ))
    })?;
    let total = current
        .checked_add(hours)
        .ok_or_else(|| WorkforceError::invalid_input(format!("Adding {hours} hours overflows")))?;

    let preview = vec![
        Cell::new("employee id", employee),
        Cell::new("project id", project),
        Cell::new("resulting hours", total),
    ];
    if !confirmed(prompter, report, preview)? {
        return Ok(Disposition::Rollback);
    }

    let updated = store.add_hours(employee, project, hours).await?;

    report.success("Hours updated");
    report.rows = Some(affected(updated));
    Ok(Disposition::Commit)
}

pub(super) async fn replace_employee<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let outgoing = record.require_int("outgoing")?;
    let incoming = record.require_int("incoming")?;
    let project = record.require_int("project")?;

    ensure_exists(store, Key::Employee(outgoing)).await?;
    ensure_exists(store, Key::Employee(incoming)).await?;
    ensure_exists(store, Key::Project(project)).await?;
    ensure_exists(store, Key::Assignment { employee: outgoing, project }).await?;
    ensure_absent(store, Key::Assignment { employee: incoming, project }).await?;

    store.delete_assignment(outgoing, project).await?;
    store.insert_assignment(incoming, project, 0).await?;

    report.success(format!("Employee {outgoing} replaced by employee {incoming} on project {project}"));
    Ok(Disposition::Commit)
}

pub(super) async fn delete_employee<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;

    let deleted = store.delete_employee(id).await.map_err(|e| {
        e.explain(Violation::ForeignKey, || {
            format!("Employee {id} cannot be deleted because they direct a department")
        })
    })?;

    report.success(format!("{deleted} row(s) deleted"));
    report.rows = Some(affected(deleted));
    Ok(Disposition::Commit)
}

pub(super) async fn delete_departments<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let keyword = record.require_text("keyword")?;

    let deleted = store.delete_departments_named_like(keyword).await.map_err(|e| {
        e.explain(Violation::ForeignKey, || {
            format!("Departments whose name contains '{keyword}' are still referenced")
        })
    })?;

    report.success(format!("{deleted} row(s) deleted"));
    report.rows = Some(affected(deleted));
    Ok(Disposition::Commit)
}

pub(super) async fn delete_projects<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let location = record.require_text("location")?;

    let deleted = store.delete_projects_at(location).await?;

    report.success(format!("{deleted} row(s) deleted"));
    report.rows = Some(affected(deleted));
    Ok(Disposition::Commit)
}

pub(super) async fn assign_employee<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let employee = record.require_int("employee")?;
    let project = record.require_int("project")?;

    ensure_exists(store, Key::Employee(employee)).await?;
    ensure_exists(store, Key::Project(project)).await?;
    ensure_absent(store, Key::Assignment { employee, project }).await?;

    let inserted = store.insert_assignment(employee, project, 0).await?;

    report.success("Relation created");
    report.rows = Some(affected(inserted));
    Ok(Disposition::Commit)
}

pub(super) async fn add_participation<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let department = record.require_int("department")?;
    let project = record.require_int("project")?;

    ensure_exists(store, Key::Department(department)).await?;
    ensure_exists(store, Key::Project(project)).await?;
    ensure_absent(store, Key::Participation { department, project }).await?;

    let inserted = store.insert_participation(department, project).await?;

    report.success("Relation created");
    report.rows = Some(affected(inserted));
    Ok(Disposition::Commit)
}

/// Show the projected row and ask the operator; a decline is recorded in the report
fn confirmed<P: Prompter + ?Sized>(
    prompter: &mut P,
    report: &mut Report,
    preview: Vec<Cell>,
) -> Result<bool> {
    let accepted = prompter.confirm(&bracketed(&preview))?;
    report.preview(preview);
    if !accepted {
        report.failure("Update cancelled by the operator");
    }
    Ok(accepted)
}
