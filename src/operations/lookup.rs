//! Read-only menu operations (keys 1-9)
//!
//! A missing row in a key lookup is an answer, not a failure: the transaction
//! commits. The relationship listings first check that the owning row exists.

use super::{ensure_exists, money, or_dash, Disposition};
use crate::engine::{Key, Store, Summary};
use crate::error::Result;
use crate::output::{Cell, Report};
use crate::prompt::Record;

pub(super) async fn employee_by_id<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;

    let Some(employee) = store.employee(id).await? else {
        report.success(format!("No employee with id {id}"));
        report.rows = Some(0);
        return Ok(Disposition::Commit);
    };

    report.success("1 employee found:");
    report.field("Id", employee.id);
    report.field("Name", &employee.name);
    report.field("Job", &employee.job);
    report.field("Hire date", employee.hire_date);
    report.field("Salary", money(employee.salary));
    report.field("Commission", or_dash(employee.commission.map(money)));
    report.field("Manager id", or_dash(employee.manager_id));
    report.field("Department id", or_dash(employee.department_id));
    report.rows = Some(1);
    Ok(Disposition::Commit)
}

pub(super) async fn department_by_id<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;

    let Some(department) = store.department(id).await? else {
        report.success(format!("No department with id {id}"));
        report.rows = Some(0);
        return Ok(Disposition::Commit);
    };

    let director = match department.director_id {
        Some(director_id) => match store.employee(director_id).await? {
            Some(employee) => format!("{director_id} ({})", employee.name),
            None => director_id.to_string(),
        },
        None => "-".to_string(),
    };

    report.success("1 department found:");
    report.field("Id", department.id);
    report.field("Name", &department.name);
    report.field("Location", &department.location);
    report.field("Director", director);
    report.rows = Some(1);
    Ok(Disposition::Commit)
}

pub(super) async fn project_by_id<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;

    let Some(project) = store.project(id).await? else {
        report.success(format!("No project with id {id}"));
        report.rows = Some(0);
        return Ok(Disposition::Commit);
    };

    report.success("1 project found:");
    report.field("Id", project.id);
    report.field("Name", &project.name);
    report.field("Location", &project.location);
    report.rows = Some(1);
    Ok(Disposition::Commit)
}

pub(super) async fn employees_paid_over<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let salary = record.require_float("salary")?;

    let rows = store.employees_paid_over(salary).await?;
    for row in &rows {
        report.row(vec![
            Cell::new("id", row.id),
            Cell::new("name", &row.name),
            Cell::new("salary", money(row.salary)),
        ]);
    }

    report.success(format!("Total employees: {}", rows.len()));
    report.rows = Some(rows.len());
    Ok(Disposition::Commit)
}

pub(super) async fn departments_at<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let location = record.require_text("location")?;
    let rows = store.departments_at(location).await?;
    list_summaries(report, &rows, "departments");
    Ok(Disposition::Commit)
}

pub(super) async fn projects_at<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let location = record.require_text("location")?;
    let rows = store.projects_at(location).await?;
    list_summaries(report, &rows, "projects");
    Ok(Disposition::Commit)
}

pub(super) async fn projects_of<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;
    ensure_exists(store, Key::Employee(id)).await?;

    let rows = store.projects_of(id).await?;
    for row in &rows {
        report.row(vec![
            Cell::new("id", row.project_id),
            Cell::new("name", or_dash(row.project_name.as_deref())),
            Cell::new("hours", row.hours),
        ]);
    }

    report.success(format!("Total projects: {}", rows.len()));
    report.rows = Some(rows.len());
    Ok(Disposition::Commit)
}

pub(super) async fn departments_in_project<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;
    ensure_exists(store, Key::Project(id)).await?;

    let rows = store.departments_in_project(id).await?;
    list_summaries(report, &rows, "departments");
    Ok(Disposition::Commit)
}

pub(super) async fn departments_directed_by<S: Store>(
    record: &Record,
    store: &mut S,
    report: &mut Report,
) -> Result<Disposition> {
    let id = record.require_int("id")?;
    if !store.exists(Key::Employee(id)).await? {
        report.success(format!("No employee with id {id}"));
        report.rows = Some(0);
        return Ok(Disposition::Commit);
    }

    let rows = store.departments_directed_by(id).await?;
    if rows.is_empty() {
        report.success(format!("Employee {id} does not direct any department"));
        report.rows = Some(0);
        return Ok(Disposition::Commit);
    }

    list_summaries(report, &rows, &format!("departments directed by employee {id}"));
    Ok(Disposition::Commit)
}

fn list_summaries(report: &mut Report, rows: &[Summary], noun: &str) {
    for row in rows {
        report.row(vec![Cell::new("id", row.id), Cell::new("name", or_dash(row.name.as_deref()))]);
    }
    report.success(format!("Total {noun}: {}", rows.len()));
    report.rows = Some(rows.len());
}
