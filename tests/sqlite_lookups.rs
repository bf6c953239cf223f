//! Read-only menu operations against the SQLite fixture database
//!
//! Covers key lookups, predicate listings and the relationship listings that
//! require their owning row to exist.

#![cfg(feature = "sqlite")]

mod common;

use common::{answers, error_code, session, store, text};
use pretty_assertions::assert_eq;
use workforce::operations::{self, Operation};
use workforce::output::Line;

#[tokio::test]
async fn test_employee_by_id() {
    let mut store = store();
    let mut prompter = answers(&["2"]);

    let report = operations::run(Operation::EmployeeById, &mut store, &mut prompter, &session()).await;

    assert!(report.is_ok());
    assert!(report.committed);
    assert_eq!(report.rows, Some(1));
    assert_eq!(
        text(&report),
        "[✓] 1 employee found:\n\
         \tId: 2\n\
         \tName: Brais\n\
         \tJob: Comercial\n\
         \tHire date: 2018-06-15\n\
         \tSalary: 1500.00\n\
         \tCommission: 200.00\n\
         \tManager id: 1\n\
         \tDepartment id: 1\n"
    );
}

#[tokio::test]
async fn test_missing_employee_is_not_an_error() {
    let mut store = store();
    let mut prompter = answers(&["99"]);

    let report = operations::run(Operation::EmployeeById, &mut store, &mut prompter, &session()).await;

    assert!(report.is_ok());
    assert!(report.committed);
    assert_eq!(report.rows, Some(0));
    assert_eq!(text(&report), "[✓] No employee with id 99\n");
}

#[tokio::test]
async fn test_department_by_id_shows_director() {
    let mut store = store();
    let mut prompter = answers(&["2"]);

    let report =
        operations::run(Operation::DepartmentById, &mut store, &mut prompter, &session()).await;

    assert!(report.lines.contains(&Line::Field {
        label: "Director".to_string(),
        value: "3 (Carme)".to_string()
    }));

    let mut prompter = answers(&["3"]);
    let report =
        operations::run(Operation::DepartmentById, &mut store, &mut prompter, &session()).await;
    assert!(text(&report).contains("\tDirector: -\n"));
}

#[tokio::test]
async fn test_project_by_id() {
    let mut store = store();
    let mut prompter = answers(&["3"]);

    let report = operations::run(Operation::ProjectById, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✓] 1 project found:\n\tId: 3\n\tName: Ceres\n\tLocation: Vigo\n");
}

#[tokio::test]
async fn test_employees_paid_over_is_strict_and_ordered() {
    let mut store = store();
    let mut prompter = answers(&["1500"]);

    let report =
        operations::run(Operation::EmployeesPaidOver, &mut store, &mut prompter, &session()).await;

    assert_eq!(
        text(&report),
        "\tRow 1: [id: 1, name: Ana, salary: 3000.00]\n\
         \tRow 2: [id: 3, name: Carme, salary: 2000.00]\n\
         [✓] Total employees: 2\n"
    );
    assert_eq!(report.rows, Some(2));
}

#[tokio::test]
async fn test_departments_and_projects_at_location() {
    let mut store = store();

    let mut prompter = answers(&["Vigo"]);
    let report =
        operations::run(Operation::DepartmentsAtLocation, &mut store, &mut prompter, &session())
            .await;
    assert_eq!(text(&report), "\tRow 1: [id: 1, name: Ventas]\n[✓] Total departments: 1\n");

    let mut prompter = answers(&["Vigo"]);
    let report =
        operations::run(Operation::ProjectsAtLocation, &mut store, &mut prompter, &session()).await;
    assert_eq!(report.rows, Some(2));

    let mut prompter = answers(&["Santiago"]);
    let report =
        operations::run(Operation::ProjectsAtLocation, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✓] Total projects: 0\n");
}

#[tokio::test]
async fn test_projects_of_employee_with_hours() {
    let mut store = store();
    let mut prompter = answers(&["3"]);

    let report =
        operations::run(Operation::ProjectsOfEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(
        text(&report),
        "\tRow 1: [id: 1, name: Apolo, hours: 5]\n\
         \tRow 2: [id: 2, name: Hermes, hours: 20]\n\
         [✓] Total projects: 2\n"
    );
}

#[tokio::test]
async fn test_relationship_listing_requires_owner() {
    let mut store = store();

    let mut prompter = answers(&["42"]);
    let report =
        operations::run(Operation::ProjectsOfEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(error_code(&report), Some("NOT_FOUND"));
    assert!(!report.committed);
    assert_eq!(text(&report), "[✗] Employee 42 does not exist\n");

    let mut prompter = answers(&["42"]);
    let report =
        operations::run(Operation::DepartmentsInProject, &mut store, &mut prompter, &session())
            .await;
    assert_eq!(text(&report), "[✗] Project 42 does not exist\n");
}

#[tokio::test]
async fn test_departments_in_project() {
    let mut store = store();
    let mut prompter = answers(&["2"]);

    let report =
        operations::run(Operation::DepartmentsInProject, &mut store, &mut prompter, &session())
            .await;

    assert_eq!(text(&report), "\tRow 1: [id: 2, name: Investigación]\n[✓] Total departments: 1\n");
}

#[tokio::test]
async fn test_departments_directed_by() {
    let mut store = store();

    let mut prompter = answers(&["1"]);
    let report =
        operations::run(Operation::DepartmentsDirectedBy, &mut store, &mut prompter, &session())
            .await;
    assert_eq!(
        text(&report),
        "\tRow 1: [id: 1, name: Ventas]\n[✓] Total departments directed by employee 1: 1\n"
    );

    let mut prompter = answers(&["2"]);
    let report =
        operations::run(Operation::DepartmentsDirectedBy, &mut store, &mut prompter, &session())
            .await;
    assert_eq!(text(&report), "[✓] Employee 2 does not direct any department\n");
    assert!(report.committed);

    let mut prompter = answers(&["9"]);
    let report =
        operations::run(Operation::DepartmentsDirectedBy, &mut store, &mut prompter, &session())
            .await;
    assert_eq!(text(&report), "[✓] No employee with id 9\n");
    assert!(report.committed);
    assert_eq!(report.rows, Some(0));
}

#[tokio::test]
async fn test_missing_key_never_reaches_the_database() {
    let mut store = store();
    let mut prompter = answers(&[""]);

    let report = operations::run(Operation::EmployeeById, &mut store, &mut prompter, &session()).await;

    assert_eq!(error_code(&report), Some("MISSING_INPUT"));
    assert_eq!(text(&report), "[✗] Employee id is required\n");
    assert!(!report.committed);
}

#[tokio::test]
async fn test_invalid_number() {
    let mut store = store();
    let mut prompter = answers(&["lots"]);

    let report =
        operations::run(Operation::EmployeesPaidOver, &mut store, &mut prompter, &session()).await;

    assert_eq!(error_code(&report), Some("INVALID_INPUT"));
}
