//! Mutating menu operations against the SQLite fixture database
//!
//! Every failure path must leave the database exactly as it was: these tests
//! check row counts and values after rejected, declined and failed operations.

#![cfg(feature = "sqlite")]

mod common;

use common::{answers, error_code, salary, scalar, session, store, text};
use pretty_assertions::assert_eq;
use workforce::operations::{self, Operation};
use workforce::{Session, Store};

const EMPLOYEES: &str = "SELECT COUNT(*) FROM empleado";
const ASSIGNMENTS: &str = "SELECT COUNT(*) FROM EmpleadoProyecto";

// ============================================================================
// Inserts
// ============================================================================

#[tokio::test]
async fn test_insert_employee() {
    let mut store = store();
    let mut prompter = answers(&["10", "Xiana", "Analista", "1800", "", "1", "2"]);

    let report =
        operations::run(Operation::InsertEmployee, &mut store, &mut prompter, &session()).await;

    assert!(report.is_ok(), "{:?}", report.error);
    assert!(report.committed);
    assert_eq!(text(&report), "[✓] Employee 10 inserted\n");

    let employee = store.employee(10).await.unwrap().unwrap();
    assert_eq!(employee.name, "Xiana");
    assert_eq!(employee.commission, None);
    assert_eq!(employee.manager_id, Some(1));
    assert_eq!(employee.department_id, Some(2));
    assert_eq!(employee.hire_date, chrono::Local::now().date_naive());
}

#[tokio::test]
async fn test_insert_duplicate_employee_is_rejected() {
    let mut store = store();
    let mut prompter = answers(&["1", "Otra", "Comercial", "1000", "", "", ""]);

    let report =
        operations::run(Operation::InsertEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(error_code(&report), Some("REJECTED"));
    assert_eq!(text(&report), "[✗] An employee with id 1 already exists\n");
    assert_eq!(scalar(&store, EMPLOYEES), 4);
    assert_eq!(store.employee(1).await.unwrap().unwrap().name, "Ana");
}

#[tokio::test]
async fn test_insert_employee_with_negative_commission() {
    let mut store = store();
    let mut prompter = answers(&["11", "Xiana", "Analista", "1800", "-5", "", ""]);

    let report =
        operations::run(Operation::InsertEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Salary and commission must be positive\n");
    assert_eq!(scalar(&store, EMPLOYEES), 4);
}

#[tokio::test]
async fn test_insert_employee_checks_references_first() {
    let mut store = store();

    let mut prompter = answers(&["12", "Xiana", "Analista", "1800", "", "77", ""]);
    let report =
        operations::run(Operation::InsertEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(error_code(&report), Some("NOT_FOUND"));
    assert_eq!(text(&report), "[✗] No employee with id 77 to set as manager\n");

    let mut prompter = answers(&["12", "Xiana", "Analista", "1800", "", "", "9"]);
    let report =
        operations::run(Operation::InsertEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] Department 9 does not exist\n");

    assert_eq!(scalar(&store, EMPLOYEES), 4);
}

#[tokio::test]
async fn test_insert_department_and_project() {
    let mut store = store();

    let mut prompter = answers(&["4", "Loxística", "Vigo"]);
    let report =
        operations::run(Operation::InsertDepartment, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✓] Department 4 inserted\n");

    let mut prompter = answers(&["4", "Duplicado", "Lugo"]);
    let report =
        operations::run(Operation::InsertDepartment, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] A department with id 4 already exists\n");

    let mut prompter = answers(&["1", "Duplicado", "Lugo"]);
    let report =
        operations::run(Operation::InsertProject, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] A project with id 1 already exists\n");
    assert_eq!(store.project(1).await.unwrap().unwrap().name, "Apolo");
}

// ============================================================================
// Updates with confirmation
// ============================================================================

#[tokio::test]
async fn test_confirmed_salary_raise() {
    let mut store = store();
    let mut prompter = answers(&["2", "10", ""]);

    let report = operations::run(Operation::RaiseSalary, &mut store, &mut prompter, &session()).await;

    assert!(report.committed);
    assert_eq!(text(&report), "[✓] Salary updated\n");
    assert!((salary(&store, 2) - 1650.0).abs() < 1e-9);

    let prompts = String::from_utf8(prompter.into_writer()).unwrap();
    assert!(prompts.contains("RESULT: [id: 2, name: Brais, new salary: 1650.00]\n"));
}

#[tokio::test]
async fn test_declined_salary_raise_changes_nothing() {
    let mut store = store();
    let mut prompter = answers(&["2", "10", "n"]);

    let report = operations::run(Operation::RaiseSalary, &mut store, &mut prompter, &session()).await;

    assert!(report.is_ok());
    assert!(!report.committed);
    assert_eq!(text(&report), "[✗] Update cancelled by the operator\n");
    assert!((salary(&store, 2) - 1500.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_salary_raise_below_zero_is_rejected() {
    let mut store = store();
    let mut prompter = answers(&["2", "-200", "y"]);

    let report = operations::run(Operation::RaiseSalary, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Salary must be positive\n");
    assert!((salary(&store, 2) - 1500.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_salary_raise_for_missing_employee() {
    let mut store = store();
    let mut prompter = answers(&["99", "10"]);

    let report = operations::run(Operation::RaiseSalary, &mut store, &mut prompter, &session()).await;

    assert_eq!(error_code(&report), Some("NOT_FOUND"));
    let prompts = String::from_utf8(prompter.into_writer()).unwrap();
    assert!(!prompts.contains("RESULT"));
}

#[tokio::test]
async fn test_clear_commission() {
    let mut store = store();
    let mut prompter = answers(&["2", "", "s"]);

    let report =
        operations::run(Operation::UpdateCommission, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✓] Commission updated\n");
    assert_eq!(store.employee(2).await.unwrap().unwrap().commission, None);
}

#[tokio::test]
async fn test_negative_commission_is_rejected() {
    let mut store = store();
    let mut prompter = answers(&["2", "-1", ""]);

    let report =
        operations::run(Operation::UpdateCommission, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Commission must be positive\n");
    assert_eq!(store.employee(2).await.unwrap().unwrap().commission, Some(200.0));
}

#[tokio::test]
async fn test_update_director() {
    let mut store = store();
    let mut prompter = answers(&["2", "4"]);

    let report =
        operations::run(Operation::UpdateDirector, &mut store, &mut prompter, &session()).await;

    assert!(report.committed);
    assert_eq!(store.department(2).await.unwrap().unwrap().director_id, Some(4));
}

#[tokio::test]
async fn test_update_director_checks_the_new_director() {
    let mut store = store();
    let mut prompter = answers(&["2", "99"]);

    let report =
        operations::run(Operation::UpdateDirector, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Employee 99 does not exist\n");
    assert_eq!(store.department(2).await.unwrap().unwrap().director_id, Some(3));
}

#[tokio::test]
async fn test_add_hours() {
    let mut store = store();
    let mut prompter = answers(&["3", "2", "4", ""]);

    let report = operations::run(Operation::AddHours, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✓] Hours updated\n");
    assert_eq!(store.hours(3, 2).await.unwrap(), Some(24));

    let prompts = String::from_utf8(prompter.into_writer()).unwrap();
    assert!(prompts.contains("RESULT: [employee id: 3, project id: 2, resulting hours: 24]"));
}

#[tokio::test]
async fn test_add_hours_requires_assignment() {
    let mut store = store();
    let mut prompter = answers(&["1", "1", "4"]);

    let report = operations::run(Operation::AddHours, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Employee 1 is not assigned to project 1\n");
    assert_eq!(store.hours(1, 1).await.unwrap(), None);
}

// ============================================================================
// Replacement
// ============================================================================

#[tokio::test]
async fn test_replace_employee_on_project() {
    let mut store = store();
    let mut prompter = answers(&["2", "4", "1"]);

    let report =
        operations::run(Operation::ReplaceEmployee, &mut store, &mut prompter, &session()).await;

    assert!(report.committed, "{:?}", report.error);
    assert_eq!(text(&report), "[✓] Employee 2 replaced by employee 4 on project 1\n");
    assert_eq!(store.hours(2, 1).await.unwrap(), None);
    assert_eq!(store.hours(4, 1).await.unwrap(), Some(0));
    assert_eq!(scalar(&store, ASSIGNMENTS), 3);
}

#[tokio::test]
async fn test_employee_cannot_replace_themselves() {
    let mut store = store();
    let mut prompter = answers(&["2", "2", "1"]);

    let report =
        operations::run(Operation::ReplaceEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(error_code(&report), Some("CONFLICT"));
    assert_eq!(text(&report), "[✗] An employee cannot replace themselves\n");
    assert_eq!(store.hours(2, 1).await.unwrap(), Some(10));
}

#[tokio::test]
async fn test_replace_fails_when_incoming_already_assigned() {
    let mut store = store();
    let mut prompter = answers(&["2", "3", "1"]);

    let report =
        operations::run(Operation::ReplaceEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Employee 3 is already assigned to project 1\n");
    assert_eq!(store.hours(2, 1).await.unwrap(), Some(10));
    assert_eq!(store.hours(3, 1).await.unwrap(), Some(5));
}

#[tokio::test]
async fn test_replace_fails_when_outgoing_not_assigned() {
    let mut store = store();
    let mut prompter = answers(&["4", "1", "2"]);

    let report =
        operations::run(Operation::ReplaceEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Employee 4 is not assigned to project 2\n");
    assert_eq!(scalar(&store, ASSIGNMENTS), 3);
}

#[tokio::test]
async fn test_replace_names_the_missing_incoming_employee() {
    let mut store = store();
    let mut prompter = answers(&["2", "50", "1"]);

    let report =
        operations::run(Operation::ReplaceEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✗] Employee 50 does not exist\n");
}

// ============================================================================
// Deletes
// ============================================================================

#[tokio::test]
async fn test_delete_director_is_refused() {
    let mut store = store();
    let mut prompter = answers(&["1"]);

    let report =
        operations::run(Operation::DeleteEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(error_code(&report), Some("REJECTED"));
    assert_eq!(
        text(&report),
        "[✗] Employee 1 cannot be deleted because they direct a department\n"
    );
    assert!(store.employee(1).await.unwrap().is_some());
    assert_eq!(store.department(1).await.unwrap().unwrap().director_id, Some(1));
}

#[tokio::test]
async fn test_delete_employee() {
    let mut store = store();
    let mut prompter = answers(&["4"]);

    let report =
        operations::run(Operation::DeleteEmployee, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✓] 1 row(s) deleted\n");
    assert_eq!(scalar(&store, EMPLOYEES), 3);
}

#[tokio::test]
async fn test_delete_departments_by_keyword() {
    let mut store = store();

    let mut prompter = answers(&["Norte"]);
    let report =
        operations::run(Operation::DeleteDepartments, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✓] 1 row(s) deleted\n");
    assert!(store.department(3).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_referenced_departments_rolls_back_all() {
    let mut store = store();
    let mut prompter = answers(&["Ventas"]);

    let report =
        operations::run(Operation::DeleteDepartments, &mut store, &mut prompter, &session()).await;

    assert_eq!(
        text(&report),
        "[✗] Departments whose name contains 'Ventas' are still referenced\n"
    );
    assert_eq!(scalar(&store, "SELECT COUNT(*) FROM departamento"), 3);
}

#[tokio::test]
async fn test_delete_projects_by_location() {
    let mut store = store();
    let mut prompter = answers(&["Vigo"]);

    let report =
        operations::run(Operation::DeleteProjects, &mut store, &mut prompter, &session()).await;

    assert_eq!(text(&report), "[✓] 2 row(s) deleted\n");
    assert_eq!(scalar(&store, "SELECT COUNT(*) FROM proyecto"), 1);
    assert_eq!(scalar(&store, ASSIGNMENTS), 1);
}

// ============================================================================
// Relations
// ============================================================================

#[tokio::test]
async fn test_assign_employee_to_project() {
    let mut store = store();

    let mut prompter = answers(&["1", "2"]);
    let report =
        operations::run(Operation::AssignEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✓] Relation created\n");
    assert_eq!(store.hours(1, 2).await.unwrap(), Some(0));

    let mut prompter = answers(&["1", "2"]);
    let report =
        operations::run(Operation::AssignEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(error_code(&report), Some("CONFLICT"));
    assert_eq!(scalar(&store, ASSIGNMENTS), 4);
}

#[tokio::test]
async fn test_relation_to_missing_rows_is_rejected_before_writing() {
    let mut store = store();

    let mut prompter = answers(&["1", "9"]);
    let report =
        operations::run(Operation::AssignEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] Project 9 does not exist\n");

    let mut prompter = answers(&["9", "1"]);
    let report =
        operations::run(Operation::AssignEmployee, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] Employee 9 does not exist\n");

    let mut prompter = answers(&["9", "1"]);
    let report =
        operations::run(Operation::AddParticipation, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] Department 9 does not exist\n");

    assert_eq!(scalar(&store, ASSIGNMENTS), 3);
    assert_eq!(scalar(&store, "SELECT COUNT(*) FROM DepartamentoProyecto"), 2);
}

#[tokio::test]
async fn test_add_participation() {
    let mut store = store();

    let mut prompter = answers(&["3", "1"]);
    let report =
        operations::run(Operation::AddParticipation, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✓] Relation created\n");

    let mut prompter = answers(&["1", "1"]);
    let report =
        operations::run(Operation::AddParticipation, &mut store, &mut prompter, &session()).await;
    assert_eq!(text(&report), "[✗] Department 1 already participates in project 1\n");
}

// ============================================================================
// Read-only connections
// ============================================================================

#[tokio::test]
async fn test_readonly_session_refuses_mutations_before_prompting() {
    let mut store = store();
    let readonly = Session { connection: "prod".to_string(), readonly: true };
    let mut prompter = answers(&["4"]);

    let report =
        operations::run(Operation::DeleteEmployee, &mut store, &mut prompter, &readonly).await;

    assert_eq!(error_code(&report), Some("READ_ONLY"));
    assert_eq!(text(&report), "[✗] Connection 'prod' is read-only\n");
    assert_eq!(scalar(&store, EMPLOYEES), 4);
    assert!(prompter.into_writer().is_empty());
}

#[tokio::test]
async fn test_readonly_session_allows_queries() {
    let mut store = store();
    let readonly = Session { connection: "prod".to_string(), readonly: true };
    let mut prompter = answers(&["4"]);

    let report = operations::run(Operation::EmployeeById, &mut store, &mut prompter, &readonly).await;

    assert!(report.is_ok());
}
