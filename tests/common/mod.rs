//! Shared helpers for the SQLite integration tests

#![allow(dead_code)]

use std::io::Cursor;

use rusqlite::Connection;
use workforce::{LinePrompter, Report, Session, SqliteStore};

pub type ScriptedPrompter = LinePrompter<Cursor<Vec<u8>>, Vec<u8>>;

/// Fresh in-memory database holding the fixture schema and seed rows
pub fn store() -> SqliteStore {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    conn.execute_batch(include_str!("../fixtures/schema_sqlite.sql"))
        .expect("Failed to load fixture schema");
    SqliteStore::from_connection(conn).expect("Failed to wrap connection")
}

/// Prompter that answers with the given lines, in order
pub fn answers(lines: &[&str]) -> ScriptedPrompter {
    let input: String = lines.iter().map(|line| format!("{line}\n")).collect();
    LinePrompter::new(Cursor::new(input.into_bytes()), Vec::new())
}

pub fn session() -> Session {
    Session { connection: "test".to_string(), readonly: false }
}

/// Single integer produced by a query
pub fn scalar(store: &SqliteStore, sql: &str) -> i64 {
    store.connection().query_row(sql, [], |row| row.get(0)).expect("Scalar query failed")
}

pub fn salary(store: &SqliteStore, id: i32) -> f64 {
    store
        .connection()
        .query_row("SELECT salario FROM empleado WHERE id = ?1", [id], |row| row.get(0))
        .expect("Salary query failed")
}

/// Text rendering of a report, for substring assertions
pub fn text(report: &Report) -> String {
    report.render_text()
}

pub fn error_code(report: &Report) -> Option<&str> {
    report.error.as_ref().map(|e| e.code.as_str())
}
