use crate::error::JobsiteError;
use crate::repository::sqlite::tests::test_database_manager;
use crate::repository::sqlite::{lock, SharedSqliteConnection};

#[test]
fn test_foreign_keys_enabled() {
    let db_manager = test_database_manager().expect("Failed to create test database manager");
    let conn = db_manager.get_connection();

    let foreign_keys_enabled =
        is_foreign_keys_enabled(&conn).expect("Failed to check foreign keys setting");

    assert!(foreign_keys_enabled, "Foreign keys should be enabled");
}

#[test]
fn test_all_tables_created() -> Result<(), JobsiteError> {
    let db_manager = test_database_manager()?;
    let conn = db_manager.get_connection();
    let conn = lock(&conn)?;
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for expected in [
        "admin",
        "company",
        "contractor",
        "project",
        "project_document",
        "project_subcontractor",
        "subcontractor",
        "submission",
        "timesheet",
        "toolbox_talk",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, found {tables:?}"
        );
    }
    Ok(())
}

#[test]
fn test_schema_creation_is_idempotent() -> Result<(), JobsiteError> {
    let db_manager = test_database_manager()?;
    crate::repository::sqlite::create_schema(&db_manager.get_connection())?;
    Ok(())
}

/// Helper function to check if foreign keys are enabled in an SQLite connection
fn is_foreign_keys_enabled(conn: &SharedSqliteConnection) -> Result<bool, JobsiteError> {
    let conn = lock(conn)?;
    let value: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    Ok(value == 1)
}
