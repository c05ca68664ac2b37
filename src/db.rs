use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub async fn init_db(database_url: &str) -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .connect(database_url)
        .await
        .expect("Failed to connect to database");

    init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    pool
}

/// Idempotent schema bootstrap. `employee_code` uniqueness and the
/// one-record-per-(employee, date) rule live here, not in handler logic.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_code TEXT NOT NULL UNIQUE,
            full_name     TEXT NOT NULL,
            email         TEXT NOT NULL,
            phone         TEXT,
            department    TEXT NOT NULL,
            position      TEXT NOT NULL,
            joining_date  TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES employees(id),
            date        TEXT NOT NULL,
            status      TEXT NOT NULL,
            note        TEXT,
            UNIQUE (employee_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance (date)")
        .execute(pool)
        .await?;

    Ok(())
}
