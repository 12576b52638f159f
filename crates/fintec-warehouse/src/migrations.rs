use ::duckdb::{Connection, ToSql};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_rate_history",
        sql: r#"
CREATE TABLE IF NOT EXISTS bcv_rate_history (
    date TEXT PRIMARY KEY,
    id TEXT NOT NULL,
    usd DOUBLE NOT NULL,
    eur DOUBLE,
    timestamp TEXT NOT NULL,
    observed_at TIMESTAMP,
    source TEXT NOT NULL,
    is_fallback BOOLEAN NOT NULL DEFAULT FALSE,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS binance_rate_history (
    date TEXT PRIMARY KEY,
    id TEXT NOT NULL,
    usd DOUBLE NOT NULL,
    eur DOUBLE,
    timestamp TEXT NOT NULL,
    observed_at TIMESTAMP,
    source TEXT NOT NULL,
    is_fallback BOOLEAN NOT NULL DEFAULT FALSE,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
];

/// Apply every migration not yet recorded in `schema_migrations`.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let params: [&dyn ToSql; 1] = [&migration.version];
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params.as_slice(),
            )?;
        }
    }

    Ok(())
}
