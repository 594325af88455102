use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

// Dates and timestamps are stored as ISO text so lexical order is chronological.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_stock_queries",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS stock_queries_id_seq START 1;

CREATE TABLE IF NOT EXISTS stock_queries (
    id BIGINT PRIMARY KEY DEFAULT nextval('stock_queries_id_seq'),
    from_date VARCHAR NOT NULL,
    emiten VARCHAR NOT NULL,
    sector VARCHAR,
    to_date VARCHAR,
    bandar VARCHAR,
    barang_bandar DOUBLE,
    rata_rata_bandar DOUBLE,
    harga DOUBLE,
    ara DOUBLE,
    arb DOUBLE,
    fraksi DOUBLE,
    total_bid DOUBLE,
    total_offer DOUBLE,
    total_papan DOUBLE,
    rata_rata_bid_ofer DOUBLE,
    a DOUBLE,
    p DOUBLE,
    target_realistis DOUBLE,
    target_max DOUBLE,
    status VARCHAR NOT NULL,
    error_message VARCHAR,
    real_harga DOUBLE,
    UNIQUE(from_date, emiten)
);
"#,
    },
    Migration {
        version: "0002_session",
        sql: r#"
CREATE TABLE IF NOT EXISTS session (
    key VARCHAR PRIMARY KEY,
    value VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL
);
"#,
    },
];

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
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let connection = Connection::open_in_memory().expect("open");
        apply_migrations(&connection).expect("first run");
        apply_migrations(&connection).expect("second run");

        let applied: i64 = connection
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("count");
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn stock_queries_rejects_duplicate_natural_key() {
        let connection = Connection::open_in_memory().expect("open");
        apply_migrations(&connection).expect("migrate");

        let insert = "INSERT INTO stock_queries (from_date, emiten, status) VALUES ('2024-01-02', 'BBCA', 'success')";
        connection.execute_batch(insert).expect("first insert");
        assert!(connection.execute_batch(insert).is_err());
    }
}
