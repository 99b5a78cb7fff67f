/// Schema statements for the SQLite attribute store.
///
/// Every statement is idempotent and the list is applied in order on each
/// initialization.
pub fn generate_migrations() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "20240601000000_candidates",
            r#"
            CREATE TABLE IF NOT EXISTS candidates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                location TEXT,
                willing_to_travel BOOLEAN,
                phone TEXT,
                email TEXT UNIQUE,
                bio TEXT,
                languages_spoken TEXT,
                education TEXT,
                experience TEXT
            );
            "#,
        ),
        (
            "20240601000001_candidates_location_index",
            r#"
            CREATE INDEX IF NOT EXISTS idx_candidates_location ON candidates(location);
            "#,
        ),
    ]
}

/// Statement that discards every record and restarts id assignment.
///
/// Dropping an AUTOINCREMENT table also removes its `sqlite_sequence` row.
pub const DROP_SCHEMA: &str = "DROP TABLE IF EXISTS candidates";
