//! Schema migration framework.
//!
//! Numbered SQL migrations are embedded at compile time via `include_str!`.
//! Each migration runs exactly once, tracked by the `schema_version` table.
//!
//! Databases written by the earlier dashboard have no `schema_version`, a
//! `mappings` table without timestamps or a unique rule triple, and an
//! `employees` table without the display columns. Before the baseline runs,
//! such a database is backed up and its tables are brought to the baseline
//! shape (duplicate rules collapsed into one row).

use rusqlite::Connection;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

/// Nullable columns the baseline `employees` table has that older ones may lack.
const EMPLOYEE_COLUMNS: &[(&str, &str)] = &[
    ("team_name", "TEXT"),
    ("city_name", "TEXT"),
    ("country_name", "TEXT"),
    ("location", "TEXT"),
    ("updated_at", "TEXT"),
];

/// Create the `schema_version` table if it doesn't exist.
fn ensure_schema_version_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("Failed to create schema_version table: {}", e))
}

/// Return the highest applied migration version, or 0 if none.
fn current_version(conn: &Connection) -> Result<i32, String> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("Failed to read schema version: {}", e))
}

/// Column names of `table`; empty when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| format!("Failed to inspect {}: {}", table, e))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| format!("Failed to inspect {}: {}", table, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to inspect {}: {}", table, e))
}

/// True when an unversioned database holds tables in the pre-baseline shape.
fn is_legacy_db(conn: &Connection) -> Result<bool, String> {
    let mappings = table_columns(conn, "mappings")?;
    if !mappings.is_empty() && !mappings.iter().any(|c| c == "created_at") {
        return Ok(true);
    }
    let reports = table_columns(conn, "reports")?;
    if !reports.is_empty() && !reports.iter().any(|c| c == "report_id") {
        return Ok(true);
    }
    let employees = table_columns(conn, "employees")?;
    Ok(!employees.is_empty()
        && EMPLOYEE_COLUMNS
            .iter()
            .any(|(name, _)| !employees.iter().any(|c| c == name)))
}

/// Bring a pre-framework database to the baseline shape.
///
/// Returns true if anything was rewritten. The baseline itself is applied
/// afterwards by the normal migration loop.
fn upgrade_legacy_db(conn: &Connection) -> Result<bool, String> {
    if current_version(conn)? > 0 || !is_legacy_db(conn)? {
        return Ok(false);
    }

    backup_before_migration(conn)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| format!("Failed to start legacy upgrade: {}", e))?;

    let employees = table_columns(&tx, "employees")?;
    if !employees.is_empty() {
        for (name, decl) in EMPLOYEE_COLUMNS {
            if !employees.iter().any(|c| c == name) {
                tx.execute_batch(&format!("ALTER TABLE employees ADD COLUMN {} {};", name, decl))
                    .map_err(|e| format!("Failed to add employees.{}: {}", name, e))?;
            }
        }
    }

    let reports = table_columns(&tx, "reports")?;
    if !reports.is_empty() && !reports.iter().any(|c| c == "report_id") {
        tx.execute_batch("ALTER TABLE reports RENAME TO reports_legacy;")
            .map_err(|e| format!("Failed to set aside legacy reports: {}", e))?;
        log::warn!("Legacy reports table kept as reports_legacy; reseed report definitions");
    }

    let mappings = table_columns(&tx, "mappings")?;
    let rebuild_mappings = !mappings.is_empty() && !mappings.iter().any(|c| c == "created_at");
    if rebuild_mappings {
        tx.execute_batch("ALTER TABLE mappings RENAME TO mappings_legacy;")
            .map_err(|e| format!("Failed to set aside legacy mappings: {}", e))?;
    }

    tx.execute_batch(MIGRATIONS[0].sql)
        .map_err(|e| format!("Failed to create baseline tables: {}", e))?;

    if rebuild_mappings {
        // One row per rule; any `Yes` among duplicates wins, then any `No`.
        let copied = tx
            .execute(
                "INSERT INTO mappings (report_name, mapping_type, mapping_id, inclusion_flag)
                 SELECT report_name, mapping_type, mapping_id,
                        CASE
                            WHEN MAX(inclusion_flag = 'Yes') = 1 THEN 'Yes'
                            WHEN MAX(inclusion_flag = 'No') = 1 THEN 'No'
                            ELSE NULL
                        END
                 FROM mappings_legacy
                 WHERE report_name IS NOT NULL AND mapping_id IS NOT NULL
                   AND mapping_type IN
                       ('employee_id', 'team_id', 'area_id', 'city_id', 'country_id')
                 GROUP BY report_name, mapping_type, mapping_id",
                [],
            )
            .map_err(|e| format!("Failed to copy legacy mappings: {}", e))?;
        tx.execute_batch("DROP TABLE mappings_legacy;")
            .map_err(|e| format!("Failed to drop legacy mappings: {}", e))?;
        log::info!("Legacy upgrade: rebuilt mappings with {} distinct rules", copied);
    }

    tx.commit()
        .map_err(|e| format!("Failed to commit legacy upgrade: {}", e))?;
    Ok(true)
}

/// Back up the database before it is rewritten.
///
/// Uses SQLite's online backup API to create a hot copy at
/// `<db_path>.pre-migration.bak`. In-memory databases are skipped.
fn backup_before_migration(conn: &Connection) -> Result<(), String> {
    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("Failed to get database path: {}", e))?;

    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }

    let backup_path = format!("{}.pre-migration.bak", db_path);
    let mut backup_conn = rusqlite::Connection::open(&backup_path)
        .map_err(|e| format!("Failed to open backup file: {}", e))?;

    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)
        .map_err(|e| format!("Failed to initialize pre-migration backup: {}", e))?;

    backup
        .step(-1)
        .map_err(|e| format!("Pre-migration backup failed: {}", e))?;

    log::info!("Pre-migration backup created at {}", backup_path);
    Ok(())
}

/// Run all pending migrations.
///
/// Returns the number of migrations applied (0 if already up-to-date).
///
/// Forward-compat guard: if the database has a higher version than the highest
/// known migration, returns an error instead of touching it.
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    ensure_schema_version_table(conn)?;

    let current = current_version(conn)?;
    let max_known = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);

    if current > max_known {
        return Err(format!(
            "Database schema version ({}) is newer than this build supports ({}). \
             Upgrade reportmap before opening this database.",
            current, max_known
        ));
    }

    if upgrade_legacy_db(conn)? {
        log::info!("Upgraded pre-versioned database to the baseline layout");
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    for migration in &pending {
        conn.execute_batch(migration.sql)
            .map_err(|e| format!("Migration v{} failed: {}", migration.version, e))?;

        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )
        .map_err(|e| format!("Failed to record migration v{}: {}", migration.version, e))?;

        log::info!("Applied migration v{}", migration.version);
    }

    Ok(pending.len())
}
