use contracts::domain::a001_cartridge::Cartridge;
use contracts::domain::a002_cartridge_replacement::CartridgeReplacement;
use contracts::domain::a003_service_batch::ServiceBatch;
use contracts::domain::common::AggregateRoot;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

fn build_sqlite_url(path: &Path) -> String {
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode=rwc", prefix, normalized)
}

/// Открыть файл БД (создается при отсутствии) и подготовить схему
pub async fn initialize_database(db_path: &str) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let absolute_path = if Path::new(db_path).is_absolute() {
        std::path::PathBuf::from(db_path)
    } else {
        std::env::current_dir()?.join(db_path)
    };
    let db_url = build_sqlite_url(&absolute_path);
    tracing::info!("Opening database {}", absolute_path.display());

    let conn = Database::connect(&db_url).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// БД в памяти для тестов
///
/// Одно соединение: у каждого соединения `sqlite::memory:` своя база.
#[cfg(test)]
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

async fn table_exists<C: ConnectionTrait>(conn: &C, table_name: &str) -> anyhow::Result<bool> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?;",
            [table_name.into()],
        ))
        .await?;
    Ok(!rows.is_empty())
}

async fn ensure_table<C: ConnectionTrait>(
    conn: &C,
    table_name: &str,
    create_sql: &str,
) -> anyhow::Result<()> {
    if table_exists(conn, table_name).await? {
        return Ok(());
    }
    tracing::info!("Creating {} table", table_name);
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        create_sql.to_string(),
    ))
    .await?;
    Ok(())
}

async fn execute_all<C: ConnectionTrait>(conn: &C, statements: &[String]) -> anyhow::Result<()> {
    for sql in statements {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.clone()))
            .await?;
    }
    Ok(())
}

/// Создать недостающие таблицы и индексы
pub async fn bootstrap_schema<C: ConnectionTrait>(conn: &C) -> anyhow::Result<()> {
    let cartridge_table = Cartridge::full_name();
    ensure_table(
        conn,
        &cartridge_table,
        &format!(
            r#"
            CREATE TABLE {cartridge_table} (
                id TEXT PRIMARY KEY NOT NULL,
                number TEXT NOT NULL,
                model TEXT NOT NULL,
                status TEXT NOT NULL,
                return_date TEXT,
                return_responsible TEXT,
                comment TEXT,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
            "#
        ),
    )
    .await?;

    let status_log_table = Cartridge::child_table("status_log");
    ensure_table(
        conn,
        &status_log_table,
        &format!(
            r#"
            CREATE TABLE {status_log_table} (
                id TEXT PRIMARY KEY NOT NULL,
                cartridge_id TEXT NOT NULL,
                from_status TEXT NOT NULL,
                to_status TEXT NOT NULL,
                source TEXT NOT NULL,
                changed_at TEXT NOT NULL
            );
            "#
        ),
    )
    .await?;

    let replacement_table = CartridgeReplacement::full_name();
    ensure_table(
        conn,
        &replacement_table,
        &format!(
            r#"
            CREATE TABLE {replacement_table} (
                id TEXT PRIMARY KEY NOT NULL,
                date TEXT NOT NULL,
                department TEXT NOT NULL,
                installed_cartridge_number TEXT NOT NULL,
                removed_cartridge_number TEXT NOT NULL,
                responsible TEXT NOT NULL,
                comment TEXT,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
            "#
        ),
    )
    .await?;

    let batch_table = ServiceBatch::full_name();
    ensure_table(
        conn,
        &batch_table,
        &format!(
            r#"
            CREATE TABLE {batch_table} (
                id TEXT PRIMARY KEY NOT NULL,
                batch_number TEXT NOT NULL,
                date TEXT NOT NULL,
                responsible TEXT NOT NULL,
                notes TEXT,
                status TEXT NOT NULL,
                cartridges_json TEXT NOT NULL DEFAULT '[]',
                returned_cartridges_json TEXT NOT NULL DEFAULT '[]',
                partial_return_date TEXT,
                partial_return_responsible TEXT,
                cartridge_returns_json TEXT NOT NULL DEFAULT '[]',
                comment TEXT,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
            "#
        ),
    )
    .await?;

    execute_all(
        conn,
        &[
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{0}_number ON {0} (number);",
                cartridge_table
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_cartridge ON {0} (cartridge_id, changed_at);",
                status_log_table
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{0}_batch_number ON {0} (batch_number);",
                batch_table
            ),
        ],
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_creates_all_tables_and_is_idempotent() {
        let conn = connect_in_memory().await.unwrap();
        // повторный запуск ничего не ломает
        bootstrap_schema(&conn).await.unwrap();

        for table in [
            "a001_cartridge",
            "a001_cartridge_status_log",
            "a002_cartridge_replacement",
            "a003_service_batch",
        ] {
            assert!(table_exists(&conn, table).await.unwrap(), "{}", table);
        }
    }

    #[test]
    fn test_sqlite_url_for_windows_path() {
        let url = build_sqlite_url(Path::new("C:\\data\\cartridges.db"));
        assert_eq!(url, "sqlite:///C:/data/cartridges.db?mode=rwc");
    }
}
