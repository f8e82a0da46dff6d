use crate::error::CoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::time::Duration;

pub type DbPool = SqlitePool;

/// Open (creating if necessary) the database at `database_url` and run any
/// pending migrations.
///
/// The pool is deliberately small: SQLite serializes writers anyway, and a
/// handful of connections is enough for the interactive path plus the
/// daemon's scan worker. WAL mode lets readers proceed while the single
/// writer holds its lock.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, CoreError> {
    let options = SqliteConnectOptions::new()
        .filename(database_url)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
