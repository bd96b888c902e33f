use std::str::FromStr;

use sqlx::{
    Sqlite, SqlitePool, Transaction,
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// Opens the store at `url`, creating the file if needed, and applies migrations.
///
/// In-memory URLs get a single long-lived connection, since every new
/// SQLite connection to `:memory:` would otherwise see an empty database.
pub async fn connect(url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    let pool = pool_options.connect_with(options).await?;
    migrate(&pool).await?;

    Ok(pool)
}

/// Starts a transaction that holds the write lock from its first statement.
///
/// A deferred transaction that reads before writing cannot wait for the lock
/// once another connection commits, and fails with `database is locked`.
/// `BEGIN IMMEDIATE` waits out the busy timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
