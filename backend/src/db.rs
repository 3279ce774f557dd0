use anyhow::Result;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

/// A request-scoped handle to the database.
///
/// The underlying connection goes back to the pool when the session is dropped,
/// so every exit path of a handler releases it.
pub type Session = PoolConnection<Sqlite>;

/// DbConnection owns the connection pool and the schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        Self::init_test_with_capacity(5).await
    }

    /// Initialize a test database whose pool holds at most `max_connections`
    #[cfg(test)]
    pub async fn init_test_with_capacity(max_connections: u32) -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url, max_connections).await
    }

    /// Create the students table if it is missing. Never drops or alters data.
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // AUTOINCREMENT keeps SQLite from handing out the id of a deleted row again
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                address TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check out one connection for the lifetime of a request
    pub async fn session(&self) -> Result<Session, sqlx::Error> {
        self.pool.acquire().await
    }
}
