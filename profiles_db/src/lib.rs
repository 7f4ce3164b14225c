use profiles_domain::error::AppError;
use profiles_domain::profile::repo::DelegateProfileRepo;
use profiles_domain::user::repo::DelegateUserRepo;

use anyhow::Context;
use entrait::*;
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

pub mod profile;
pub mod user;

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    pub async fn init(url: &str) -> anyhow::Result<Self> {
        if url.contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)
            .context("malformed database_url")?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("could not connect to database_url")?;

        Self::migrate(pool).await
    }

    /// A private database living as long as the pool's single connection.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("could not open in-memory database")?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .context("failed to migrate")?;
        tracing::info!("database schema is up to date");

        Ok(Db { pool })
    }
}

#[entrait]
pub trait GetDb {
    fn get_db(&self) -> &Db;
}

impl GetDb for Db {
    fn get_db(&self) -> &Db {
        self
    }
}

impl DelegateUserRepo<Self> for Db {
    type Target = user::SqliteUserRepo;
}

impl DelegateProfileRepo<Self> for Db {
    type Target = profile::SqliteProfileRepo;
}

trait DbResultExt<T> {
    fn on_error_kind(
        self,
        kind: ErrorKind,
        f: impl FnOnce(Box<dyn DatabaseError>) -> AppError,
    ) -> Result<T, AppError>;
}

impl<T, E> DbResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn on_error_kind(
        self,
        kind: ErrorKind,
        map_err: impl FnOnce(Box<dyn DatabaseError>) -> AppError,
    ) -> Result<T, AppError> {
        self.map_err(|e| match e.into() {
            AppError::Sqlx(sqlx::Error::Database(dbe)) if dbe.kind() == kind => {
                tracing::debug!(constraint = dbe.message(), "mapping constraint violation");
                map_err(dbe)
            }
            e => e,
        })
    }
}

#[cfg(test)]
async fn create_test_db() -> Impl<Db> {
    Impl::new(Db::in_memory().await.expect("failed to create test database"))
}
