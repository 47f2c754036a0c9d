#[macro_use]
extern crate tracing;

mod models;
pub mod seed;

use std::str::FromStr;
use std::sync::Arc;

pub use models::*;

use greencampus_dependencies::moka::future::Cache;
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

pub type DBPool = SqlitePool;
pub type Db = PoolConnection<Sqlite>;
pub type DbConn = sqlx::SqliteConnection;
pub type TxOwned<'a> = sqlx::Transaction<'a, Sqlite>;

pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Other error: {}", .0)]
    Other(String),
    #[error("Error in underlying datamodel: {}", .0)]
    SQLx(#[from] sqlx::Error),
    #[error("Could not migrate datamodel: {}", .0)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Unknown attempt status {:?}", .0)]
    InvalidStatus(String),
}

impl From<Arc<ModelError>> for ModelError {
    fn from(v: Arc<ModelError>) -> Self {
        Self::Other(v.to_string())
    }
}

/// Handle on the local data store.
///
/// Cloning is cheap, all clones share the same pool and mission cache.
#[derive(Clone)]
pub struct Client {
    db: DBPool,
    cache_missions: Cache<String, Option<Mission>>,
}

impl Client {
    pub fn new(db: DBPool) -> Self {
        debug!("Creating new Database Client");
        Self {
            db,
            cache_missions: Cache::new(256),
        }
    }

    /// Opens (and creates if missing) the SQLite database at `database_url`.
    /// In-memory URLs get a single, never recycled connection.
    pub async fn connect(database_url: &str) -> Result<Self, ModelError> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = if database_url.contains(":memory:") {
            // a second connection would open a second, empty database
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        Ok(Self::new(pool.connect_with(opts).await?))
    }

    /// A migrated, private in-memory store. Every call returns a fresh database.
    pub async fn in_memory() -> Result<Self, ModelError> {
        let client = Self::connect("sqlite::memory:").await?;
        client.migrate().await?;
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), ModelError> {
        info!("Migrating database");
        MIGRATOR.run(&self.db).await?;
        Ok(())
    }

    pub async fn db(&self) -> Result<Db, ModelError> {
        Ok(self.db.acquire().await?)
    }

    pub async fn begin(&self) -> Result<TxOwned<'static>, ModelError> {
        Ok(self.db.begin().await?)
    }

    /// Catalog lookup through the in-process cache. Missing missions are cached too,
    /// the catalog only changes through [`Client::replace_catalog`].
    pub async fn mission(&self, id: &str) -> Result<Option<Mission>, ModelError> {
        let db = self.db.clone();
        let key = id.to_string();
        let mission = self
            .cache_missions
            .try_get_with(key.clone(), async move {
                let mut conn = db.acquire().await?;
                Mission::get_id(&mut conn, &key).await
            })
            .await?;
        Ok(mission)
    }

    /// Replaces the whole mission catalog in one transaction and drops cached lookups.
    #[instrument(skip(self, missions), fields(count = missions.len()))]
    pub async fn replace_catalog(&self, missions: &[Mission]) -> Result<(), ModelError> {
        let mut tx = self.begin().await?;
        Mission::clear(&mut tx).await?;
        for (position, mission) in missions.iter().enumerate() {
            mission.insert(&mut tx, position as i64).await?;
        }
        tx.commit().await?;
        self.cache_missions.invalidate_all();
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("db", &self.db).finish()
    }
}
