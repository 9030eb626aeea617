//! Core pg-generic functionality
//!
//! [`PgGeneric`] owns the connection pool and the introspected schema
//! catalog, and hands out mappers bound to that catalog.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use store_object::query_builder::QueryDefaults;
use store_object::traits::{Entity, Table, View};
use store_object::{GenericStore, SchemaCatalog, SchemaIntrospector, StoreError};

use crate::errors::PgGenericError;
use crate::schema_files;
use config::{AppConfig, DatabaseConfig, QueryConfig, SchemaConfig};

/// Connection pool plus cached schema catalog
pub struct PgGeneric {
    pool: PgPool,
    introspector: SchemaIntrospector,
    catalog: RwLock<Arc<SchemaCatalog>>,
    schema_config: SchemaConfig,
    query_defaults: QueryDefaults,
}

impl std::fmt::Debug for PgGeneric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgGeneric")
            .field("namespace", &self.introspector.namespace())
            .field("relations", &self.catalog().len())
            .field("query_defaults", &self.query_defaults)
            .finish()
    }
}

impl PgGeneric {
    /// Connect with retries, then introspect the configured namespace
    pub async fn connect(config: &AppConfig) -> Result<Self, PgGenericError> {
        let pool = connect_pool(&config.database).await?;
        Self::from_pool(pool, config).await
    }

    /// Use an existing pool; introspects immediately
    pub async fn from_pool(pool: PgPool, config: &AppConfig) -> Result<Self, PgGenericError> {
        let introspector = SchemaIntrospector::new(&config.schema.namespace)
            .with_excluded(config.schema.excluded_relations.clone());
        let catalog = introspector.introspect(&pool).await?;
        tracing::info!(
            "Introspected {} relations in schema {}",
            catalog.len(),
            introspector.namespace()
        );

        let generic = Self {
            pool,
            introspector,
            catalog: RwLock::new(Arc::new(catalog)),
            schema_config: config.schema.clone(),
            query_defaults: query_defaults(&config.query),
        };
        generic.write_configured_schemas().await?;
        Ok(generic)
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Snapshot of the current catalog
    pub fn catalog(&self) -> Arc<SchemaCatalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        self.query_defaults
    }

    /// Re-read the catalog and replace the cached one.
    ///
    /// Mappers created earlier keep the relation they were built with.
    pub async fn refresh_schema(&self) -> Result<Arc<SchemaCatalog>, PgGenericError> {
        let catalog = Arc::new(self.introspector.introspect(&self.pool).await?);
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&catalog);
        tracing::info!("Schema refreshed: {} relations", catalog.len());

        self.write_configured_schemas().await?;
        Ok(catalog)
    }

    /// Write JSON-Schema files for the current catalog into `dir`
    pub async fn write_json_schemas(&self, dir: impl AsRef<Path>) -> Result<(), PgGenericError> {
        schema_files::write_schemas(dir.as_ref(), &self.catalog()).await
    }

    /// Mapper over table `name`
    pub fn table<T: Entity>(&self, name: &str) -> Result<GenericStore<T, Table>, StoreError> {
        Ok(GenericStore::new(self.pool.clone(), &self.catalog(), name)?
            .with_defaults(self.query_defaults))
    }

    /// Read-only mapper over view `name`
    pub fn view<T: Entity>(&self, name: &str) -> Result<GenericStore<T, View>, StoreError> {
        Ok(GenericStore::new(self.pool.clone(), &self.catalog(), name)?
            .with_defaults(self.query_defaults))
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), PgGenericError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn write_configured_schemas(&self) -> Result<(), PgGenericError> {
        match &self.schema_config.json_schema_dir {
            Some(dir) => self.write_json_schemas(dir).await,
            None => Ok(()),
        }
    }
}

/// Open a pool, retrying `connect_retries` times with a fixed backoff
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, PgGenericError> {
    let connection_string = config.connection_string();

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

    // Set max lifetime if specified
    if config.max_lifetime_seconds > 0 {
        pool_options = pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
    }

    let attempts = config.connect_retries.saturating_add(1);
    let backoff = Duration::from_secs(config.retry_backoff_seconds);
    let mut attempt = 1;

    loop {
        match pool_options.clone().connect(&connection_string).await {
            Ok(pool) => {
                tracing::info!("Connected to database after {} attempt(s)", attempt);
                return Ok(pool);
            }
            Err(error) if attempt < attempts => {
                tracing::warn!(
                    "Database connection attempt {}/{} failed: {}; retrying in {}s",
                    attempt,
                    attempts,
                    error,
                    backoff.as_secs()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(source) => {
                return Err(PgGenericError::ConnectRetriesExhausted { attempts, source });
            }
        }
    }
}

fn query_defaults(config: &QueryConfig) -> QueryDefaults {
    QueryDefaults {
        list_limit: config.default_limit,
        iterate_page_size: config.iterate_page_size,
        stream_buffer: config.stream_buffer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_follow_config() {
        let defaults = query_defaults(&QueryConfig {
            default_limit: 25,
            iterate_page_size: 50,
            stream_buffer: 8,
        });
        assert_eq!(defaults.list_limit, 25);
        assert_eq!(defaults.iterate_page_size, 50);
        assert_eq!(defaults.stream_buffer, 8);
        assert_eq!(query_defaults(&QueryConfig::default()), QueryDefaults::default());
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_retry_budget() {
        let mut config = DatabaseConfig::from_url("postgresql://postgres@127.0.0.1:1/none")
            .with_retries(1, 0);
        config.connection_timeout_seconds = 1;

        let err = connect_pool(&config).await.unwrap_err();
        assert!(matches!(
            err,
            PgGenericError::ConnectRetriesExhausted { attempts: 2, .. }
        ));
    }
}
