use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row as _};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::id_type::Selector;
use crate::ident::validate_ident;
use crate::query_builder::{ListQuery, QueryDefaults, QueryFilter, SortOrder, ROW_COLUMN};
use crate::schema::{RelationSchema, SchemaCatalog};
use crate::traits::{Backing, Entity, Table};

/// Untyped row: column name to JSON value
pub type Row = Map<String, Value>;

/// Mapper over one table or view.
///
/// `T` is the entity rows decode into and `B` fixes whether the relation is
/// a [`Table`] or a [`crate::traits::View`]. Write operations only exist for
/// table-backed mappers.
pub struct GenericStore<T = Row, B: Backing = Table> {
    pub(crate) db_pool: PgPool,
    pub(crate) relation: Arc<RelationSchema>,
    pub(crate) key_column: Option<String>,
    pub(crate) defaults: QueryDefaults,
    pub(crate) _phantom: PhantomData<fn() -> (T, B)>,
}

impl<T, B: Backing> Clone for GenericStore<T, B> {
    fn clone(&self) -> Self {
        Self {
            db_pool: self.db_pool.clone(),
            relation: Arc::clone(&self.relation),
            key_column: self.key_column.clone(),
            defaults: self.defaults,
            _phantom: PhantomData,
        }
    }
}

impl<T, B: Backing> std::fmt::Debug for GenericStore<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericStore")
            .field("kind", &B::KIND.as_str())
            .field("relation", &self.relation.name)
            .field("key_column", &self.key_column)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl<T: Entity, B: Backing> GenericStore<T, B> {
    /// Bind a mapper to relation `name` of the catalog.
    ///
    /// Fails with `SchemaMissing` when the catalog has no relation of kind
    /// `B` under that name.
    pub fn new(db_pool: PgPool, catalog: &SchemaCatalog, name: &str) -> Result<Self, StoreError> {
        validate_ident(name)
            .map_err(|e| StoreError::SchemaMissing(format!("{}: {}", name, e)))?;

        let relation = catalog.relation(B::KIND, name).ok_or_else(|| {
            StoreError::SchemaMissing(format!("{} {} does not exist", B::KIND.as_str(), name))
        })?;

        Ok(Self::from_relation(db_pool, relation))
    }

    pub fn from_relation(db_pool: PgPool, relation: Arc<RelationSchema>) -> Self {
        Self {
            db_pool,
            relation,
            key_column: None,
            defaults: QueryDefaults::default(),
            _phantom: PhantomData,
        }
    }

    /// Use `column` instead of the primary key for `Selector::Key`
    pub fn with_key_column(mut self, column: &str) -> Result<Self, StoreError> {
        self.relation.require_column(column)?;
        self.key_column = Some(column.to_string());
        Ok(self)
    }

    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn relation(&self) -> &RelationSchema {
        &self.relation
    }

    pub fn table_name(&self) -> &str {
        &self.relation.name
    }

    /// Explicit key column, else the primary key
    pub fn key_column(&self) -> Option<&str> {
        self.key_column
            .as_deref()
            .or(self.relation.primary_key.as_deref())
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }

    pub fn defaults(&self) -> QueryDefaults {
        self.defaults
    }

    pub(crate) fn key_column_or_err(&self) -> Result<&str, StoreError> {
        self.key_column().ok_or_else(|| {
            StoreError::SchemaMissing(format!(
                "{} has no primary key; set a key column",
                self.relation.name
            ))
        })
    }

    pub(crate) fn selector_filter(&self, selector: Selector) -> Result<QueryFilter, StoreError> {
        match selector {
            Selector::Key(id) => Ok(QueryFilter::eq(self.key_column_or_err()?, id)),
            Selector::Column { column, id } => Ok(QueryFilter::eq(&column, id)),
            Selector::Where(filter) => Ok(filter),
        }
    }

    /// Requested sort column, else the key, else the first column.
    /// Sorting on a non-key column adds the key as a tie-breaker.
    pub(crate) fn ordering(&self, query: &ListQuery) -> Vec<(String, SortOrder)> {
        let key = self.key_column();
        let primary = query
            .sort
            .as_deref()
            .or(key)
            .or_else(|| self.relation.columns().first().map(|c| c.name.as_str()));

        let mut ordering = Vec::with_capacity(2);
        if let Some(column) = primary {
            ordering.push((column.to_string(), query.order));
            if let Some(key) = key.filter(|key| *key != column) {
                ordering.push((key.to_string(), query.order));
            }
        }
        ordering
    }

    pub(crate) fn decode(&self, row: &PgRow) -> Result<T, StoreError> {
        let value: Value = row
            .try_get(ROW_COLUMN)
            .map_err(|e| StoreError::database_operation(&self.relation.name, "decode", e))?;
        Ok(serde_json::from_value(value)?)
    }
}
