//! Write operations, only available to table-backed mappers

use super::core::GenericStore;
use crate::debug_log;
use crate::errors::StoreError;
use crate::id_type::Selector;
use crate::query_builder::{ConflictAction, SqlGenerator, Upsert};
use crate::traits::{Entity, Table};
use crate::values::Values;

impl<T: Entity> GenericStore<T, Table> {
    /// Insert one row and return it as stored
    pub async fn generate(&self, values: Values) -> Result<T, StoreError> {
        self.insert_one(values, None).await
    }

    /// Insert one row with an `ON CONFLICT` clause.
    ///
    /// With `DO NOTHING` a conflicting row is skipped, which surfaces as
    /// `AlreadyExists` since there is no row to return.
    pub async fn generate_with(&self, values: Values, upsert: Upsert) -> Result<T, StoreError> {
        self.insert_one(values, Some(&upsert)).await
    }

    /// Insert several rows in one statement
    pub async fn generate_many(&self, rows: Vec<Values>) -> Result<Vec<T>, StoreError> {
        self.insert_many(rows, None).await
    }

    /// Insert several rows with an `ON CONFLICT` clause; skipped rows are
    /// missing from the result
    pub async fn generate_many_with(
        &self,
        rows: Vec<Values>,
        upsert: Upsert,
    ) -> Result<Vec<T>, StoreError> {
        self.insert_many(rows, Some(&upsert)).await
    }

    /// Partial update returning the updated row.
    ///
    /// An empty patch issues no UPDATE and reads the current row instead.
    /// Fails `NotFound` when nothing matches.
    pub async fn commit(
        &self,
        selector: impl Into<Selector>,
        patch: Values,
    ) -> Result<T, StoreError> {
        let selector = selector.into();
        if patch.is_empty() {
            return self.from(selector).await;
        }

        let filter = self.selector_filter(selector)?;
        let mut qb = SqlGenerator::update(&self.relation, &patch, &filter)?;
        debug_log!("[COMMIT] {}", qb.sql());

        let row = qb
            .build()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| StoreError::from_write(&self.relation.name, "commit", e))?;

        match row {
            Some(row) => self.decode(&row),
            None => Err(StoreError::not_found(&self.relation.name)),
        }
    }

    /// Delete the matching rows, returning how many were removed
    pub async fn delete(&self, selector: impl Into<Selector>) -> Result<u64, StoreError> {
        let filter = self.selector_filter(selector.into())?;
        let mut qb = SqlGenerator::delete(&self.relation, Some(&filter))?;
        debug_log!("[DELETE] {}", qb.sql());

        let result = qb
            .build()
            .execute(&self.db_pool)
            .await
            .map_err(|e| StoreError::from_delete(&self.relation.name, "delete", e))?;

        Ok(result.rows_affected())
    }

    /// Delete every row of the table
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let mut qb = SqlGenerator::delete(&self.relation, None)?;
        debug_log!("[CLEAR] {}", qb.sql());

        let result = qb
            .build()
            .execute(&self.db_pool)
            .await
            .map_err(|e| StoreError::from_delete(&self.relation.name, "clear", e))?;

        Ok(result.rows_affected())
    }

    async fn insert_one(&self, values: Values, upsert: Option<&Upsert>) -> Result<T, StoreError> {
        let mut qb = SqlGenerator::insert(&self.relation, std::slice::from_ref(&values), upsert)?;
        debug_log!("[GENERATE] {}", qb.sql());

        let row = qb
            .build()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| StoreError::from_write(&self.relation.name, "generate", e))?;

        match row {
            Some(row) => self.decode(&row),
            None => Err(StoreError::AlreadyExists {
                relation: self.relation.name.clone(),
                detail: match upsert.map(|u| u.action) {
                    Some(ConflictAction::DoNothing) => "conflicting row was skipped".to_string(),
                    _ => "no row returned".to_string(),
                },
            }),
        }
    }

    async fn insert_many(
        &self,
        rows: Vec<Values>,
        upsert: Option<&Upsert>,
    ) -> Result<Vec<T>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = SqlGenerator::insert(&self.relation, &rows, upsert)?;
        debug_log!("[GENERATE_MANY] {} rows: {}", rows.len(), qb.sql());

        let returned = qb
            .build()
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| StoreError::from_write(&self.relation.name, "generate", e))?;

        returned.iter().map(|row| self.decode(row)).collect()
    }
}
