//! Statement generation
//!
//! Every statement is assembled in a `sqlx::QueryBuilder`: identifiers are
//! quoted, values are pushed as bind parameters through the value codec.
//! Rows come back as a single `jsonb` column so that any relation can be
//! decoded into any deserializable entity type.

use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use type_mapping::{BindValue, FragmentPart, SqlFragment, SqlValue};

use super::filter::{LogicalOperator, Operand, QueryCondition, QueryFilter, QueryOperator};
use super::ordering::SortOrder;
use crate::codec::ValueCodec;
use crate::errors::StoreError;
use crate::ident::{quote_ident, quote_qualified};
use crate::schema::RelationSchema;
use crate::values::Values;

/// Table alias used by generated statements
pub const ROW_ALIAS: &str = "__generic";
/// Output column holding the row as `jsonb`
pub const ROW_COLUMN: &str = "__row";
/// Output column holding the window count
pub const COUNT_COLUMN: &str = "__count";

/// What to do when an insert hits a unique constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    DoNothing,
    /// Overwrite every inserted non-target column from the excluded row
    DoUpdate,
}

/// Upsert clause for inserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub action: ConflictAction,
    /// Conflict target columns; the primary key when `None`
    pub target: Option<Vec<String>>,
}

impl Upsert {
    pub fn do_nothing() -> Self {
        Self {
            action: ConflictAction::DoNothing,
            target: None,
        }
    }

    pub fn do_update() -> Self {
        Self {
            action: ConflictAction::DoUpdate,
            target: None,
        }
    }

    pub fn on(mut self, columns: &[&str]) -> Self {
        self.target = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }
}

pub struct SqlGenerator;

impl SqlGenerator {
    /// `SELECT count(*) OVER(), row ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn select_list(
        relation: &RelationSchema,
        filter: Option<&QueryFilter>,
        ordering: &[(String, SortOrder)],
        window: Option<(i64, i64)>,
    ) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT count(*) OVER() AS {}, to_jsonb({}.*) AS {} FROM {}",
            quote_ident(COUNT_COLUMN),
            quote_ident(ROW_ALIAS),
            quote_ident(ROW_COLUMN),
            Self::aliased(relation)
        ));

        Self::push_where(&mut qb, relation, filter)?;
        Self::push_order_by(&mut qb, relation, ordering)?;

        if let Some((limit, offset)) = window {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
            qb.push(" OFFSET ");
            qb.push_bind(offset);
        }

        Ok(qb)
    }

    /// `SELECT row ... WHERE ... LIMIT 1`
    pub fn select_one(
        relation: &RelationSchema,
        filter: &QueryFilter,
    ) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT to_jsonb({}.*) AS {} FROM {}",
            quote_ident(ROW_ALIAS),
            quote_ident(ROW_COLUMN),
            Self::aliased(relation)
        ));
        Self::push_where(&mut qb, relation, Some(filter))?;
        qb.push(" LIMIT 1");
        Ok(qb)
    }

    /// `SELECT count(*) ... WHERE ...`
    pub fn select_count(
        relation: &RelationSchema,
        filter: Option<&QueryFilter>,
    ) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT count(*) AS {} FROM {}",
            quote_ident(COUNT_COLUMN),
            Self::aliased(relation)
        ));
        Self::push_where(&mut qb, relation, filter)?;
        Ok(qb)
    }

    /// Single or multi-row `INSERT ... RETURNING`.
    ///
    /// The column list is the union of all rows' columns in first-seen order;
    /// rows missing a column insert `DEFAULT` for it.
    pub fn insert(
        relation: &RelationSchema,
        rows: &[Values],
        upsert: Option<&Upsert>,
    ) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        if rows.is_empty() {
            return Err(StoreError::InvalidValue {
                column: relation.name.clone(),
                reason: "nothing to insert".to_string(),
            });
        }

        let mut columns: Vec<&str> = Vec::new();
        for row in rows {
            for column in row.columns() {
                if !columns.contains(&column) {
                    relation.require_column(column)?;
                    columns.push(column);
                }
            }
        }

        let mut qb = QueryBuilder::new(format!("INSERT INTO {}", Self::aliased(relation)));

        if columns.is_empty() {
            if rows.len() > 1 {
                return Err(StoreError::InvalidValue {
                    column: relation.name.clone(),
                    reason: "multi-row insert needs at least one column".to_string(),
                });
            }
            qb.push(" DEFAULT VALUES");
        } else {
            let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
            qb.push(format!(" ({}) VALUES ", quoted.join(", ")));

            for (row_index, row) in rows.iter().enumerate() {
                if row_index > 0 {
                    qb.push(", ");
                }
                qb.push("(");
                for (column_index, column) in columns.iter().enumerate() {
                    if column_index > 0 {
                        qb.push(", ");
                    }
                    match row.get(column) {
                        Some(value) => {
                            let fragment = ValueCodec::encode(
                                &relation.column_id(column),
                                relation.column(column),
                                value,
                            )?;
                            Self::push_fragment(&mut qb, &fragment);
                        }
                        None => {
                            qb.push("DEFAULT");
                        }
                    }
                }
                qb.push(")");
            }
        }

        if let Some(upsert) = upsert {
            Self::push_upsert(&mut qb, relation, &columns, upsert)?;
        }

        Self::push_returning(&mut qb);
        Ok(qb)
    }

    /// `UPDATE ... SET ... WHERE ... RETURNING`
    pub fn update(
        relation: &RelationSchema,
        patch: &Values,
        filter: &QueryFilter,
    ) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::InvalidValue {
                column: relation.name.clone(),
                reason: "empty patch".to_string(),
            });
        }

        let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", Self::aliased(relation)));
        for (index, (column, value)) in patch.iter().enumerate() {
            if index > 0 {
                qb.push(", ");
            }
            let fragment =
                ValueCodec::encode(&relation.column_id(column), relation.column(column), value)?;
            qb.push(format!("{} = ", quote_ident(column)));
            Self::push_fragment(&mut qb, &fragment);
        }

        Self::push_where(&mut qb, relation, Some(filter))?;
        Self::push_returning(&mut qb);
        Ok(qb)
    }

    /// `DELETE FROM ... [WHERE ...]`
    pub fn delete(
        relation: &RelationSchema,
        filter: Option<&QueryFilter>,
    ) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        let mut qb = QueryBuilder::new(format!(
            "DELETE FROM {}",
            quote_qualified(&relation.namespace, &relation.name)
        ));
        Self::push_where(&mut qb, relation, filter)?;
        Ok(qb)
    }

    /// Splice a fragment into a statement, binding its parameters in order
    pub fn push_fragment<'args>(qb: &mut QueryBuilder<'args, Postgres>, fragment: &SqlFragment) {
        for part in fragment.parts() {
            match part {
                FragmentPart::Sql(sql) => {
                    qb.push(sql);
                }
                FragmentPart::Bind(value) => Self::push_bind_value(qb, value.clone()),
            }
        }
    }

    pub fn push_bind_value<'args>(qb: &mut QueryBuilder<'args, Postgres>, value: BindValue) {
        match value {
            BindValue::Text(v) => qb.push_bind(v),
            BindValue::TextArray(v) => qb.push_bind(v),
            BindValue::Integer(v) => qb.push_bind(v),
            BindValue::BigInt(v) => qb.push_bind(v),
            BindValue::Float(v) => qb.push_bind(v),
            BindValue::Boolean(v) => qb.push_bind(v),
            BindValue::Uuid(v) => qb.push_bind(v),
            BindValue::Timestamp(v) => qb.push_bind(v),
            BindValue::Json(v) => qb.push_bind(sqlx::types::Json(v)),
        };
    }

    fn aliased(relation: &RelationSchema) -> String {
        format!(
            "{} AS {}",
            quote_qualified(&relation.namespace, &relation.name),
            quote_ident(ROW_ALIAS)
        )
    }

    fn push_returning(qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(format!(
            " RETURNING to_jsonb({}.*) AS {}",
            quote_ident(ROW_ALIAS),
            quote_ident(ROW_COLUMN)
        ));
    }

    fn push_where(
        qb: &mut QueryBuilder<'static, Postgres>,
        relation: &RelationSchema,
        filter: Option<&QueryFilter>,
    ) -> Result<(), StoreError> {
        if let Some(filter) = filter {
            qb.push(" WHERE ");
            Self::push_filter(qb, relation, filter)?;
        }
        Ok(())
    }

    fn push_order_by(
        qb: &mut QueryBuilder<'static, Postgres>,
        relation: &RelationSchema,
        ordering: &[(String, SortOrder)],
    ) -> Result<(), StoreError> {
        if ordering.is_empty() {
            return Ok(());
        }
        let mut terms = Vec::with_capacity(ordering.len());
        for (column, order) in ordering {
            relation.require_column(column)?;
            terms.push(format!("{} {}", quote_ident(column), order.to_sql()));
        }
        qb.push(format!(" ORDER BY {}", terms.join(", ")));
        Ok(())
    }

    fn push_upsert(
        qb: &mut QueryBuilder<'static, Postgres>,
        relation: &RelationSchema,
        columns: &[&str],
        upsert: &Upsert,
    ) -> Result<(), StoreError> {
        let target: Vec<String> = match &upsert.target {
            Some(target) if !target.is_empty() => target.clone(),
            _ => vec![relation.primary_key.clone().ok_or_else(|| {
                StoreError::SchemaMissing(format!(
                    "{} has no primary key to use as conflict target",
                    relation.name
                ))
            })?],
        };
        for column in &target {
            relation.require_column(column)?;
        }

        let quoted: Vec<String> = target.iter().map(|c| quote_ident(c)).collect();
        qb.push(format!(" ON CONFLICT ({})", quoted.join(", ")));

        match upsert.action {
            ConflictAction::DoNothing => {
                qb.push(" DO NOTHING");
            }
            ConflictAction::DoUpdate => {
                let mut assignments: Vec<String> = columns
                    .iter()
                    .filter(|c| !target.iter().any(|t| t.as_str() == **c))
                    .map(|c| format!("{0} = EXCLUDED.{0}", quote_ident(c)))
                    .collect();
                // Touch a target column so the conflicting row is still returned
                if assignments.is_empty() {
                    assignments.push(format!("{0} = EXCLUDED.{0}", quote_ident(&target[0])));
                }
                qb.push(format!(" DO UPDATE SET {}", assignments.join(", ")));
            }
        }
        Ok(())
    }

    fn push_filter(
        qb: &mut QueryBuilder<'static, Postgres>,
        relation: &RelationSchema,
        filter: &QueryFilter,
    ) -> Result<(), StoreError> {
        match filter {
            QueryFilter::Condition(condition) => Self::push_condition(qb, relation, condition),
            QueryFilter::Group { operator, filters } => {
                if filters.is_empty() {
                    qb.push(match operator {
                        LogicalOperator::And => "TRUE",
                        LogicalOperator::Or => "FALSE",
                    });
                    return Ok(());
                }
                let joiner = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };
                qb.push("(");
                for (index, inner) in filters.iter().enumerate() {
                    if index > 0 {
                        qb.push(joiner);
                    }
                    Self::push_filter(qb, relation, inner)?;
                }
                qb.push(")");
                Ok(())
            }
            QueryFilter::Raw(fragment) => {
                qb.push("(");
                Self::push_fragment(qb, fragment);
                qb.push(")");
                Ok(())
            }
        }
    }

    fn push_condition(
        qb: &mut QueryBuilder<'static, Postgres>,
        relation: &RelationSchema,
        condition: &QueryCondition,
    ) -> Result<(), StoreError> {
        let descriptor = relation.require_column(&condition.field)?;
        let column_id = relation.column_id(&condition.field);
        let column = quote_ident(&condition.field);
        let operator = &condition.operator;

        match (operator, &condition.operand) {
            (QueryOperator::IsNull, _) => {
                qb.push(format!("{} IS NULL", column));
            }
            (QueryOperator::IsNotNull, _) => {
                qb.push(format!("{} IS NOT NULL", column));
            }
            (QueryOperator::Eq, Operand::Single(value)) if value.is_null() => {
                qb.push(format!("{} IS NULL", column));
            }
            (QueryOperator::Ne, Operand::Single(value)) if value.is_null() => {
                qb.push(format!("{} IS NOT NULL", column));
            }
            (QueryOperator::Like | QueryOperator::ILike, Operand::Single(value)) => {
                let pattern = match value {
                    SqlValue::Json(Value::String(pattern)) => pattern.clone(),
                    SqlValue::Json(other) => other.to_string(),
                    _ => {
                        return Err(StoreError::InvalidValue {
                            column: column_id,
                            reason: format!("{} needs a text pattern", operator.to_sql()),
                        })
                    }
                };
                qb.push(format!("CAST({} AS text) {} ", column, operator.to_sql()));
                qb.push_bind(pattern);
            }
            (QueryOperator::In | QueryOperator::NotIn, Operand::List(values)) => {
                if values.is_empty() {
                    qb.push(if *operator == QueryOperator::In { "FALSE" } else { "TRUE" });
                    return Ok(());
                }
                qb.push(format!("{} {} (", column, operator.to_sql()));
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        qb.push(", ");
                    }
                    let fragment = ValueCodec::encode(&column_id, Some(descriptor), value)?;
                    Self::push_fragment(qb, &fragment);
                }
                qb.push(")");
            }
            (
                QueryOperator::Eq
                | QueryOperator::Ne
                | QueryOperator::Gt
                | QueryOperator::Gte
                | QueryOperator::Lt
                | QueryOperator::Lte
                | QueryOperator::ArrayOverlap,
                Operand::Single(value),
            ) => {
                let fragment = ValueCodec::encode(&column_id, Some(descriptor), value)?;
                qb.push(format!("{} {} ", column, operator.to_sql()));
                Self::push_fragment(qb, &fragment);
            }
            _ => {
                return Err(StoreError::InvalidValue {
                    column: column_id,
                    reason: format!("operand does not fit operator {}", operator.to_sql()),
                })
            }
        }
        Ok(())
    }
}
