//! Query predicates
//!
//! A [`QueryFilter`] is a tree of column conditions combined with AND/OR,
//! with [`QueryFilter::Raw`] as an escape hatch for arbitrary SQL.

use type_mapping::{SqlFragment, SqlValue};

/// Query condition operators
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Eq,           // =
    Ne,           // !=
    Gt,           // >
    Gte,          // >=
    Lt,           // <
    Lte,          // <=
    Like,         // LIKE
    ILike,        // ILIKE
    In,           // IN
    NotIn,        // NOT IN
    IsNull,       // IS NULL
    IsNotNull,    // IS NOT NULL
    ArrayOverlap, // &&
}

impl QueryOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::ILike => "ILIKE",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
            QueryOperator::ArrayOverlap => "&&",
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Single(SqlValue),
    List(Vec<SqlValue>),
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub operand: Operand,
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
    Raw(SqlFragment),
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, operand: Operand) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            operand,
        })
    }

    fn single(field: &str, operator: QueryOperator, value: impl Into<SqlValue>) -> Self {
        Self::condition(field, operator, Operand::Single(value.into()))
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// Arbitrary boolean SQL expression
    pub fn raw(fragment: SqlFragment) -> Self {
        Self::Raw(fragment)
    }

    pub fn eq(field: &str, value: impl Into<SqlValue>) -> Self {
        Self::single(field, QueryOperator::Eq, value)
    }

    pub fn ne(field: &str, value: impl Into<SqlValue>) -> Self {
        Self::single(field, QueryOperator::Ne, value)
    }

    pub fn gt(field: &str, value: impl Into<SqlValue>) -> Self {
        Self::single(field, QueryOperator::Gt, value)
    }

    pub fn gte(field: &str, value: impl Into<SqlValue>) -> Self {
        Self::single(field, QueryOperator::Gte, value)
    }

    pub fn lt(field: &str, value: impl Into<SqlValue>) -> Self {
        Self::single(field, QueryOperator::Lt, value)
    }

    pub fn lte(field: &str, value: impl Into<SqlValue>) -> Self {
        Self::single(field, QueryOperator::Lte, value)
    }

    /// LIKE condition
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::single(field, QueryOperator::Like, pattern)
    }

    /// ILIKE condition (case insensitive)
    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::single(field, QueryOperator::ILike, pattern)
    }

    pub fn in_values<V: Into<SqlValue>>(field: &str, values: Vec<V>) -> Self {
        Self::condition(
            field,
            QueryOperator::In,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in_values<V: Into<SqlValue>>(field: &str, values: Vec<V>) -> Self {
        Self::condition(
            field,
            QueryOperator::NotIn,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, Operand::None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, Operand::None)
    }

    /// Array column shares at least one element with `values`
    pub fn overlaps(field: &str, values: serde_json::Value) -> Self {
        Self::single(field, QueryOperator::ArrayOverlap, values)
    }
}
