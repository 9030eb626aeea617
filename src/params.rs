//! Request parameter parsing
//!
//! Turns raw query-string values into typed values and a [`ListQuery`].
//! Malformed input is a [`ParamError`], which callers report as a 400.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;
use store_object::query_builder::{ListQuery, QueryFilter, SortOrder};
use thiserror::Error;
use type_mapping::SqlValue;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid parameter {name}: {reason}")]
pub struct ParamError {
    pub name: String,
    pub reason: String,
}

impl ParamError {
    fn new(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> u16 {
        400
    }
}

/// Single-value parsers. A missing or empty value yields the default.
pub struct Params;

impl Params {
    pub fn integer(name: &str, value: Option<&str>, default: Option<i64>) -> Result<Option<i64>, ParamError> {
        match present(value) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ParamError::new(name, "could not be parsed as integer")),
        }
    }

    /// Non-negative integer that fits `u32`, as used for `limit` and `page`
    pub fn count(name: &str, value: Option<&str>) -> Result<Option<u32>, ParamError> {
        match Self::integer(name, value, None)? {
            None => Ok(None),
            Some(n) => u32::try_from(n)
                .map(Some)
                .map_err(|_| ParamError::new(name, "must be a non-negative integer")),
        }
    }

    pub fn number(name: &str, value: Option<&str>, default: Option<f64>) -> Result<Option<f64>, ParamError> {
        match present(value) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| ParamError::new(name, "could not be parsed as number")),
        }
    }

    pub fn string(value: Option<&str>, default: Option<&str>) -> Option<String> {
        value.or(default).map(str::to_string)
    }

    /// Only `true` and `false` are accepted
    pub fn boolean(name: &str, value: Option<&str>, default: Option<bool>) -> Result<Option<bool>, ParamError> {
        match present(value) {
            None => Ok(default),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(_) => Err(ParamError::new(name, "expected true or false")),
        }
    }

    /// RFC 3339 timestamp, `YYYY-MM-DD` date or epoch milliseconds
    pub fn timestamp(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ParamError> {
        let Some(raw) = present(value) else {
            return Ok(None);
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Some(dt.and_utc()));
        }
        raw.parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| ParamError::new(name, "is not recognized as a valid date"))
    }

    /// Permissive: anything other than `asc` (or nothing) sorts descending
    pub fn order(value: Option<&str>) -> SortOrder {
        SortOrder::from_param(value)
    }

    /// `where` as a JSON object of column equalities, combined with AND
    pub fn filter(name: &str, value: Option<&str>) -> Result<Option<QueryFilter>, ParamError> {
        let Some(raw) = present(value) else {
            return Ok(None);
        };

        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| ParamError::new(name, format!("is not valid JSON: {}", e)))?;
        let Value::Object(map) = parsed else {
            return Err(ParamError::new(name, "must be a JSON object"));
        };

        let conditions = map
            .into_iter()
            .map(|(column, value)| QueryFilter::eq(&column, SqlValue::Json(value)))
            .collect();
        Ok(Some(QueryFilter::and(conditions)))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parsed `limit`, `page`, `sort`, `order` and `where` parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    /// Left unset so the mapper's default limit applies
    pub limit: Option<u32>,
    pub page: u32,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub filter: Option<QueryFilter>,
}

impl ListParams {
    /// Parse already-decoded query-string pairs; unknown keys are ignored
    pub fn from_query<K, V, I>(pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let query: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| query.get(key).map(String::as_str);

        let limit = match Params::count("limit", get("limit"))? {
            Some(0) => return Err(ParamError::new("limit", "must be at least 1")),
            limit => limit,
        };

        Ok(Self {
            limit,
            page: Params::count("page", get("page"))?.unwrap_or(0),
            sort: present(get("sort")).map(str::to_string),
            order: Params::order(get("order")),
            filter: Params::filter("where", get("where"))?,
        })
    }

    pub fn into_list_query(self) -> ListQuery {
        let mut query = ListQuery::new().page(self.page).order(self.order);
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(sort) = &self.sort {
            query = query.sort(sort);
        }
        if let Some(filter) = self.filter {
            query = query.filter(filter);
        }
        query
    }
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        params.into_list_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer() {
        assert_eq!(Params::integer("limit", Some("25"), None), Ok(Some(25)));
        assert_eq!(Params::integer("limit", None, Some(10)), Ok(Some(10)));
        assert_eq!(Params::integer("limit", Some(""), Some(10)), Ok(Some(10)));

        let err = Params::integer("limit", Some("ten"), None).unwrap_err();
        assert_eq!(err.name, "limit");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_count_rejects_negative() {
        assert_eq!(Params::count("page", Some("3")), Ok(Some(3)));
        assert!(Params::count("page", Some("-1")).is_err());
    }

    #[test]
    fn test_number_and_boolean() {
        assert_eq!(Params::number("ratio", Some("0.5"), None), Ok(Some(0.5)));
        assert!(Params::number("ratio", Some("NaN"), None).is_err());
        assert_eq!(Params::boolean("active", Some("false"), Some(true)), Ok(Some(false)));
        assert_eq!(Params::boolean("active", None, Some(true)), Ok(Some(true)));
        assert!(Params::boolean("active", Some("yes"), None).is_err());
    }

    #[test]
    fn test_string() {
        assert_eq!(Params::string(Some("name"), Some("id")), Some("name".to_string()));
        assert_eq!(Params::string(None, Some("id")), Some("id".to_string()));
        assert_eq!(Params::string(None, None), None);
    }

    #[test]
    fn test_timestamp() {
        let expected = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(Params::timestamp("after", Some("2024-03-01T00:00:00Z")), Ok(Some(expected)));
        assert_eq!(Params::timestamp("after", Some("2024-03-01")), Ok(Some(expected)));
        assert_eq!(
            Params::timestamp("after", Some(&expected.timestamp_millis().to_string())),
            Ok(Some(expected))
        );
        assert!(Params::timestamp("after", Some("last tuesday")).is_err());
    }

    #[test]
    fn test_order_is_permissive() {
        assert_eq!(Params::order(None), SortOrder::Asc);
        assert_eq!(Params::order(Some("asc")), SortOrder::Asc);
        assert_eq!(Params::order(Some("desc")), SortOrder::Desc);
        assert_eq!(Params::order(Some("dsc")), SortOrder::Desc);
        assert_eq!(Params::order(Some("")), SortOrder::Asc);
    }

    #[test]
    fn test_order_only_accepts_literal_asc() {
        assert_eq!(Params::order(Some("ASC")), SortOrder::Desc);
        assert_eq!(Params::order(Some(" asc ")), SortOrder::Desc);
        assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert!("dsc".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_filter() {
        let filter = Params::filter("where", Some(r#"{"species": "mutt", "name": null}"#))
            .unwrap()
            .unwrap();
        match filter {
            QueryFilter::Group { filters, .. } => assert_eq!(filters.len(), 2),
            other => panic!("expected a group, got {:?}", other),
        }

        assert!(Params::filter("where", Some("[1, 2]")).is_err());
        assert!(Params::filter("where", Some("{")).is_err());
        assert_eq!(Params::filter("where", None), Ok(None));
    }

    #[test]
    fn test_list_params() {
        let params = ListParams::from_query([
            ("limit", "5"),
            ("page", "2"),
            ("sort", "name"),
            ("order", "desc"),
            ("where", r#"{"species": "mutt"}"#),
            ("unrelated", "x"),
        ])
        .unwrap();

        assert_eq!(params.limit, Some(5));
        assert_eq!(params.page, 2);
        assert_eq!(params.sort.as_deref(), Some("name"));

        let query = params.into_list_query();
        assert_eq!(query.window(10), Some((5, 10)));
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(
            query.filter,
            Some(QueryFilter::and(vec![QueryFilter::eq(
                "species",
                SqlValue::Json(json!("mutt"))
            )]))
        );
    }

    #[test]
    fn test_list_params_defaults() {
        let query: ListQuery = ListParams::from_query(Vec::<(String, String)>::new())
            .unwrap()
            .into();
        assert_eq!(query, ListQuery::new());
        assert_eq!(query.window(10), Some((10, 0)));

        let err = ListParams::from_query([("limit", "many")]).unwrap_err();
        assert_eq!(err.name, "limit");
    }

    #[test]
    fn test_list_params_reject_zero_limit() {
        let err = ListParams::from_query([("limit", "0")]).unwrap_err();
        assert_eq!(err.name, "limit");
        assert_eq!(err.status(), 400);

        assert_eq!(ListParams::from_query([("page", "0")]).unwrap().page, 0);
    }
}
