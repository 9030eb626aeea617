//! Sort direction

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSortOrder(pub String);

impl fmt::Display for InvalidSortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid sort order '{}': expected asc or desc", self.0)
    }
}

impl std::error::Error for InvalidSortOrder {}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Permissive parse used for request parameters: a missing or empty
    /// value and the exact string `asc` sort ascending, anything else
    /// (including `ASC`) sorts descending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some("asc") => SortOrder::Asc,
            Some(_) => SortOrder::Desc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = InvalidSortOrder;

    /// Strict parse: only `asc` and `desc` are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(InvalidSortOrder(s.to_string())),
        }
    }
}
