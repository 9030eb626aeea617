//! Parameterized SQL fragments
//!
//! A [`SqlFragment`] is SQL text interleaved with bound values. Fragments are
//! produced by the value codec and can also be written by hand as an escape
//! hatch, e.g. `SqlFragment::raw("NOW() + $1::interval", ["5 minutes"])`.
//! Placeholders are local to the fragment and renumbered when the fragment is
//! spliced into a statement.

use std::fmt;
use thiserror::Error;

use crate::types::BindValue;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FragmentError {
    #[error("Placeholder ${index} has no parameter ({available} supplied)")]
    PlaceholderOutOfRange { index: usize, available: usize },
    #[error("Placeholders are numbered from $1")]
    ZeroPlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentPart {
    Sql(String),
    Bind(BindValue),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    parts: Vec<FragmentPart>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment made of SQL text alone
    pub fn literal(sql: impl Into<String>) -> Self {
        Self::new().sql(sql)
    }

    /// Parse SQL text containing `$1`..`$n` placeholders.
    ///
    /// Placeholders inside single-quoted literals and double-quoted
    /// identifiers are left untouched. A placeholder may be used more than
    /// once; each use binds its own copy of the parameter.
    pub fn raw<I, V>(sql: &str, params: I) -> Result<Self, FragmentError>
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        let params: Vec<BindValue> = params.into_iter().map(Into::into).collect();
        let mut fragment = Self::new();
        let mut text = String::new();
        let mut chars = sql.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                    text.push(c);
                }
                None if c == '\'' || c == '"' => {
                    quote = Some(c);
                    text.push(c);
                }
                None if c == '$' && chars.peek().is_some_and(|n| n.is_ascii_digit()) => {
                    let mut digits = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        digits.push(d);
                        chars.next();
                    }
                    let index: usize = digits.parse().map_err(|_| {
                        FragmentError::PlaceholderOutOfRange {
                            index: usize::MAX,
                            available: params.len(),
                        }
                    })?;
                    if index == 0 {
                        return Err(FragmentError::ZeroPlaceholder);
                    }
                    let param = params.get(index - 1).cloned().ok_or(
                        FragmentError::PlaceholderOutOfRange {
                            index,
                            available: params.len(),
                        },
                    )?;
                    if !text.is_empty() {
                        fragment.parts.push(FragmentPart::Sql(std::mem::take(&mut text)));
                    }
                    fragment.parts.push(FragmentPart::Bind(param));
                }
                None => text.push(c),
            }
        }

        if !text.is_empty() {
            fragment.parts.push(FragmentPart::Sql(text));
        }
        Ok(fragment)
    }

    /// Append SQL text
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        if let Some(FragmentPart::Sql(last)) = self.parts.last_mut() {
            last.push_str(&sql);
        } else if !sql.is_empty() {
            self.parts.push(FragmentPart::Sql(sql));
        }
        self
    }

    /// Append a bound parameter
    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.parts.push(FragmentPart::Bind(value.into()));
        self
    }

    /// Append another fragment
    pub fn append(mut self, other: SqlFragment) -> Self {
        for part in other.parts {
            self = match part {
                FragmentPart::Sql(sql) => self.sql(sql),
                FragmentPart::Bind(value) => self.bind(value),
            };
        }
        self
    }

    pub fn parts(&self) -> &[FragmentPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Parameters in binding order
    pub fn params(&self) -> impl Iterator<Item = &BindValue> {
        self.parts.iter().filter_map(|part| match part {
            FragmentPart::Bind(value) => Some(value),
            FragmentPart::Sql(_) => None,
        })
    }

    /// SQL text with parameters numbered from `$1`
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        let mut counter = 0;
        for part in &self.parts {
            match part {
                FragmentPart::Sql(text) => sql.push_str(text),
                FragmentPart::Bind(_) => {
                    counter += 1;
                    sql.push('$');
                    sql.push_str(&counter.to_string());
                }
            }
        }
        sql
    }
}

impl fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
