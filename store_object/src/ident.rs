//! Identifier quoting
//!
//! Relation, column and type names are always emitted as double-quoted
//! identifiers. Names come from the introspected catalog, so the only checks
//! needed are the ones PostgreSQL itself enforces.

use std::fmt;

/// Identifier validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum IdentError {
    /// Name is empty
    Empty,
    /// Name is longer than PostgreSQL's 63-byte identifier limit
    TooLong { name: String, length: usize },
    /// Name contains a NUL byte
    NulByte(String),
}

impl fmt::Display for IdentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentError::Empty => write!(f, "Identifier cannot be empty"),
            IdentError::TooLong { name, length } => write!(
                f,
                "Identifier '{}' is too long: {} bytes (max {})",
                name, length, MAX_IDENT_LENGTH
            ),
            IdentError::NulByte(name) => write!(f, "Identifier '{}' contains a NUL byte", name),
        }
    }
}

impl std::error::Error for IdentError {}

const MAX_IDENT_LENGTH: usize = 63;

/// Check that a name can be used as a quoted identifier
pub fn validate_ident(name: &str) -> Result<(), IdentError> {
    if name.is_empty() {
        return Err(IdentError::Empty);
    }
    if name.len() > MAX_IDENT_LENGTH {
        return Err(IdentError::TooLong {
            name: name.to_string(),
            length: name.len(),
        });
    }
    if name.contains('\0') {
        return Err(IdentError::NulByte(name.to_string()));
    }
    Ok(())
}

/// Double-quote an identifier, doubling any embedded quotes
pub fn quote_ident(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Schema-qualified, quoted relation name
pub fn quote_qualified(namespace: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(namespace), quote_ident(name))
}
