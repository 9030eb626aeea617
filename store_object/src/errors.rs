use thiserror::Error;
use type_mapping::FragmentError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{relation} not found")]
    NotFound { relation: String },

    #[error("{relation} already exists: {detail}")]
    AlreadyExists { relation: String, detail: String },

    #[error("{relation} is still in use")]
    StillInUse {
        relation: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Schema missing: {0}")]
    SchemaMissing(String),

    #[error("Invalid value for {column}: {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Connection failure during {operation} on {relation}: {source}")]
    Connectivity {
        relation: String,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to {operation} {relation}: {source}")]
    Database {
        relation: String,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid SQL fragment: {0}")]
    Fragment(#[from] FragmentError),
}

impl StoreError {
    /// HTTP-style status class of the error
    pub fn status(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::AlreadyExists { .. }
            | StoreError::StillInUse { .. }
            | StoreError::InvalidValue { .. }
            | StoreError::Fragment(_) => 400,
            StoreError::SchemaMissing(_)
            | StoreError::Connectivity { .. }
            | StoreError::Database { .. }
            | StoreError::Serialization(_) => 500,
        }
    }

    /// Client-fixable faults (conflicts, references, bad input)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    pub fn not_found(relation: &str) -> Self {
        StoreError::NotFound {
            relation: relation.to_string(),
        }
    }

    pub fn missing_column(relation: &str, column: &str) -> Self {
        StoreError::SchemaMissing(format!("{}.{} does not exist", relation, column))
    }

    /// Wrap a driver error, separating connectivity loss from other failures
    pub fn database_operation(relation: &str, operation: &'static str, error: sqlx::Error) -> Self {
        if is_connectivity(&error) {
            StoreError::Connectivity {
                relation: relation.to_string(),
                operation,
                source: error,
            }
        } else {
            StoreError::Database {
                relation: relation.to_string(),
                operation,
                source: error,
            }
        }
    }

    /// Translate errors from INSERT and UPDATE statements
    pub fn from_write(relation: &str, operation: &'static str, error: sqlx::Error) -> Self {
        if sqlstate(&error).as_deref() == Some(UNIQUE_VIOLATION) {
            let detail = conflict_detail(&error);
            return StoreError::AlreadyExists {
                relation: relation.to_string(),
                detail,
            };
        }
        Self::database_operation(relation, operation, error)
    }

    /// Translate errors from DELETE statements
    pub fn from_delete(relation: &str, operation: &'static str, error: sqlx::Error) -> Self {
        if sqlstate(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return StoreError::StillInUse {
                relation: relation.to_string(),
                source: error,
            };
        }
        Self::database_operation(relation, operation, error)
    }
}

fn sqlstate(error: &sqlx::Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

fn conflict_detail(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db) => db
            .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
            .and_then(|pg| pg.detail())
            .map(str::to_string)
            .unwrap_or_else(|| db.message().to_string()),
        None => error.to_string(),
    }
}

fn is_connectivity(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(StoreError::not_found("dog").status(), 404);
        assert_eq!(
            StoreError::AlreadyExists {
                relation: "dog".to_string(),
                detail: "Key (name)=(prairie) already exists.".to_string()
            }
            .status(),
            400
        );
        assert_eq!(StoreError::missing_column("dog", "colour").status(), 500);
        assert!(StoreError::InvalidValue {
            column: "dog.tags".to_string(),
            reason: "expected an array".to_string()
        }
        .is_client_error());
        assert!(!StoreError::missing_column("dog", "colour").is_client_error());
    }

    #[test]
    fn test_messages() {
        assert_eq!(StoreError::not_found("dog").to_string(), "dog not found");
        assert_eq!(
            StoreError::missing_column("dog", "colour").to_string(),
            "Schema missing: dog.colour does not exist"
        );
    }

    #[test]
    fn test_driver_errors_are_classified() {
        let error = StoreError::database_operation("dog", "list", sqlx::Error::PoolTimedOut);
        assert!(matches!(error, StoreError::Connectivity { .. }));
        assert_eq!(error.status(), 500);

        let error = StoreError::from_write("dog", "generate", sqlx::Error::RowNotFound);
        assert!(matches!(error, StoreError::Database { .. }));

        let error = StoreError::from_delete("dog", "delete", sqlx::Error::RowNotFound);
        assert!(matches!(error, StoreError::Database { .. }));
    }
}
