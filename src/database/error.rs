use std::fmt;

use thiserror::Error;

/// What went wrong inside a record store
#[derive(Debug, Clone, Error)]
pub enum DatabaseErrorKind {
    #[error("no connection available from the pool")]
    PoolExhausted,

    #[error("{entity} '{id}' does not exist")]
    NotFound { entity: String, id: String },

    #[error("{column} '{value}' is already taken")]
    Duplicate { column: String, value: String },

    #[error("query rejected by the database: {0}")]
    Query(String),

    #[error("lost connection to the database: {0}")]
    Connection(String),

    /// A stored JSON column (line items, metadata, addresses) did not decode
    #[error("stored document is unreadable: {0}")]
    Decode(String),

    #[error("schema migration failed: {0}")]
    Migration(String),

    #[error("database misconfigured: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Other(String),
}

pub type DbResult<T> = Result<T, DatabaseError>;

/// Store failure plus the record it concerned, when known
#[derive(Debug, Clone)]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
    pub context: Option<String>,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::NotFound {
            entity: entity.into(),
            id: id.into(),
        })
    }

    pub fn duplicate(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::Duplicate {
            column: column.into(),
            value: value.into(),
        })
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Pool and connection failures may clear up on their own
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            DatabaseErrorKind::PoolExhausted | DatabaseErrorKind::Connection(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::Duplicate { .. })
    }

    pub fn from_sqlx(error: sqlx::Error) -> Self {
        let kind = match error {
            sqlx::Error::RowNotFound => DatabaseErrorKind::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::PoolTimedOut => DatabaseErrorKind::PoolExhausted,
            sqlx::Error::PoolClosed => DatabaseErrorKind::Connection("pool closed".to_string()),
            sqlx::Error::Io(e) => DatabaseErrorKind::Connection(e.to_string()),
            sqlx::Error::Configuration(e) => DatabaseErrorKind::Config(e.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                DatabaseErrorKind::Decode(format!("column {index}: {source}"))
            }
            // 23505 = unique_violation
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DatabaseErrorKind::Duplicate {
                    column: db.constraint().unwrap_or("unknown").to_string(),
                    value: "provided value".to_string(),
                }
            }
            sqlx::Error::Database(db) => DatabaseErrorKind::Query(db.message().to_string()),
            other => DatabaseErrorKind::Other(other.to_string()),
        };
        Self::new(kind)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::new(DatabaseErrorKind::Migration(error.to_string()))
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} [{}]", self.kind, context),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for DatabaseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_failures_are_retryable() {
        assert!(DatabaseError::new(DatabaseErrorKind::PoolExhausted).is_retryable());
        assert!(DatabaseError::new(DatabaseErrorKind::Connection("reset".into())).is_retryable());
        assert!(!DatabaseError::not_found("order", "1").is_retryable());
    }

    #[test]
    fn test_duplicate_message_carries_context() {
        let err = DatabaseError::duplicate("email", "a@b.c").with_context("register");
        assert_eq!(err.to_string(), "email 'a@b.c' is already taken [register]");
        assert!(err.is_constraint_violation());
        assert!(!err.is_not_found());
    }
}
