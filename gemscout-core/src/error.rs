use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Source API error: {0}")]
    SourceApi(#[from] SourceApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum SourceApiError {
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: i64 },

    #[error("User not found: {username}")]
    UserNotFound { username: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("API endpoint unavailable: {endpoint}")]
    EndpointUnavailable { endpoint: String },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Query execution failed: {query}")]
    QueryFailed { query: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Insert races on a unique column surface as constraint violations.
    /// The sweep treats those as "another path got there first", not as
    /// failures.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::ConstraintViolation { .. } => true,
            DatabaseError::Sql(sqlx::Error::Database(db_err)) => {
                db_err.kind() == sqlx::error::ErrorKind::UniqueViolation
            }
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CoreError {
    /// True when the failure is an expected concurrent-insert race that
    /// the caller should swallow rather than count as an error.
    pub fn is_benign_race(&self) -> bool {
        matches!(self, CoreError::Database(e) if e.is_unique_violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_is_benign() {
        let err = CoreError::Database(DatabaseError::ConstraintViolation {
            constraint: "posts.hn_id".to_string(),
        });
        assert!(err.is_benign_race());
    }

    #[test]
    fn other_database_errors_are_not_benign() {
        let err = CoreError::Database(DatabaseError::QueryFailed {
            query: "INSERT INTO posts".to_string(),
        });
        assert!(!err.is_benign_race());

        let err = CoreError::Internal {
            message: "boom".to_string(),
        };
        assert!(!err.is_benign_race());
    }
}
