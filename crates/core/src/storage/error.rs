use thiserror::Error;

/// Key value types accepted for partition and sort keys, as shown in errors.
pub const ALLOWED_KEY_TYPES: &str = "String, i32, i64, f64, bool";

/// Errors that can occur during repository construction and operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// The entity declaration and the repository's key types disagree.
    /// Raised only while a repository is being constructed.
    #[error("{message}")]
    Configuration { message: String, action: String },

    /// The caller used the key-arity variant that does not fit the entity.
    #[error("{message}")]
    Usage {
        entity_type: String,
        message: String,
        action: String,
    },

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{found} is not supported as a key type. Allowed key types are {allowed}")]
    UnsupportedKeyType { found: String, allowed: &'static str },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    pub fn configuration(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            action: action.into(),
        }
    }

    pub fn unsupported_key_type(found: impl Into<String>) -> Self {
        Self::UnsupportedKeyType {
            found: found.into(),
            allowed: ALLOWED_KEY_TYPES,
        }
    }

    /// Remediation hint attached to configuration and usage errors.
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Configuration { action, .. } | Self::Usage { action, .. }
                if !action.is_empty() =>
            {
                Some(action)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::NotFound {
            entity_type: "TableWithSort".to_string(),
            id: "id1".to_string(),
        };
        assert_eq!(error.to_string(), "TableWithSort not found: id1");
        assert!(error.is_not_found());
        assert!(!error.is_usage());
    }

    #[test]
    fn test_repository_error_unsupported_key_type_display() {
        let error = RepositoryError::unsupported_key_type("Vec<u8>");
        assert_eq!(
            error.to_string(),
            "Vec<u8> is not supported as a key type. Allowed key types are String, i32, i64, f64, bool"
        );
    }

    #[test]
    fn test_repository_error_query_failed_display() {
        let error = RepositoryError::QueryFailed("Table not found".to_string());
        assert_eq!(error.to_string(), "Query failed: Table not found");
    }

    #[test]
    fn test_action_only_for_configuration_and_usage() {
        let config = RepositoryError::configuration("bad", "fix it");
        assert_eq!(config.action(), Some("fix it"));
        assert!(config.is_configuration());

        let usage = RepositoryError::Usage {
            entity_type: "TableWithSort".to_string(),
            message: "wrong overload".to_string(),
            action: "use find_by_keys".to_string(),
        };
        assert_eq!(usage.action(), Some("use find_by_keys"));

        assert_eq!(RepositoryError::configuration("bad", "").action(), None);
        assert_eq!(
            RepositoryError::InvalidData("x".to_string()).action(),
            None
        );
    }
}
