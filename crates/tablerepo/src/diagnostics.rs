//! Human-readable explanations of startup failures.

use std::fmt;

use tablerepo_core::RepositoryError;

use crate::config::ConfigError;

const REGION_ACTION: &str = "\
Consider setting AWS_REGION (--region) or AWS_DYNAMODB_REGION (--dynamodb-region).

If both are present then AWS_DYNAMODB_REGION takes precedence.

Provide AWS_REGION when all resources are in the same region.
Provide AWS_DYNAMODB_REGION when DynamoDB is in a different region than the rest of the services.";

/// What went wrong at startup and what to do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAnalysis {
    pub description: String,
    pub action: Option<String>,
}

impl FailureAnalysis {
    pub fn from_config_error(err: &ConfigError) -> Self {
        match err {
            ConfigError::MissingRegion => Self {
                description: err.to_string(),
                action: Some(REGION_ACTION.to_string()),
            },
        }
    }

    pub fn from_repository_error(err: &RepositoryError) -> Self {
        Self {
            description: format!("{}: {err}", error_class(err)),
            action: err.action().map(str::to_string),
        }
    }

    /// Analyzes the first configuration or repository error in the chain of
    /// `err`, if there is one.
    pub fn analyze(err: &anyhow::Error) -> Option<Self> {
        err.chain().find_map(|cause| {
            if let Some(config) = cause.downcast_ref::<ConfigError>() {
                return Some(Self::from_config_error(config));
            }
            cause
                .downcast_ref::<RepositoryError>()
                .map(Self::from_repository_error)
        })
    }
}

fn error_class(err: &RepositoryError) -> &'static str {
    match err {
        RepositoryError::Configuration { .. } => "Repository configuration error",
        RepositoryError::Usage { .. } => "Repository usage error",
        RepositoryError::NotFound { .. } => "Not found",
        RepositoryError::UnsupportedKeyType { .. } => "Unsupported key type",
        RepositoryError::ConnectionFailed(_)
        | RepositoryError::QueryFailed(_)
        | RepositoryError::Serialization(_)
        | RepositoryError::InvalidData(_) => "Repository error",
    }
}

impl fmt::Display for FailureAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Description:")?;
        writeln!(f)?;
        writeln!(f, "{}", self.description)?;
        if let Some(action) = &self.action {
            writeln!(f)?;
            writeln!(f, "Action:")?;
            writeln!(f)?;
            writeln!(f, "{action}")?;
        }
        Ok(())
    }
}
