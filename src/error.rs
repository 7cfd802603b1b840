use crate::models::UsageResponse;
use thiserror::Error;

/// Errors that can occur while talking to the FlashBlade REST API
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FlashBlade API returned error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not logged in to the FlashBlade API")]
    NotAuthenticated,
}

/// Errors that can occur while collecting usage statistics
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("Invalid filesystem filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("Failed to list file systems: {0}")]
    ListFilesystems(#[source] ClientError),

    #[error("Failed to fetch {endpoint} for file system '{file_system}': {source}")]
    Usage {
        endpoint: String,
        file_system: String,
        /// Everything collected up to and including the failing file system
        partial: Box<UsageResponse>,
        #[source]
        source: ClientError,
    },
}

impl UsageError {
    /// Partial result accumulated before the failure, if any was kept
    pub fn partial(&self) -> Option<&UsageResponse> {
        match self {
            UsageError::Usage { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Consume the error and return the partial result, if any
    pub fn into_partial(self) -> Option<UsageResponse> {
        match self {
            UsageError::Usage { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UsageGroup, UsageUser};

    #[test]
    fn test_partial_only_for_usage_errors() {
        let err = UsageError::ListFilesystems(ClientError::NotAuthenticated);
        assert!(err.partial().is_none());
        assert!(err.into_partial().is_none());

        let partial = UsageResponse {
            file_systems: vec!["fs1".to_string()],
            groups: vec![UsageGroup::default()],
            users: vec![UsageUser::default()],
        };
        let err = UsageError::Usage {
            endpoint: "usage/groups".to_string(),
            file_system: "fs1".to_string(),
            partial: Box::new(partial.clone()),
            source: ClientError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        };
        assert_eq!(err.partial(), Some(&partial));
        assert_eq!(err.into_partial(), Some(partial));
    }

    #[test]
    fn test_usage_error_message_names_endpoint_and_file_system() {
        let err = UsageError::Usage {
            endpoint: "usage/users".to_string(),
            file_system: "home".to_string(),
            partial: Box::default(),
            source: ClientError::Auth("bad token".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("usage/users"));
        assert!(message.contains("'home'"));
        assert!(message.contains("bad token"));
    }

    #[test]
    fn test_status_error_message() {
        let err = ClientError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "FlashBlade API returned error 404: not found"
        );
    }
}
