use thiserror::Error;

/// Errors returned by the registry core.
///
/// Every variant names the operation that failed so callers can print the
/// error as-is without adding more context.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registry: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RegistryError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RegistryError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        RegistryError::Network {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, RegistryError::Auth(_))
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
