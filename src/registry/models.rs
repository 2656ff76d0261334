//! Value types describing a registry and the entries listed from it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::auth::Endpoint;
use super::credentials::ResolvedCredentials;
use super::error::{RegistryError, Result};

/// Registry name that selects the public hub
pub const HUB_NAME: &str = "docker.io";

/// Base URL of the public hub API
pub const HUB_URL: &str = "https://hub.docker.com";

/// Registry host name (e.g. "registry.example.com:5000"), or [`HUB_NAME`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryName(String);

impl RegistryName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical API URL for this registry
    pub fn url(&self) -> String {
        if self.is_hub() {
            return HUB_URL.to_string();
        }
        format!("https://{}", self.0)
    }

    /// Exact, case-sensitive comparison against [`HUB_NAME`]
    pub fn is_hub(&self) -> bool {
        self.0 == HUB_NAME
    }

    /// Resolve the endpoint variant that drives URL building and authentication
    pub fn endpoint(&self) -> Endpoint {
        if self.is_hub() {
            Endpoint::PublicHub
        } else {
            Endpoint::Private {
                host: self.0.clone(),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(RegistryError::Validation("registry empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for RegistryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegistryName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegistryName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryUsername(String);

impl RegistryUsername {
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(RegistryError::Validation("username empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for RegistryUsername {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegistryUsername {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegistryUsername {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Registry password. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistryPassword(String);

impl RegistryPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Read a password from a file, trimming surrounding whitespace
    ///
    /// Interior whitespace is kept as-is.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::io(format!("read password file {} failed", path.display()), e)
        })?;
        Ok(Self(content.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(RegistryError::Validation("password empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for RegistryPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("RegistryPassword(\"\")")
        } else {
            f.write_str("RegistryPassword(***)")
        }
    }
}

impl From<&str> for RegistryPassword {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegistryPassword {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Bearer token handed out by the hub login endpoint
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RegistryToken(String);

impl RegistryToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegistryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RegistryToken(***)")
    }
}

/// Coordinates and credentials of a single registry
///
/// Not meant to be shared between concurrent calls: credential resolution
/// overwrites `username` and `password` in place.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub name: RegistryName,
    pub username: RegistryUsername,
    pub password: RegistryPassword,
    pub token: RegistryToken,
}

impl Registry {
    pub fn new(
        name: impl Into<RegistryName>,
        username: impl Into<RegistryUsername>,
        password: impl Into<RegistryPassword>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
            token: RegistryToken::default(),
        }
    }

    /// Check that name, username and password are all set
    pub fn validate(&self) -> Result<()> {
        self.name.validate()?;
        self.username.validate()?;
        self.password.validate()?;
        Ok(())
    }

    /// Overwrite username and password with credentials resolved elsewhere
    pub fn apply_credentials(&mut self, credentials: ResolvedCredentials) {
        self.username = credentials.username;
        self.password = credentials.password;
    }

    /// Whether both username and password are non-empty
    pub(crate) fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Repository name as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Repository(String);

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag name as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
