//! Credential store reader
//!
//! Extracts registry credentials from the JSON file container tooling keeps
//! at `~/.docker/config.json`. Only the base64 `auth` field is consulted:
//!
//! ```json
//! { "auths": { "registry.example.com": { "auth": "dXNlcjpwYXNz" } } }
//! ```

use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{RegistryError, Result};
use super::models::{Registry, RegistryName, RegistryPassword, RegistryUsername};

/// Default location of the credential store
const DOCKER_CONFIG_PATH: &str = "~/.docker/config.json";

/// Store key under which hub credentials are saved
const HUB_AUTH_DOMAIN: &str = "https://index.docker.io/v1/";

#[derive(Debug, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// Base64-encoded "username:password"
    #[serde(default)]
    auth: String,
}

/// Username and password extracted from the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub username: RegistryUsername,
    pub password: RegistryPassword,
}

/// Read credentials for `name` from the user's credential store
pub fn read_credentials(name: &RegistryName) -> Result<ResolvedCredentials> {
    read_credentials_from(&docker_config_path()?, name)
}

/// Read credentials for `name` from the credential store at `path`
pub fn read_credentials_from(path: &Path, name: &RegistryName) -> Result<ResolvedCredentials> {
    debug!("Reading registry credentials from {}", path.display());

    let file = File::open(path)
        .map_err(|e| RegistryError::io(format!("open file {} failed", path.display()), e))?;
    credentials_from_reader(name, BufReader::new(file))
}

/// Extract credentials for `name` from a credential store document
pub fn credentials_from_reader<R: Read>(
    name: &RegistryName,
    reader: R,
) -> Result<ResolvedCredentials> {
    let config: DockerConfig = serde_json::from_reader(reader)
        .map_err(|e| RegistryError::Decode(format!("decode json failed: {}", e)))?;

    let domain = auth_domain(name);
    let entry = config.auths.get(domain).ok_or_else(|| {
        RegistryError::NotFound(format!("domain {} not found in docker config", domain))
    })?;

    decode_auth(&entry.auth)
}

impl Registry {
    /// Replace username and password with the ones stored for this registry
    pub fn read_credentials_from_docker_config(&mut self) -> Result<()> {
        let credentials = read_credentials(&self.name)?;
        self.apply_credentials(credentials);
        Ok(())
    }

    /// Like [`Registry::read_credentials_from_docker_config`], reading the
    /// store document from `reader`
    pub fn credentials_from_docker_config<R: Read>(&mut self, reader: R) -> Result<()> {
        let credentials = credentials_from_reader(&self.name, reader)?;
        self.apply_credentials(credentials);
        Ok(())
    }
}

fn auth_domain(name: &RegistryName) -> &str {
    if name.is_hub() {
        HUB_AUTH_DOMAIN
    } else {
        name.as_str()
    }
}

fn decode_auth(auth: &str) -> Result<ResolvedCredentials> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth)
        .map_err(|e| RegistryError::Decode(format!("base64 decode auth failed: {}", e)))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|e| RegistryError::Decode(format!("auth is not valid UTF-8: {}", e)))?;

    // Passwords may contain ':' themselves, only the first one separates
    let (username, password) = decoded.split_once(':').ok_or_else(|| {
        RegistryError::MalformedCredential("split auth failed: missing ':'".to_string())
    })?;

    Ok(ResolvedCredentials {
        username: RegistryUsername::from(username),
        password: RegistryPassword::from(password),
    })
}

/// Location of the credential store, honouring `DOCKER_CONFIG`
pub fn docker_config_path() -> Result<PathBuf> {
    config_path_from(env_var_non_empty("DOCKER_CONFIG"))
}

fn config_path_from(docker_config_dir: Option<String>) -> Result<PathBuf> {
    match docker_config_dir {
        Some(dir) => Ok(normalize_path(&dir)?.join("config.json")),
        None => normalize_path(DOCKER_CONFIG_PATH),
    }
}

/// Expand a leading `~` to the current user's home directory
fn normalize_path(path: &str) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Ok(PathBuf::from(path)),
    };

    let home = dirs::home_dir().ok_or_else(|| {
        RegistryError::io(
            format!("normalize path {} failed", path),
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found"),
        )
    })?;

    Ok(home.join(rest.trim_start_matches('/')))
}

fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
