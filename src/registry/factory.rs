use reqwest::Client;
use std::time::Duration;

use super::error::{RegistryError, Result};
use super::models::HUB_URL;
use super::repositories::RepositoryLister;
use super::tags::TagLister;

/// Settings shared by every lister handed out by a [`Factory`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the public hub API
    pub hub_url: String,
    /// Talk plain HTTP to private registries
    pub insecure: bool,
    /// Per-request timeout; none means wait indefinitely
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            hub_url: HUB_URL.to_string(),
            insecure: false,
            timeout: None,
        }
    }
}

/// Hands out listers wired to one shared, proxy-free HTTP client
#[derive(Debug, Clone)]
pub struct Factory {
    client: Client,
    options: ClientOptions,
}

impl Factory {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder().no_proxy();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RegistryError::network("build http client failed", e))?;

        Ok(Self::with_client(client, options))
    }

    /// Use a prebuilt client instead of the default proxy-free one
    pub fn with_client(client: Client, options: ClientOptions) -> Self {
        Self { client, options }
    }

    pub fn repositories(&self) -> RepositoryLister {
        RepositoryLister::new(self.client.clone(), self.options.clone())
    }

    pub fn tags(&self) -> TagLister {
        TagLister::new(self.client.clone(), self.options.clone())
    }
}
