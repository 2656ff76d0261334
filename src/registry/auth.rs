//! Per-registry authentication
//!
//! The public hub wants a token obtained from its login endpoint, sent with the
//! `JWT` scheme. Any other registry gets HTTP basic auth when both username and
//! password are set, and an anonymous request otherwise.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{RegistryError, Result};
use super::factory::ClientOptions;
use super::models::{Registry, RegistryToken};

/// Where a registry lives and how requests to it are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    PublicHub,
    Private { host: String },
}

impl Endpoint {
    /// Base URL requests are issued against, without trailing slash
    pub fn base_url(&self, options: &ClientOptions) -> String {
        match self {
            Endpoint::PublicHub => options.hub_url.trim_end_matches('/').to_string(),
            Endpoint::Private { host } => {
                let scheme = if options.insecure { "http" } else { "https" };
                format!("{}://{}", scheme, host)
            }
        }
    }

    /// Attach credentials for `registry` to an outgoing request
    pub async fn authenticate(
        &self,
        client: &Client,
        options: &ClientOptions,
        registry: &Registry,
        request: RequestBuilder,
    ) -> Result<RequestBuilder> {
        match self {
            Endpoint::PublicHub => {
                let token = get_token(client, &self.base_url(options), registry)
                    .await
                    .map_err(|e| match e {
                        RegistryError::Network { .. } => e,
                        other => RegistryError::Auth(format!("get token failed: {}", other)),
                    })?;
                debug!("Set Authorization header for {}", registry.name);
                Ok(request.header(AUTHORIZATION, format!("JWT {}", token.as_str())))
            }
            Endpoint::Private { host } if registry.has_credentials() => {
                debug!("Set basic auth for {}", host);
                Ok(request.basic_auth(
                    registry.username.as_str(),
                    Some(registry.password.as_str()),
                ))
            }
            Endpoint::Private { host } => {
                debug!("No credentials for {}, sending anonymous request", host);
                Ok(request)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: RegistryToken,
}

/// Exchange username and password for a hub token
///
/// The token is returned to the caller only; nothing is cached.
pub async fn get_token(
    client: &Client,
    hub_url: &str,
    registry: &Registry,
) -> Result<RegistryToken> {
    let url = format!("{}/v2/users/login/", hub_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .json(&LoginRequest {
            username: registry.username.as_str(),
            password: registry.password.as_str(),
        })
        .send()
        .await
        .map_err(|e| RegistryError::network("login request failed", e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegistryError::Auth(format!(
            "login status code {} != 2xx",
            status.as_u16()
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| RegistryError::network("read login response failed", e))?;
    let data: LoginResponse = serde_json::from_slice(&body)
        .map_err(|e| RegistryError::Decode(format!("decode login response failed: {}", e)))?;

    debug!("Got token for {}", registry.username);
    Ok(data.token)
}

/// Attach the auth appropriate for `registry` to `request`
pub async fn set_auth(
    client: &Client,
    options: &ClientOptions,
    registry: &Registry,
    request: RequestBuilder,
) -> Result<RequestBuilder> {
    registry
        .name
        .endpoint()
        .authenticate(client, options, registry, request)
        .await
}
