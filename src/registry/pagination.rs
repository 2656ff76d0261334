//! Sequential page walking shared by the repository and tag listers

use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use super::auth::set_auth;
use super::error::{RegistryError, Result};
use super::factory::ClientOptions;
use super::models::Registry;

/// Number of entries requested per page
pub(crate) const PAGE_SIZE: usize = 100;

/// One decoded page of a listing response
pub(crate) trait Page: DeserializeOwned {
    type Entry;

    /// Continuation cursor carried in the body, if the API uses one
    fn next(&self) -> Option<&str> {
        None
    }

    fn into_entries(self) -> Vec<Self::Entry>;
}

/// Paginated envelope used by the public hub API
#[derive(Debug, Deserialize)]
pub(crate) struct HubPage<T> {
    #[serde(default)]
    next: Option<String>,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

impl<T: DeserializeOwned> Page for HubPage<T> {
    type Entry = T;

    fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    fn into_entries(self) -> Vec<T> {
        self.results
    }
}

/// Fetch `first` and every page after it, concatenating entries in server order
///
/// The cursor of each page comes from the body or, failing that, from a
/// `Link: <...>; rel="next"` header. Any failure aborts the whole walk.
/// Cursors must stay on the origin of `first`, since every request carries
/// credentials, and must never lead back to a page already fetched.
pub(crate) async fn fetch_all<P: Page>(
    client: &Client,
    options: &ClientOptions,
    registry: &Registry,
    first: Url,
    what: &str,
) -> Result<Vec<P::Entry>> {
    let origin = first.origin();
    let mut visited = HashSet::new();
    let mut entries = Vec::new();
    let mut next = Some(first);

    while let Some(url) = next.take() {
        if url.origin() != origin {
            return Err(RegistryError::Decode(format!(
                "next {} page {} leaves the registry origin",
                what, url
            )));
        }
        if !visited.insert(url.clone()) {
            return Err(RegistryError::Decode(format!(
                "pagination cursor repeats {} page {}",
                what, url
            )));
        }

        debug!("Fetching {} page {}", what, url);

        let request = set_auth(client, options, registry, client.get(url.clone())).await?;
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::network(format!("list {} failed", what), e))?;

        check_status(response.status(), what)?;
        let link = next_link(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::network(format!("read {} page failed", what), e))?;
        let page: P = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::Decode(format!("decode {} page failed: {}", what, e)))?;

        let cursor = page
            .next()
            .map(str::to_string)
            .or(link)
            .filter(|cursor| !cursor.is_empty());
        entries.extend(page.into_entries());

        next = cursor
            .map(|cursor| url.join(&cursor))
            .transpose()
            .map_err(|e| RegistryError::Decode(format!("invalid next page link: {}", e)))?;
    }

    Ok(entries)
}

fn check_status(status: StatusCode, what: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound(format!("{} (status 404)", what)));
    }
    Err(RegistryError::Auth(format!(
        "list {} status code {} != 2xx",
        what,
        status.as_u16()
    )))
}

/// Target of the `rel="next"` entry of the `Link` headers, if any
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(parse_next_link)
}

fn parse_next_link(link: &str) -> Option<String> {
    let mut parts = link.split(';');
    let target = parts.next()?.trim();
    let target = target.strip_prefix('<')?.strip_suffix('>')?;

    let is_next = parts.any(|param| {
        let param = param.trim();
        param
            .strip_prefix("rel=")
            .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
            .unwrap_or(false)
    });

    is_next.then(|| target.to_string())
}
