//! Tag listing for a single repository

use reqwest::Client;
use serde::Deserialize;

use super::auth::Endpoint;
use super::error::{RegistryError, Result};
use super::factory::ClientOptions;
use super::models::{Registry, Tag};
use super::pagination::{fetch_all, HubPage, Page, PAGE_SIZE};
use super::repositories::parse_url;

/// Page of the distribution `/v2/<name>/tags/list` endpoint
#[derive(Debug, Deserialize)]
struct TagListPage {
    // Registries send `null` for repositories without tags
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

impl Page for TagListPage {
    type Entry = Tag;

    fn into_entries(self) -> Vec<Tag> {
        self.tags.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct HubTag {
    name: Tag,
}

/// Lists every tag of a repository
#[derive(Debug, Clone)]
pub struct TagLister {
    client: Client,
    options: ClientOptions,
}

impl TagLister {
    pub(crate) fn new(client: Client, options: ClientOptions) -> Self {
        Self { client, options }
    }

    /// All tags of `repository`, in the order the registry returned them
    pub async fn list(&self, registry: &Registry, repository: &str) -> Result<Vec<Tag>> {
        let repository = repository.trim_matches('/');
        if repository.is_empty() {
            return Err(RegistryError::Validation("repository empty".to_string()));
        }

        let endpoint = registry.name.endpoint();
        let base = endpoint.base_url(&self.options);
        let what = format!("tags of {}", repository);

        match endpoint {
            Endpoint::PublicHub => {
                let url = parse_url(&format!(
                    "{}/v2/repositories/{}/tags/?page_size={}",
                    base, repository, PAGE_SIZE
                ))?;
                let entries = fetch_all::<HubPage<HubTag>>(
                    &self.client,
                    &self.options,
                    registry,
                    url,
                    &what,
                )
                .await?;
                Ok(entries.into_iter().map(|entry| entry.name).collect())
            }
            Endpoint::Private { .. } => {
                let url = parse_url(&format!(
                    "{}/v2/{}/tags/list?n={}",
                    base, repository, PAGE_SIZE
                ))?;
                fetch_all::<TagListPage>(&self.client, &self.options, registry, url, &what).await
            }
        }
    }
}
