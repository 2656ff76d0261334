//! Repository listing

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::auth::Endpoint;
use super::error::{RegistryError, Result};
use super::factory::ClientOptions;
use super::models::{Registry, Repository};
use super::pagination::{fetch_all, HubPage, Page, PAGE_SIZE};

/// Page of the distribution `/v2/_catalog` endpoint
#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    repositories: Option<Vec<Repository>>,
}

impl Page for CatalogPage {
    type Entry = Repository;

    fn into_entries(self) -> Vec<Repository> {
        self.repositories.unwrap_or_default()
    }
}

/// Repository entry of the hub API
#[derive(Debug, Deserialize)]
struct HubRepository {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// Lists every repository hosted on a registry
#[derive(Debug, Clone)]
pub struct RepositoryLister {
    client: Client,
    options: ClientOptions,
}

impl RepositoryLister {
    pub(crate) fn new(client: Client, options: ClientOptions) -> Self {
        Self { client, options }
    }

    /// All repository names, in the order the registry returned them
    ///
    /// On the public hub this is the repositories of the namespace named
    /// after the registry username.
    pub async fn list(&self, registry: &Registry) -> Result<Vec<Repository>> {
        let endpoint = registry.name.endpoint();
        let base = endpoint.base_url(&self.options);

        match endpoint {
            Endpoint::PublicHub => {
                let namespace = registry.username.as_str();
                if namespace.is_empty() {
                    return Err(RegistryError::Validation(
                        "username required to list hub repositories".to_string(),
                    ));
                }
                let url = parse_url(&format!(
                    "{}/v2/repositories/{}/?page_size={}",
                    base, namespace, PAGE_SIZE
                ))?;
                let entries = fetch_all::<HubPage<HubRepository>>(
                    &self.client,
                    &self.options,
                    registry,
                    url,
                    "repositories",
                )
                .await?;

                Ok(entries
                    .into_iter()
                    .map(|entry| {
                        let namespace = entry.namespace.as_deref().unwrap_or(namespace);
                        Repository::new(format!("{}/{}", namespace, entry.name))
                    })
                    .collect())
            }
            Endpoint::Private { .. } => {
                let url = parse_url(&format!("{}/v2/_catalog?n={}", base, PAGE_SIZE))?;
                fetch_all::<CatalogPage>(&self.client, &self.options, registry, url, "repositories")
                    .await
            }
        }
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| RegistryError::Validation(format!("invalid url {}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::{factory_for, serve, serve_one_page_then_hang_up};
    use axum::{
        extract::{Query, State},
        http::{header, HeaderMap, HeaderValue, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        requests: Arc<AtomicUsize>,
        logins: Arc<AtomicUsize>,
        authorization: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl Recorder {
        fn record(&self, headers: &HeaderMap) {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.authorization.lock().unwrap().push(
                headers
                    .get(header::AUTHORIZATION)
                    .map(|v| v.to_str().unwrap().to_string()),
            );
        }
    }

    fn with_link(body: serde_json::Value, link: Option<String>) -> Response {
        let mut response = Json(body).into_response();
        if let Some(link) = link {
            response
                .headers_mut()
                .insert(header::LINK, HeaderValue::from_str(&link).unwrap());
        }
        response
    }

    /// Three catalog pages: [a, b] -> [c, d] -> [e]
    async fn catalog(
        State(recorder): State<Recorder>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Response {
        recorder.record(&headers);
        match query.get("last").map(String::as_str) {
            None => with_link(
                json!({ "repositories": ["a", "b"] }),
                Some(r#"</v2/_catalog?last=b&n=2>; rel="next""#.to_string()),
            ),
            Some("b") => with_link(
                json!({ "repositories": ["c", "d"] }),
                Some(r#"</v2/_catalog?last=d&n=2>; rel="next""#.to_string()),
            ),
            _ => with_link(json!({ "repositories": ["e"] }), None),
        }
    }

    async fn catalog_server() -> (String, Recorder) {
        let recorder = Recorder::default();
        let app = Router::new()
            .route("/v2/_catalog", get(catalog))
            .with_state(recorder.clone());
        (serve(app).await, recorder)
    }

    fn names(repositories: &[Repository]) -> Vec<&str> {
        repositories.iter().map(Repository::as_str).collect()
    }

    #[tokio::test]
    async fn test_catalog_follows_link_header() {
        let (addr, recorder) = catalog_server().await;
        let registry = Registry::new(addr.as_str(), "alice", "s3cr3t");

        let repositories = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap();

        assert_eq!(names(&repositories), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(recorder.requests.load(Ordering::SeqCst), 3);

        // Every page carries basic auth
        let authorization = recorder.authorization.lock().unwrap();
        assert_eq!(authorization.len(), 3);
        assert!(authorization
            .iter()
            .all(|h| h.as_deref().is_some_and(|h| h.starts_with("Basic "))));
    }

    #[tokio::test]
    async fn test_catalog_anonymous_without_credentials() {
        let (addr, recorder) = catalog_server().await;
        let registry = Registry::new(addr.as_str(), "", "");

        let repositories = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap();

        assert_eq!(repositories.len(), 5);
        assert!(recorder
            .authorization
            .lock()
            .unwrap()
            .iter()
            .all(Option::is_none));
    }

    #[tokio::test]
    async fn test_catalog_keeps_server_order_and_duplicates() {
        let app = Router::new().route(
            "/v2/_catalog",
            get(|| async { Json(json!({ "repositories": ["zeta", "alpha", "zeta"] })) }),
        );
        let addr = serve(app).await;
        let registry = Registry::new(addr.as_str(), "alice", "s3cr3t");

        let repositories = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap();

        assert_eq!(names(&repositories), vec!["zeta", "alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_transport_failure_mid_walk_returns_no_entries() {
        let addr = serve_one_page_then_hang_up(|addr| {
            (
                json!({ "repositories": ["a", "b"] }).to_string(),
                format!(r#"<http://{}/v2/_catalog?last=b&n=2>; rel="next""#, addr),
            )
        })
        .await;
        let registry = Registry::new(addr.as_str(), "alice", "s3cr3t");

        let err = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap_err();

        assert!(
            matches!(err, RegistryError::Network { .. }),
            "unexpected error: {}",
            err
        );
    }

    #[tokio::test]
    async fn test_cursor_to_other_origin_gets_no_credentials() {
        let (other, other_recorder) = catalog_server().await;
        let app = Router::new().route(
            "/v2/_catalog",
            get(move || {
                let other = other.clone();
                async move {
                    with_link(
                        json!({ "repositories": ["a", "b"] }),
                        Some(format!(
                            r#"<http://{}/v2/_catalog?last=b&n=2>; rel="next""#,
                            other
                        )),
                    )
                }
            }),
        );
        let addr = serve(app).await;
        let registry = Registry::new(addr.as_str(), "alice", "s3cr3t");

        let err = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Decode(_)), "unexpected error: {}", err);
        assert_eq!(other_recorder.requests.load(Ordering::SeqCst), 0);
        assert!(other_recorder.authorization.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeating_cursor_stops_walk() {
        let requests = Arc::new(AtomicUsize::new(0));
        let app = Router::new().route(
            "/v2/_catalog",
            get({
                let requests = requests.clone();
                move || {
                    requests.fetch_add(1, Ordering::SeqCst);
                    async move {
                        with_link(
                            json!({ "repositories": ["a"] }),
                            Some(r#"</v2/_catalog?n=100>; rel="next""#.to_string()),
                        )
                    }
                }
            }),
        );
        let addr = serve(app).await;
        let registry = Registry::new(addr.as_str(), "alice", "s3cr3t");

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            factory_for(&addr).repositories().list(&registry),
        )
        .await
        .expect("listing should stop on a repeating cursor");

        let err = result.unwrap_err();
        assert!(matches!(err, RegistryError::Decode(_)), "unexpected error: {}", err);
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_catalog_is_auth_error() {
        let app = Router::new().route("/v2/_catalog", get(|| async { StatusCode::UNAUTHORIZED }));
        let addr = serve(app).await;
        let registry = Registry::new(addr.as_str(), "alice", "wrong");

        let err = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap_err();

        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_decode_error() {
        let app = Router::new().route("/v2/_catalog", get(|| async { "<html>oops</html>" }));
        let addr = serve(app).await;
        let registry = Registry::new(addr.as_str(), "alice", "s3cr3t");

        let err = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Decode(_)));
    }

    async fn hub_login(State(recorder): State<Recorder>) -> Json<serde_json::Value> {
        recorder.logins.fetch_add(1, Ordering::SeqCst);
        Json(json!({ "token": "tok-123" }))
    }

    async fn hub_repositories(
        State(recorder): State<Recorder>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        recorder.record(&headers);
        let host = headers
            .get(header::HOST)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        match query.get("page").map(String::as_str) {
            None => Json(json!({
                "count": 3,
                "next": format!("http://{}/v2/repositories/alice/?page=2&page_size=100", host),
                "results": [
                    { "name": "web", "namespace": "alice" },
                    { "name": "api", "namespace": "alice" }
                ]
            })),
            _ => Json(json!({
                "count": 3,
                "next": null,
                "results": [{ "name": "worker" }]
            })),
        }
    }

    #[tokio::test]
    async fn test_hub_walks_next_and_logs_in_per_request() {
        let recorder = Recorder::default();
        let app = Router::new()
            .route("/v2/users/login/", post(hub_login))
            .route("/v2/repositories/alice/", get(hub_repositories))
            .with_state(recorder.clone());
        let addr = serve(app).await;
        let registry = Registry::new("docker.io", "alice", "s3cr3t");

        let repositories = factory_for(&addr)
            .repositories()
            .list(&registry)
            .await
            .unwrap();

        assert_eq!(
            names(&repositories),
            vec!["alice/web", "alice/api", "alice/worker"]
        );
        assert_eq!(recorder.requests.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.logins.load(Ordering::SeqCst), 2);
        assert!(recorder
            .authorization
            .lock()
            .unwrap()
            .iter()
            .all(|h| h.as_deref() == Some("JWT tok-123")));
    }

    #[tokio::test]
    async fn test_hub_requires_username() {
        let registry = Registry::new("docker.io", "", "");

        let err = factory_for("127.0.0.1:1")
            .repositories()
            .list(&registry)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Validation(_)));
    }
}
