//! OpenStack Swift connector
//!
//! Implements `ObjectStorage` on top of the Swift REST API, authenticating
//! with Keystone v3 password credentials.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{ContainerRef, ObjectEntry, ObjectMetadata, ObjectStorage};
use core_runtime::config::StorageSettings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SwiftError};
use crate::types::{AuthRequest, TokenResponse};

/// Tokens are dropped and re-requested after this long
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

/// Swift's default and maximum listing page size
const LISTING_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
struct Session {
    token: String,
    endpoint: String,
    obtained_at: Instant,
}

/// Swift object storage connector
///
/// # Example
///
/// ```ignore
/// use provider_swift::SwiftConnector;
/// use bridge_traits::storage::ObjectStorage;
///
/// let connector = SwiftConnector::new(http_client, config.storage.clone());
/// for container in connector.list_containers().await? {
///     println!("{} ({:?} objects)", container.name, container.count);
/// }
/// ```
pub struct SwiftConnector {
    http_client: Arc<dyn HttpClient>,
    settings: StorageSettings,
    token_ttl: Duration,
    session: RwLock<Option<Session>>,
}

impl SwiftConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: StorageSettings) -> Self {
        Self {
            http_client,
            settings,
            token_ttl: DEFAULT_TOKEN_TTL,
            session: RwLock::new(None),
        }
    }

    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Forget the cached token; the next call authenticates again
    pub async fn invalidate_token(&self) {
        if self.session.write().await.take().is_some() {
            debug!("Invalidated object storage token");
        }
    }

    async fn session(&self) -> Result<Session> {
        if let Some(session) = self.fresh_session(self.session.read().await.as_ref()) {
            return Ok(session);
        }

        let mut cached = self.session.write().await;
        if let Some(session) = self.fresh_session(cached.as_ref()) {
            return Ok(session);
        }
        let session = self.authenticate().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    fn fresh_session(&self, session: Option<&Session>) -> Option<Session> {
        session
            .filter(|s| s.obtained_at.elapsed() < self.token_ttl)
            .cloned()
    }

    #[instrument(skip(self), fields(region = %self.settings.region))]
    async fn authenticate(&self) -> Result<Session> {
        let url = format!("{}/v3/auth/tokens", self.settings.auth_url);
        debug!(%url, "Requesting object storage token");

        let request = HttpRequest::new(HttpMethod::Post, url).json(&AuthRequest::password(
            &self.settings.user_id,
            &self.settings.password,
            &self.settings.project_id,
        ))?;
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            warn!(status = response.status, "Keystone rejected credentials");
            return Err(SwiftError::AuthenticationFailed(format!(
                "token request returned status {}",
                response.status
            )));
        }

        let token = response
            .header("x-subject-token")
            .ok_or_else(|| {
                SwiftError::AuthenticationFailed("response has no X-Subject-Token header".into())
            })?
            .to_string();
        let body: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|e| SwiftError::ParseError(format!("token response: {}", e)))?;
        let endpoint = body
            .token
            .object_store_url(&self.settings.region)
            .ok_or_else(|| SwiftError::EndpointNotFound {
                region: self.settings.region.clone(),
            })?
            .trim_end_matches('/')
            .to_string();

        info!(%endpoint, "Obtained object storage token");
        Ok(Session {
            token,
            endpoint,
            obtained_at: Instant::now(),
        })
    }

    /// Send an authorized request, re-authenticating once if the token was rejected
    async fn send<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn(&Session) -> HttpRequest + Send + Sync,
    {
        let session = self.session().await?;
        let response = self
            .http_client
            .execute(build(&session).auth_token(session.token.as_str()))
            .await?;
        if response.status != 401 {
            return Ok(response);
        }

        warn!("Object storage token rejected, re-authenticating");
        self.invalidate_token().await;
        let session = self.session().await?;
        Ok(self
            .http_client
            .execute(build(&session).auth_token(session.token.as_str()))
            .await?)
    }

    async fn list_objects_page(
        &self,
        container: &str,
        marker: Option<&str>,
    ) -> Result<Vec<ObjectEntry>> {
        let response = self
            .send(|session| {
                let mut url = format!(
                    "{}?format=json&limit={}",
                    container_url(&session.endpoint, container),
                    LISTING_LIMIT
                );
                if let Some(marker) = marker {
                    url.push_str("&marker=");
                    url.push_str(&urlencoding::encode(marker));
                }
                HttpRequest::new(HttpMethod::Get, url)
            })
            .await?;

        match response.status {
            200 => serde_json::from_slice(&response.body).map_err(|e| {
                SwiftError::ParseError(format!("listing of container {}: {}", container, e))
            }),
            204 => Ok(Vec::new()),
            status_code => Err(SwiftError::ContainerNotFound {
                container: container.to_string(),
                status_code,
            }),
        }
    }
}

fn container_url(endpoint: &str, container: &str) -> String {
    format!("{}/{}", endpoint, urlencoding::encode(container))
}

/// Object names may contain `/`; each segment is encoded separately
fn object_url(endpoint: &str, container: &str, object: &str) -> String {
    let object = object
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", container_url(endpoint, container), object)
}

#[async_trait]
impl ObjectStorage for SwiftConnector {
    #[instrument(skip(self))]
    async fn list_containers(&self) -> BridgeResult<Vec<ContainerRef>> {
        let response = self
            .send(|session| {
                HttpRequest::new(HttpMethod::Get, format!("{}?format=json", session.endpoint))
            })
            .await?;

        let containers: Vec<ContainerRef> = match response.status {
            200 => serde_json::from_slice(&response.body)
                .map_err(|e| SwiftError::ParseError(format!("container listing: {}", e)))?,
            204 => Vec::new(),
            status_code => {
                return Err(SwiftError::ApiError {
                    status_code,
                    message: String::from_utf8_lossy(&response.body).into_owned(),
                }
                .into())
            }
        };

        info!(count = containers.len(), "Listed containers");
        Ok(containers)
    }

    #[instrument(skip(self))]
    async fn list_objects(&self, container: &str) -> BridgeResult<Vec<ObjectEntry>> {
        let mut objects = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_objects_page(container, marker.as_deref()).await?;
            let full_page = page.len() >= LISTING_LIMIT;
            marker = page.last().map(|entry| entry.name.clone());
            objects.extend(page);

            if !full_page || marker.is_none() {
                break;
            }
        }

        debug!(count = objects.len(), "Listed objects");
        Ok(objects)
    }

    #[instrument(skip(self))]
    async fn get_object_metadata(
        &self,
        container: &str,
        object: &str,
    ) -> BridgeResult<ObjectMetadata> {
        let response = self
            .send(|session| {
                HttpRequest::new(
                    HttpMethod::Head,
                    object_url(&session.endpoint, container, object),
                )
            })
            .await?;

        if !response.is_success() {
            return Err(SwiftError::ObjectNotFound {
                path: format!("/{}/{}", container, object),
                status_code: response.status,
            }
            .into());
        }
        Ok(ObjectMetadata::from_headers(response.headers))
    }

    #[instrument(skip(self))]
    async fn fetch_object_stream(
        &self,
        container: &str,
        object: &str,
    ) -> BridgeResult<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let session = self.session().await?;
        let request = HttpRequest::new(
            HttpMethod::Get,
            object_url(&session.endpoint, container, object),
        )
        .auth_token(session.token.as_str());

        self.http_client.download_stream(request).await
    }
}
