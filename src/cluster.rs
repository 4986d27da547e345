#![doc = "HTTPS cluster client: implements the core's cluster capability against an Elasticsearch-compatible REST API."]
//
//! # Cluster client (CLI <-> Core)
//!
//! This module wires the [`SearchCluster`] and [`ClusterConnector`] traits from
//! `search-publish-core` to a real cluster over HTTPS.
//!
//! - [`HttpConnector`] is what the CLI hands to the publish pipeline.
//! - [`HttpCluster`] always speaks TLS (`https_only`) and authenticates every
//!   request with HTTP basic auth built from the access key and secret.
//! - Every failure (network, unexpected status, undecodable body) becomes a
//!   [`TransportError`] naming the operation.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;

use search_publish_core::connection::DEFAULT_PORT;
use search_publish_core::contract::{ClusterConnector, SearchCluster};
use search_publish_core::credentials::Credentials;
use search_publish_core::extract::DocumentRecord;
use search_publish_core::TransportError;

/// Error type the cluster reports when an index is created twice.
const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Builds [`HttpCluster`] sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl ClusterConnector for HttpConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn SearchCluster>, TransportError> {
        Ok(Box::new(HttpCluster::new(credentials)?))
    }
}

pub struct HttpCluster {
    client: Client,
    base: Url,
    access_key: String,
    access_secret: String,
}

impl std::fmt::Debug for HttpCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCluster")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// `https://{host}:{port}/`. A host given with an `https://` prefix is accepted;
/// any other scheme is refused.
///
/// A supplied `port` wins over one written in `host`; with neither, the port is
/// [`DEFAULT_PORT`].
pub fn base_url(host: &str, port: Option<u16>) -> Result<Url, TransportError> {
    let host = host.trim().trim_end_matches('/');
    let host = match host.split_once("://") {
        None => host,
        Some(("https", rest)) => rest,
        Some((scheme, _)) => {
            tracing::error!(scheme, "Refusing non-TLS cluster address");
            return Err(TransportError::new(
                "connect",
                format!("scheme `{scheme}` is not allowed, the cluster is only reached over https"),
            ));
        }
    };

    let mut url = Url::parse(&format!("https://{host}/"))
        .map_err(|e| TransportError::new("connect", format!("invalid cluster host `{host}`: {e}")))?;
    let port = match port {
        Some(port) => port,
        // `Url` hides an explicit :443, so the address text is checked too.
        None if has_explicit_port(host) => return Ok(url),
        None => DEFAULT_PORT,
    };
    url.set_port(Some(port))
        .map_err(|_| TransportError::new("connect", format!("cannot set port {port} on `{host}`")))?;
    Ok(url)
}

fn has_explicit_port(host: &str) -> bool {
    let authority = host.split('/').next().unwrap_or(host);
    authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

impl HttpCluster {
    pub fn new(credentials: &Credentials) -> Result<Self, TransportError> {
        let base = base_url(&credentials.host, credentials.port)?;
        let client = Client::builder().https_only(true).build().map_err(|e| {
            tracing::error!(error = ?e, "Failed to build HTTPS client");
            TransportError::new("connect", e.to_string())
        })?;

        tracing::info!(
            base = %base,
            access_key_set = !credentials.access_key.is_empty(),
            "Initialized HttpCluster"
        );
        Ok(HttpCluster {
            client,
            base,
            access_key: credentials.access_key.clone(),
            access_secret: credentials.access_secret.clone(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of `segments` below the cluster root, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::new("connect", "cluster address cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.access_key, Some(&self.access_secret))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, TransportError> {
        request.send().await.map_err(|e| {
            tracing::error!(operation, error = ?e, "Request to cluster failed");
            TransportError::new(operation, e.to_string())
        })
    }
}

/// Outcome of an index creation, from the response status and body.
///
/// A 400 naming `resource_already_exists_exception` means another writer
/// created the index first, which is success.
pub fn creation_outcome(status: StatusCode, body: &str) -> Result<(), TransportError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::BAD_REQUEST && body.contains(ALREADY_EXISTS) {
        return Ok(());
    }
    Err(TransportError::new(
        "create_index",
        format!("status {status}: {body}"),
    ))
}

/// Turns a non-success response into a [`TransportError`] carrying its body.
async fn unexpected(operation: &'static str, response: Response) -> TransportError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    tracing::error!(operation, status = %status, body = %body, "Cluster returned an error");
    TransportError::new(operation, format!("status {status}: {body}"))
}

#[async_trait]
impl SearchCluster for HttpCluster {
    async fn index_exists(&self, name: &str) -> Result<bool, TransportError> {
        let url = self.endpoint(&[name])?;
        let response = self
            .send("index_exists", self.request(Method::HEAD, url))
            .await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected("index_exists", response).await),
        }
    }

    async fn create_index(&self, name: &str) -> Result<(), TransportError> {
        tracing::info!(index = name, "Creating index");
        let url = self.endpoint(&[name])?;
        let response = self
            .send("create_index", self.request(Method::PUT, url))
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        match creation_outcome(status, &body) {
            Ok(()) => {
                tracing::info!(index = name, "Index already exists, nothing to create");
                Ok(())
            }
            Err(e) => {
                tracing::error!(operation = "create_index", status = %status, body = %body, "Cluster returned an error");
                Err(e)
            }
        }
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &DocumentRecord,
    ) -> Result<(), TransportError> {
        let url = self.endpoint(&[index, "_doc", id])?;
        let response = self
            .send("index_document", self.request(Method::PUT, url).json(body))
            .await?;
        if response.status().is_success() {
            tracing::debug!(index, id, "Indexed document");
            Ok(())
        } else {
            Err(unexpected("index_document", response).await)
        }
    }

    async fn search(&self, indexes: &[String], query: &Value) -> Result<Value, TransportError> {
        let target = indexes.join(",");
        let url = if target.is_empty() {
            self.endpoint(&["_search"])?
        } else {
            self.endpoint(&[target.as_str(), "_search"])?
        };
        let response = self
            .send("search", self.request(Method::POST, url).json(query))
            .await?;
        if !response.status().is_success() {
            return Err(unexpected("search", response).await);
        }
        response.json::<Value>().await.map_err(|e| {
            tracing::error!(error = ?e, "Failed to decode search response");
            TransportError::new("search", e.to_string())
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        // reqwest pools connections per client; they are released with it.
        tracing::info!(base = %self.base, "Closing cluster session");
        Ok(())
    }
}
