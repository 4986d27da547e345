//! # contract: capability interfaces the publish pipeline depends on
//!
//! The pipeline never talks to a search engine or a content store directly.
//! It goes through three traits:
//!
//! - [`SearchCluster`]: the five cluster operations used by publishing and searching.
//! - [`ClusterConnector`]: builds a [`SearchCluster`] session from resolved credentials.
//! - [`Pad`]: read access to the site's content tree.
//!
//! ## Mocking & Testing
//! - The cluster traits are annotated for `mockall` so tests can script the cluster
//!   and count calls. The mocks are exported with the `test-export-mocks` feature.
//! - [`crate::content::MemoryPad`] is the in-memory [`Pad`] for tests.

use async_trait::async_trait;
use serde_json::Value;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::content::ContentNode;
use crate::credentials::Credentials;
use crate::error::TransportError;
use crate::extract::DocumentRecord;

/// An open session against the search cluster.
///
/// Implementations own their transport; [`SearchCluster::close`] releases it.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SearchCluster: Send + Sync {
    /// Whether an index with this exact name exists.
    async fn index_exists(&self, name: &str) -> Result<bool, TransportError>;

    /// Create an empty index with default settings.
    async fn create_index(&self, name: &str) -> Result<(), TransportError>;

    /// Insert or replace the document `id` in `index`.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &DocumentRecord,
    ) -> Result<(), TransportError>;

    /// Run a raw query against `indexes`; an empty slice searches every index.
    async fn search(&self, indexes: &[String], query: &Value) -> Result<Value, TransportError>;

    /// Release the transport.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds cluster sessions. Only constructs the transport: credential
/// validation is done by [`crate::connection::connect`] before this is called.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ClusterConnector: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn SearchCluster>, TransportError>;
}

/// Read access to a content tree.
pub trait Pad {
    /// The root page.
    fn root(&self) -> ContentNode;

    /// Direct children of `node`. Order carries no meaning.
    fn children_of(&self, node: &ContentNode) -> Vec<ContentNode>;

    /// Raw textual contents of the page.
    fn contents_of(&self, node: &ContentNode) -> String;

    /// Name of the model the page is built from.
    fn model_of(&self, node: &ContentNode) -> String;

    /// Models known without walking the tree (e.g. from model definition files).
    fn declared_models(&self) -> Vec<String> {
        Vec::new()
    }
}
