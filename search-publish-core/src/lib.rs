#![doc = "search-publish-core: core publish pipeline for search-publish."]

//! This crate holds the publish pipeline that turns a static site's content
//! tree into one search index per model and one document per page. It talks
//! to the cluster and to the content only through the capability traits in
//! [`contract`]; the HTTPS client and the CLI live in the `search-publish` crate.
//!
//! # Usage
//! Hand [`publish::publish`] a [`ClusterConnector`], a [`Pad`] and the persisted
//! [`Credentials`]; it resolves them, connects, and disconnects on every path.
//! Drive a [`publish::PublishRun`] instead for step-by-step progress.

pub mod config;
pub mod connection;
pub mod content;
pub mod contract;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod publish;
pub mod reconcile;
pub mod search;
pub mod walk;

pub use contract::{ClusterConnector, Pad, SearchCluster};
pub use credentials::{resolve, Credentials};
pub use error::{CredentialError, PublishError, TransportError};
pub use publish::{publish, PublishReport, PublishRequest, PublishState};
