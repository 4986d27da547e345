//! High-level pipeline: connect → reconcile indexes → walk & extract → write documents.
//!
//! This module sequences one publish of a content tree into a search cluster.
//! A publish is the state machine [`PublishRun`]:
//!
//! ```text
//! Idle -> Connecting -> ReconcilingIndexes -> WalkingAndExtracting -> WritingDocuments -> Disconnected
//!   \__________\_______________\____________________\_______________________\__________-> Failed
//! ```
//!
//! Every transition produces one [`PublishProgress`] message. The run is
//! consumed either step by step through [`PublishRun::advance`], as a
//! forward-only [`Stream`] through [`PublishRun::into_stream`], or to completion
//! through [`publish`].
//!
//! # Responsibilities
//! - Credentials are resolved once per run: configuration, then the target
//!   locator's host, then the override bundle.
//! - The connection is opened in `Connecting` and released on every exit path
//!   after that, success or failure. A run dropped before it finishes (for
//!   example a stream the caller stops polling) releases it on drop.
//! - Fail-fast: the first failing cluster call ends the run with a
//!   [`PublishError`] naming the stage. No retries.
//!
//! # Navigation
//! - Main entrypoint: [`publish`]
//! - Supporting types: [`PublishRequest`], [`PublishReport`], [`PublishState`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use futures::Stream;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::connection::{self, Connection};
use crate::content::ContentNode;
use crate::contract::{ClusterConnector, Pad};
use crate::credentials::{resolve, Credentials};
use crate::error::PublishError;
use crate::extract::{extract_with_warnings, DocumentRecord};
use crate::reconcile::IndexReconciler;
use crate::walk::walk_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishState {
    Idle,
    Connecting,
    ReconcilingIndexes,
    WalkingAndExtracting,
    WritingDocuments,
    Disconnected,
    Failed,
}

impl PublishState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PublishState::Disconnected | PublishState::Failed)
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishState::Idle => "idle",
            PublishState::Connecting => "connecting",
            PublishState::ReconcilingIndexes => "reconciling indexes",
            PublishState::WalkingAndExtracting => "walking and extracting",
            PublishState::WritingDocuments => "writing documents",
            PublishState::Disconnected => "disconnecting",
            PublishState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A human-readable status line, produced on entering `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishProgress {
    pub state: PublishState,
    pub message: String,
}

impl fmt::Display for PublishProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Per-invocation inputs.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    /// Target locator, e.g. `elasticsearch://search.example.com`. Its host (and
    /// explicit port) override the configured ones.
    pub target: Option<Url>,
    /// Override bundle, applied last. Empty fields are ignored.
    pub credentials: Option<Credentials>,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub indexes_created: Vec<String>,
    /// Documents written, per index.
    pub documents: BTreeMap<String, usize>,
    pub pages: usize,
    /// Content lines skipped as malformed, over all pages.
    pub warnings: usize,
}

impl PublishReport {
    pub fn documents_written(&self) -> usize {
        self.documents.values().sum()
    }
}

/// One publish invocation. Owns its connection exclusively; nothing outlives it.
pub struct PublishRun<'a, C: ?Sized, P: ?Sized> {
    connector: &'a C,
    pad: &'a P,
    persisted: Credentials,
    request: PublishRequest,
    state: PublishState,
    connection: Option<Connection>,
    reconciler: IndexReconciler,
    pages: Vec<(ContentNode, String)>,
    batches: BTreeMap<String, Vec<DocumentRecord>>,
    report: PublishReport,
}

impl<'a, C, P> PublishRun<'a, C, P>
where
    C: ClusterConnector + ?Sized,
    P: Pad + ?Sized,
{
    pub fn new(connector: &'a C, pad: &'a P, persisted: &Credentials, request: PublishRequest) -> Self {
        Self {
            connector,
            pad,
            persisted: persisted.clone(),
            request,
            state: PublishState::Idle,
            connection: None,
            reconciler: IndexReconciler::new(),
            pages: Vec::new(),
            batches: BTreeMap::new(),
            report: PublishReport::default(),
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    pub fn report(&self) -> &PublishReport {
        &self.report
    }

    pub fn into_report(mut self) -> PublishReport {
        std::mem::take(&mut self.report)
    }

    /// Credentials for this run: configuration < target host < override bundle.
    pub fn resolved_credentials(&self) -> Credentials {
        let target_override = self.request.target.as_ref().and_then(|url| {
            url.host_str()
                .map(|host| Credentials::host_override(host, url.port()))
        });
        let with_target = resolve(&self.persisted, target_override.as_ref());
        resolve(&with_target, self.request.credentials.as_ref())
    }

    /// Runs the current stage and moves to the next one.
    ///
    /// Returns `None` once the run has reached `Disconnected` or `Failed`.
    pub async fn advance(&mut self) -> Option<Result<PublishProgress, PublishError>> {
        match self.state {
            PublishState::Idle => Some(Ok(self.enter(
                PublishState::Connecting,
                "Connecting to search cluster".to_string(),
            ))),
            PublishState::Connecting => Some(self.connect()),
            PublishState::ReconcilingIndexes => Some(self.reconcile().await),
            PublishState::WalkingAndExtracting => Some(Ok(self.extract_documents())),
            PublishState::WritingDocuments => Some(self.write_documents().await),
            PublishState::Disconnected | PublishState::Failed => None,
        }
    }

    /// The run as a finite, forward-only sequence of progress messages.
    pub fn into_stream(self) -> impl Stream<Item = Result<PublishProgress, PublishError>> + 'a
    where
        C: 'a,
        P: 'a,
    {
        futures::stream::unfold(self, |mut run| async move {
            let step = run.advance().await?;
            Some((step, run))
        })
    }

    fn enter(&mut self, state: PublishState, message: String) -> PublishProgress {
        info!(stage = %state, "{message}");
        self.state = state;
        PublishProgress { state, message }
    }

    fn connect(&mut self) -> Result<PublishProgress, PublishError> {
        let credentials = self.resolved_credentials();
        match connection::connect(self.connector, &credentials) {
            Ok(conn) => {
                let message = format!(
                    "Connected to {}. Verifying every data model has a corresponding index on cluster",
                    conn.address()
                );
                self.connection = Some(conn);
                Ok(self.enter(PublishState::ReconcilingIndexes, message))
            }
            Err(source) => {
                error!(error = %source, "Publish aborted before touching the cluster");
                self.state = PublishState::Failed;
                Err(PublishError::Credentials {
                    stage: PublishState::Connecting,
                    source,
                })
            }
        }
    }

    async fn reconcile(&mut self) -> Result<PublishProgress, PublishError> {
        let root = self.pad.root();
        self.pages = walk_all(self.pad, &root)
            .into_iter()
            .map(|node| {
                let model = self.pad.model_of(&node);
                (node, model)
            })
            .collect();

        let models: BTreeSet<String> = self
            .pad
            .declared_models()
            .into_iter()
            .chain(self.pages.iter().map(|(_, model)| model.clone()))
            .collect();
        debug!(models = ?models, "Models to reconcile");

        let Some(conn) = self.connection.as_ref() else {
            return Err(self.missing_connection(PublishState::ReconcilingIndexes).await);
        };
        let reconciled = self.reconciler.ensure_all(conn.cluster(), &models).await;
        if let Err(e) = reconciled {
            let err = PublishError::transport(PublishState::ReconcilingIndexes, e);
            return Err(self.fail(err).await);
        }
        self.report.indexes_created = self.reconciler.created().to_vec();

        let message = format!(
            "{} indexes ready ({} created). Collecting documents from {} pages",
            models.len(),
            self.report.indexes_created.len(),
            self.pages.len()
        );
        Ok(self.enter(PublishState::WalkingAndExtracting, message))
    }

    fn extract_documents(&mut self) -> PublishProgress {
        for (node, model) in std::mem::take(&mut self.pages) {
            let extraction = extract_with_warnings(self.pad, &node);
            self.report.warnings += extraction.warnings.len();
            self.batches.entry(model).or_default().push(extraction.record);
            self.report.pages += 1;
        }

        let total: usize = self.batches.values().map(Vec::len).sum();
        let message = format!(
            "Adding/updating {} docs in {} indexes on the cluster",
            total,
            self.batches.len()
        );
        self.enter(PublishState::WritingDocuments, message)
    }

    async fn write_documents(&mut self) -> Result<PublishProgress, PublishError> {
        let Some(conn) = self.connection.as_ref() else {
            return Err(self.missing_connection(PublishState::WritingDocuments).await);
        };

        let mut failure = None;
        'indexes: for (index, documents) in &self.batches {
            for document in documents {
                let id = document.gid();
                match conn.cluster().index_document(index, id, document).await {
                    Ok(()) => {
                        debug!(index = %index, gid = %id, "Document written");
                        *self.report.documents.entry(index.clone()).or_default() += 1;
                    }
                    Err(e) => {
                        error!(index = %index, gid = %id, path = %document.path(), error = ?e, "Document write failed");
                        failure = Some(e);
                        break 'indexes;
                    }
                }
            }
        }
        self.batches.clear();

        if let Some(e) = failure {
            let err = PublishError::transport(PublishState::WritingDocuments, e);
            return Err(self.fail(err).await);
        }

        if let Some(conn) = self.connection.take() {
            if let Err(e) = conn.disconnect().await {
                self.state = PublishState::Failed;
                return Err(PublishError::transport(PublishState::Disconnected, e));
            }
        }

        let message = format!(
            "Finished! {} documents published to {} indexes",
            self.report.documents_written(),
            self.report.documents.len()
        );
        Ok(self.enter(PublishState::Disconnected, message))
    }

    /// Releases the connection and moves to `Failed`, keeping `err` as the cause.
    async fn fail(&mut self, err: PublishError) -> PublishError {
        if let Some(conn) = self.connection.take() {
            if let Err(close_err) = conn.disconnect().await {
                warn!(error = ?close_err, "Disconnect after failure also failed");
            }
        }
        error!(stage = %err.stage(), error = %err, "Publish failed");
        self.state = PublishState::Failed;
        err
    }

    async fn missing_connection(&mut self, stage: PublishState) -> PublishError {
        let err = PublishError::transport(
            stage,
            crate::error::TransportError::new("connection", "no open connection"),
        );
        self.fail(err).await
    }
}

impl<C: ?Sized, P: ?Sized> Drop for PublishRun<'_, C, P> {
    fn drop(&mut self) {
        let Some(conn) = self.connection.take() else {
            return;
        };
        warn!(stage = %self.state, address = %conn.address(), "Publish run dropped with an open connection, releasing it");
        let release = async move {
            if let Err(e) = conn.disconnect().await {
                warn!(error = ?e, "Disconnect of a dropped run failed");
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(release);
            }
            Err(_) => futures::executor::block_on(release),
        }
    }
}

/// Runs a whole publish, logging each progress message, and returns its report.
///
/// The connection is released whether or not the publish succeeds.
pub async fn publish<C, P>(
    connector: &C,
    pad: &P,
    persisted: &Credentials,
    request: PublishRequest,
) -> Result<PublishReport, PublishError>
where
    C: ClusterConnector + ?Sized,
    P: Pad + ?Sized,
{
    info!("[PUBLISH] Starting publish pipeline");
    let mut run = PublishRun::new(connector, pad, persisted, request);
    while let Some(step) = run.advance().await {
        let progress = step?;
        debug!(stage = %progress.state, message = %progress.message, "[PUBLISH] Progress");
    }
    let report = run.into_report();
    info!(
        documents = report.documents_written(),
        indexes_created = report.indexes_created.len(),
        "[PUBLISH] Publish complete"
    );
    Ok(report)
}
