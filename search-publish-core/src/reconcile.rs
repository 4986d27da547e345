//! Index reconciliation: every model gets an index on the cluster.
//!
//! Existence is always checked before creating. Existing indexes are never
//! deleted or altered, and new indexes carry no custom mapping or shard settings.

use std::collections::HashSet;

use tracing::{debug, error, info};

use crate::contract::SearchCluster;
use crate::error::TransportError;

pub async fn index_exists<C>(cluster: &C, model: &str) -> Result<bool, TransportError>
where
    C: SearchCluster + ?Sized,
{
    let exists = cluster.index_exists(model).await.map_err(|e| {
        error!(index = %model, error = ?e, "Index existence check failed");
        e
    })?;
    debug!(index = %model, exists, "Checked index");
    Ok(exists)
}

pub async fn create_index<C>(cluster: &C, model: &str) -> Result<(), TransportError>
where
    C: SearchCluster + ?Sized,
{
    match cluster.create_index(model).await {
        Ok(()) => {
            info!(index = %model, "Created index");
            Ok(())
        }
        Err(e) => {
            error!(index = %model, error = ?e, "Index creation failed");
            Err(e)
        }
    }
}

/// Creates the index for `model` unless it already exists.
/// Returns whether an index was created.
pub async fn ensure_index<C>(cluster: &C, model: &str) -> Result<bool, TransportError>
where
    C: SearchCluster + ?Sized,
{
    if index_exists(cluster, model).await? {
        return Ok(false);
    }
    create_index(cluster, model).await?;
    Ok(true)
}

/// Remembers which indexes are known to exist during one publish, so each is
/// checked and created at most once.
#[derive(Debug, Default)]
pub struct IndexReconciler {
    known: HashSet<String>,
    created: Vec<String>,
}

impl IndexReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure<C>(&mut self, cluster: &C, model: &str) -> Result<(), TransportError>
    where
        C: SearchCluster + ?Sized,
    {
        if self.known.contains(model) {
            return Ok(());
        }
        if ensure_index(cluster, model).await? {
            self.created.push(model.to_string());
        }
        self.known.insert(model.to_string());
        Ok(())
    }

    pub async fn ensure_all<C, I>(&mut self, cluster: &C, models: I) -> Result<(), TransportError>
    where
        C: SearchCluster + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for model in models {
            self.ensure(cluster, model.as_ref()).await?;
        }
        Ok(())
    }

    /// Indexes created so far, in creation order.
    pub fn created(&self) -> &[String] {
        &self.created
    }

    pub fn is_known(&self, model: &str) -> bool {
        self.known.contains(model)
    }
}
