//! Error taxonomy for the publish pipeline.
//!
//! Fatal failures are [`CredentialError`] (raised before the cluster is touched)
//! and [`TransportError`] (raised by the cluster capability). Both surface to the
//! caller wrapped in [`PublishError`], which records the stage that failed.
//! Malformed content is never an error: see [`MalformedContentWarning`].

use std::fmt;

use thiserror::Error;

use crate::publish::PublishState;

/// Credential field name used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Host,
    AccessKey,
    AccessSecret,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialField::Host => "host",
            CredentialField::AccessKey => "access_key",
            CredentialField::AccessSecret => "access_secret",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error(
        "credential `{0}` for the search cluster not found. Please include it with CLI arguments or the config file"
    )]
    Missing(CredentialField),
    #[error("could not construct a transport to the search cluster: {0}")]
    Transport(#[source] TransportError),
}

/// A failure talking to the cluster. `operation` names the capability call.
#[derive(Error, Debug)]
#[error("{operation} failed: {message}")]
pub struct TransportError {
    pub operation: &'static str,
    pub message: String,
}

impl TransportError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("no content root found at {0}")]
    MissingRoot(std::path::PathBuf),
    #[error("io error reading content: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publish failed while {stage}: {source}")]
    Credentials {
        stage: PublishState,
        #[source]
        source: CredentialError,
    },
    #[error("publish failed while {stage}: {source}")]
    Transport {
        stage: PublishState,
        #[source]
        source: TransportError,
    },
}

impl PublishError {
    /// The stage in which the publish stopped.
    pub fn stage(&self) -> PublishState {
        match self {
            PublishError::Credentials { stage, .. } | PublishError::Transport { stage, .. } => {
                *stage
            }
        }
    }

    pub(crate) fn transport(stage: PublishState, source: TransportError) -> Self {
        PublishError::Transport { stage, source }
    }
}

/// A content line that could not be read as a field. Skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedContentWarning {
    /// 1-based line number in the contents text.
    pub line: usize,
    pub text: String,
}

impl fmt::Display for MalformedContentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: cannot read field from {:?}", self.line, self.text)
    }
}
