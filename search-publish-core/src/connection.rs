//! Cluster connection lifecycle.
//!
//! [`connect`] validates the resolved credentials and asks a [`ClusterConnector`]
//! for a session. The returned [`Connection`] is owned by exactly one publish
//! invocation and is released by [`Connection::disconnect`], which consumes it.

use tracing::{error, info, warn};

use crate::contract::{ClusterConnector, SearchCluster};
use crate::credentials::Credentials;
use crate::error::{CredentialError, CredentialField, TransportError};

/// Port a transport uses when neither the credentials nor the host address name one.
pub const DEFAULT_PORT: u16 = 9200;

/// An open, exclusively owned session to the search cluster.
pub struct Connection {
    cluster: Box<dyn SearchCluster>,
    host: String,
    port: Option<u16>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn cluster(&self) -> &dyn SearchCluster {
        self.cluster.as_ref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port supplied with the credentials. `None` leaves the choice to the
    /// transport: a port in the host address, else [`DEFAULT_PORT`].
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `host`, or `host:port` when a port was supplied.
    pub fn address(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Releases the transport. Consuming `self` makes a second release impossible.
    pub async fn disconnect(self) -> Result<(), TransportError> {
        match self.cluster.close().await {
            Ok(()) => {
                info!(host = %self.host, port = ?self.port, "Disconnected from search cluster");
                Ok(())
            }
            Err(e) => {
                warn!(host = %self.host, error = ?e, "Closing the cluster transport failed");
                Err(e)
            }
        }
    }
}

/// Checks that every required credential field is filled in.
pub fn validate(credentials: &Credentials) -> Result<(), CredentialError> {
    let missing = if credentials.host.is_empty() {
        Some(CredentialField::Host)
    } else if credentials.access_key.is_empty() {
        Some(CredentialField::AccessKey)
    } else if credentials.access_secret.is_empty() {
        Some(CredentialField::AccessSecret)
    } else {
        None
    };

    match missing {
        Some(field) => {
            error!(field = %field, "Credential for search cluster is missing");
            Err(CredentialError::Missing(field))
        }
        None => Ok(()),
    }
}

/// Opens a session to the cluster described by `credentials`.
///
/// Fails with [`CredentialError`] before touching the connector when a
/// required field is empty, and when the connector cannot build a transport.
pub fn connect<C>(connector: &C, credentials: &Credentials) -> Result<Connection, CredentialError>
where
    C: ClusterConnector + ?Sized,
{
    validate(credentials)?;

    let port = credentials.port;
    match connector.connect(credentials) {
        Ok(cluster) => {
            info!(host = %credentials.host, port = ?port, "Connected to search cluster");
            Ok(Connection {
                cluster,
                host: credentials.host.clone(),
                port,
            })
        }
        Err(e) => {
            error!(host = %credentials.host, port = ?port, error = ?e, "Failed to construct cluster transport");
            Err(CredentialError::Transport(e))
        }
    }
}
