use crate::{
    client::auth::AuthMechanism,
    cmap::ConnectionId,
    error::Error,
    trace::{TracingRepresentation, CONNECTION_TRACING_EVENT_TARGET},
};

/// The stages of authenticating a connection that are reported as tracing events. Secrets such as
/// the password, the nonce and the derived key are never part of an event.
pub(crate) enum AuthenticationEvent<'a> {
    Started,
    Succeeded,
    Failed { failure: &'a Error },
}

impl AuthenticationEvent<'_> {
    pub(crate) fn emit(
        &self,
        connection_id: &ConnectionId,
        mechanism: AuthMechanism,
        username: &str,
        source: &str,
    ) {
        match self {
            AuthenticationEvent::Started => {
                tracing::debug!(
                    target: CONNECTION_TRACING_EVENT_TARGET,
                    driverConnectionId = connection_id.id,
                    serverConnectionId = connection_id.server_id,
                    serverHost = connection_id.address.as_str(),
                    mechanism = mechanism.as_str(),
                    username,
                    source,
                    "Connection authentication started",
                );
            }
            AuthenticationEvent::Succeeded => {
                tracing::debug!(
                    target: CONNECTION_TRACING_EVENT_TARGET,
                    driverConnectionId = connection_id.id,
                    serverConnectionId = connection_id.server_id,
                    serverHost = connection_id.address.as_str(),
                    mechanism = mechanism.as_str(),
                    username,
                    source,
                    "Connection authentication succeeded",
                );
            }
            AuthenticationEvent::Failed { failure } => {
                tracing::debug!(
                    target: CONNECTION_TRACING_EVENT_TARGET,
                    driverConnectionId = connection_id.id,
                    serverConnectionId = connection_id.server_id,
                    serverHost = connection_id.address.as_str(),
                    mechanism = mechanism.as_str(),
                    username,
                    source,
                    failure = failure.tracing_representation(),
                    "Connection authentication failed",
                );
            }
        }
    }
}
