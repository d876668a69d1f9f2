pub(crate) mod command;

use std::future::Future;

use derive_more::Display;

pub use self::command::{check_reply, Command};
use crate::{bson::Document, cmap::CancellationToken, error::Result};

/// Identifies a connection in errors and log messages.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("connection {id} to {address}")]
#[non_exhaustive]
pub struct ConnectionId {
    /// A driver-generated identifier that uniquely identifies the connection.
    pub id: u32,

    /// A server-generated identifier that uniquely identifies the connection. Available when
    /// the server reports it during the initial handshake.
    pub server_id: Option<i64>,

    /// The address that the connection is connected to, e.g. `localhost:27017`.
    pub address: String,
}

impl ConnectionId {
    /// Creates an identifier for a connection whose server-side id is not yet known.
    pub fn new(id: u32, address: impl Into<String>) -> Self {
        Self {
            id,
            server_id: None,
            address: address.into(),
        }
    }

    /// Records the server-side id reported during the handshake.
    pub fn with_server_id(mut self, server_id: i64) -> Self {
        self.server_id = Some(server_id);
        self
    }
}

/// An established connection to a server that commands can be run over.
///
/// Implementations own the transport: they serialize the [`Command`] (see
/// [`Command::to_document`]), send it, and return the reply body. Replies with `ok: 0` must be
/// turned into [`ErrorKind::Command`](crate::error::ErrorKind::Command) errors, which
/// [`check_reply`] does. If `cancellation` fires while a command is in flight the
/// implementation should stop waiting and return an error; callers add no checkpoints of their
/// own.
///
/// A connection must not be used for unrelated traffic while a caller is in the middle of a
/// multi-command exchange such as authentication.
pub trait Connection: Send {
    /// The identifier of this connection.
    fn id(&self) -> &ConnectionId;

    /// Sends `command` and waits for the server's reply.
    fn send_command(
        &mut self,
        command: Command,
        cancellation: &CancellationToken,
    ) -> impl Future<Output = Result<Document>> + Send;
}
