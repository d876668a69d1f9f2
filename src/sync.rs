//! Contains the blocking counterparts of the connection abstraction.
//!
//! Authenticators drive the same conversation over a [`Connection`] from this module as they do
//! over an async [`cmap::Connection`](crate::cmap::Connection); the only difference is that each
//! round trip blocks the calling thread.

use crate::{
    bson::Document,
    cmap::{CancellationToken, Command, ConnectionId},
    error::Result,
};

/// A connection to a server that executes commands by blocking the current thread.
pub trait Connection {
    /// Identifies this connection in errors and tracing events.
    fn id(&self) -> &ConnectionId;

    /// Sends `command` and blocks until its reply arrives. Implementations must return an
    /// [`ErrorKind::Command`](crate::error::ErrorKind::Command) error when the server replies
    /// with `ok: 0`; [`check_reply`](crate::cmap::check_reply) does this conversion.
    fn send_command(
        &mut self,
        command: Command,
        cancellation: &CancellationToken,
    ) -> Result<Document>;
}
