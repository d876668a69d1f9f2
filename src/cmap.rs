//! Contains the connection abstraction that authenticators send their commands over.

pub(crate) mod conn;

pub use tokio_util::sync::CancellationToken;

pub use self::conn::{check_reply, Command, Connection, ConnectionId};
