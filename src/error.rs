//! Contains the `Error` and `Result` types that `mongodb_core` uses.

use std::{collections::HashSet, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cmap::ConnectionId;

/// The result type for all methods that can return an error in the `mongodb_core` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `mongodb_core` crate. The inner
/// [`ErrorKind`](enum.ErrorKind.html) is wrapped in a `Box` to keep the error small.
#[derive(Clone, Debug, Error)]
#[error("Kind: {kind}, labels: {labels:?}, source: {source:?}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,

    labels: HashSet<String>,

    #[source]
    pub(crate) source: Option<Box<Error>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, labels: Option<impl IntoIterator<Item = String>>) -> Self {
        Self {
            kind: Box::new(kind),
            labels: labels
                .map(|labels| labels.into_iter().collect())
                .unwrap_or_default(),
            source: None,
        }
    }

    /// Creates an `Authentication` error for the given mechanism with the provided reason.
    pub(crate) fn authentication_error(mechanism_name: &str, reason: &str) -> Self {
        ErrorKind::Authentication {
            message: format!("{mechanism_name} failure: {reason}"),
            connection_id: None,
        }
        .into()
    }

    /// Creates an `InvalidResponse` error when a reply lacks a field the caller needs.
    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        ErrorKind::InvalidResponse {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ErrorKind::InvalidArgument {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        ErrorKind::Internal {
            message: message.into(),
        }
        .into()
    }

    /// Whether this error was raised while authenticating a connection.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Authentication { .. })
    }

    /// Whether the server rejected a command.
    pub fn is_command_error(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Command(_))
    }

    /// Whether an invalid argument was provided.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::InvalidArgument { .. })
    }

    /// Whether a feature gate rejected the operation before it reached the server.
    pub fn is_incompatible_server(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::IncompatibleServer { .. })
    }

    /// Gets the code from this error, if the server reported one.
    pub fn code(&self) -> Option<i32> {
        match self.kind.as_ref() {
            ErrorKind::Command(command_error) => Some(command_error.code),
            _ => None,
        }
    }

    /// Returns the labels for this error.
    pub fn labels(&self) -> &HashSet<String> {
        &self.labels
    }

    /// Whether this error contains the specified label.
    pub fn contains_label<T: AsRef<str>>(&self, label: T) -> bool {
        self.labels.contains(label.as_ref())
    }

    /// The error that caused this one, if any. Authentication failures carry the command error
    /// that aborted the conversation here.
    pub fn cause(&self) -> Option<&Error> {
        self.source.as_deref()
    }

    pub(crate) fn with_source<E: Into<Option<Error>>>(mut self, source: E) -> Self {
        self.source = source.into().map(Box::new);
        self
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Error::new(err.into(), None::<Option<String>>)
    }
}

impl From<bson::de::Error> for ErrorKind {
    fn from(err: bson::de::Error) -> Self {
        Self::BsonDeserialization(err)
    }
}

impl From<bson::ser::Error> for ErrorKind {
    fn from(err: bson::ser::Error) -> Self {
        Self::BsonSerialization(err)
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// The types of errors that can occur.
#[allow(missing_docs)]
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An invalid argument was provided.
    #[error("An invalid argument was provided: {message}")]
    #[non_exhaustive]
    InvalidArgument { message: String },

    /// A version string could not be parsed.
    #[error("Invalid version string: '{input}'")]
    #[non_exhaustive]
    InvalidVersion { input: String },

    /// An error occurred while attempting to authenticate a connection.
    #[error("{message}")]
    #[non_exhaustive]
    Authentication {
        message: String,

        /// The connection that failed to authenticate, if known.
        connection_id: Option<ConnectionId>,
    },

    /// Wrapper around `bson::de::Error`.
    #[error("{0}")]
    BsonDeserialization(bson::de::Error),

    /// Wrapper around `bson::ser::Error`.
    #[error("{0}")]
    BsonSerialization(bson::ser::Error),

    /// The server returned an error to an attempted command.
    #[error("Command failed: {0}")]
    Command(CommandError),

    #[error("Internal error: {message}")]
    #[non_exhaustive]
    Internal { message: String },

    /// Wrapper around [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// The server returned an invalid reply to a command.
    #[error("The server returned an invalid reply to a database operation: {message}")]
    #[non_exhaustive]
    InvalidResponse { message: String },

    /// The server does not support the operation.
    #[error("The server does not support a database operation: {message}")]
    #[non_exhaustive]
    IncompatibleServer { message: String },
}

/// An error that occurred due to a database command failing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct CommandError {
    /// Identifies the type of error.
    pub code: i32,

    /// The name associated with the error code.
    #[serde(rename = "codeName", default)]
    pub code_name: String,

    /// A description of the error that occurred.
    #[serde(rename = "errmsg", default = "String::new")]
    pub message: String,
}

impl CommandError {
    /// Creates a command error, as a connection implementation would when the server replies
    /// with `ok: 0`.
    pub fn new(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            code_name: code_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Error code {} ({}): {}",
            self.code, self.code_name, self.message
        )
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{CommandError, Error, ErrorKind};

    #[test]
    fn authentication_error_keeps_cause() {
        let cause: Error = ErrorKind::Command(CommandError::new(18, "AuthenticationFailed", "bad"))
            .into();
        let err = Error::authentication_error("MONGODB-CR", "denied").with_source(cause);

        assert!(err.is_auth_error());
        assert_eq!(err.cause().and_then(Error::code), Some(18));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn command_error_display() {
        let err = CommandError::new(59, "CommandNotFound", "no such command: 'getnonce'");
        assert_eq!(
            err.to_string(),
            "Error code 59 (CommandNotFound): no such command: 'getnonce'"
        );
    }

    #[test]
    fn labels() {
        let err = Error::new(
            ErrorKind::Internal {
                message: "x".to_string(),
            },
            Some(vec!["RetryableError".to_string()]),
        );
        assert!(err.contains_label("RetryableError"));
        assert!(!err.contains_label("TransientTransactionError"));
    }
}
