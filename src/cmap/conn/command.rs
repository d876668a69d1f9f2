use serde::{Deserialize, Serialize};

use crate::{
    bson::Document,
    bson_util,
    client::options::ServerApi,
    error::{CommandError, Error, ErrorKind, Result},
};

/// Driver-side model of a database command.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
pub struct Command {
    #[serde(skip)]
    pub(crate) name: String,

    #[serde(flatten)]
    pub(crate) body: Document,

    #[serde(rename = "$db")]
    pub(crate) target_db: String,

    #[serde(flatten)]
    server_api: Option<ServerApi>,
}

impl Command {
    /// Creates a command named `name` that runs against `target_db`. The command name must be
    /// the first key of `body`.
    pub fn new(name: impl ToString, target_db: impl ToString, body: Document) -> Self {
        Self {
            name: name.to_string(),
            target_db: target_db.to_string(),
            body,
            server_api: None,
        }
    }

    pub(crate) fn set_server_api(&mut self, server_api: &ServerApi) {
        self.server_api = Some(server_api.clone());
    }

    /// The name of the command, e.g. `getnonce`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database the command runs against.
    pub fn target_db(&self) -> &str {
        &self.target_db
    }

    /// The command document, without the `$db` and server API fields.
    pub fn body(&self) -> &Document {
        &self.body
    }

    /// The server API declaration attached to this command, if any.
    pub fn server_api(&self) -> Option<&ServerApi> {
        self.server_api.as_ref()
    }

    /// The full document to put on the wire: the body followed by `$db` and, when declared, the
    /// `apiVersion`, `apiStrict` and `apiDeprecationErrors` fields.
    pub fn to_document(&self) -> Result<Document> {
        Ok(crate::bson::to_document(self)?)
    }
}

/// A response body useful for deserializing command errors.
#[derive(Deserialize, Debug)]
struct CommandErrorBody {
    #[serde(rename = "errorLabels")]
    error_labels: Option<Vec<String>>,

    #[serde(flatten)]
    command_error: CommandError,
}

impl From<CommandErrorBody> for Error {
    fn from(command_error_response: CommandErrorBody) -> Error {
        Error::new(
            ErrorKind::Command(command_error_response.command_error),
            command_error_response.error_labels,
        )
    }
}

/// Checks the `ok` field of a command reply, returning the reply unchanged on success and an
/// [`ErrorKind::Command`] error carrying the server's code, code name, message and error labels
/// otherwise.
pub fn check_reply(reply: Document) -> Result<Document> {
    if bson_util::is_ok(&reply) {
        return Ok(reply);
    }

    let message = reply
        .get_str("errmsg")
        .unwrap_or("invalid server response")
        .to_string();
    match crate::bson::from_document::<CommandErrorBody>(reply) {
        Ok(body) => Err(body.into()),
        Err(_) => Err(Error::invalid_response(message)),
    }
}
