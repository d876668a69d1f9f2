//! The legacy MONGODB-CR challenge-response mechanism.
//!
//! The client asks the server for a one-time nonce with `getnonce`, then proves knowledge of the
//! password by sending `hex(MD5(nonce + username + passwordDigest))` with `authenticate`. The
//! password itself never leaves the client.

use std::fmt::{self, Debug, Formatter};

use crate::{
    bson::{doc, Document},
    client::{
        auth::{self, AuthMechanism, Authenticator, Credential},
        options::ServerApi,
    },
    cmap::{CancellationToken, Command, Connection, ConnectionId},
    error::{Error, ErrorKind, Result},
    sync,
};
use md5::{Digest, Md5};

/// Authenticates connections with the MONGODB-CR mechanism.
///
/// The credential is validated once at construction; authenticating never fails for any reason
/// other than a failed round trip with the server.
#[derive(Clone)]
pub struct MongoDbCrAuthenticator {
    username: String,
    password: String,
    source: String,
    server_api: Option<ServerApi>,
}

impl MongoDbCrAuthenticator {
    /// Creates an authenticator for `credential`, which must carry a username and a password. The
    /// source database defaults to `"admin"`.
    pub fn new(credential: Credential) -> Result<Self> {
        AuthMechanism::MongoDbCr.validate_credential(&credential)?;
        let source = credential.resolved_source().to_string();
        match (credential.username, credential.password) {
            (Some(username), Some(password)) => Ok(Self {
                username,
                password,
                source,
                server_api: None,
            }),
            _ => Err(Error::internal(
                "validated MONGODB-CR credential is missing a username or password",
            )),
        }
    }

    /// Declares `server_api` on every command this authenticator sends.
    pub fn with_server_api(mut self, server_api: impl Into<Option<ServerApi>>) -> Self {
        self.server_api = server_api.into();
        self
    }

    /// The username being authenticated.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The database the credential is authenticated against.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Starts a new conversation for the connection identified by `connection_id`. Every
    /// authentication attempt needs a fresh conversation, since each one uses a new nonce.
    pub fn conversation(&self, connection_id: impl Into<Option<ConnectionId>>) -> Conversation<'_> {
        Conversation {
            authenticator: self,
            connection_id: connection_id.into(),
            state: State::AwaitingNonce,
        }
    }

    fn command(&self, name: &str, body: Document) -> Command {
        let mut command = Command::new(name, &self.source, body);
        if let Some(ref server_api) = self.server_api {
            command.set_server_api(server_api);
        }
        command
    }

    /// `hex(MD5(nonce + username + hex(MD5("<username>:mongo:<password>"))))`
    fn key(&self, nonce: &str) -> String {
        let digest = auth::mongo_password_digest(&self.username, &self.password);
        // nosemgrep: insecure-hashes
        let mut md5 = Md5::new(); // mongodb rating: No Fix Needed
        md5.update(nonce);
        md5.update(&self.username);
        md5.update(digest);
        hex::encode(md5.finalize())
    }

    #[cfg_attr(not(feature = "tracing-unstable"), allow(unused_variables))]
    fn emit(&self, connection_id: &ConnectionId, outcome: Option<&Result<()>>) {
        #[cfg(feature = "tracing-unstable")]
        {
            use crate::trace::connection::AuthenticationEvent;

            let event = match outcome {
                None => AuthenticationEvent::Started,
                Some(Ok(())) => AuthenticationEvent::Succeeded,
                Some(Err(failure)) => AuthenticationEvent::Failed { failure },
            };
            event.emit(connection_id, self.mechanism(), &self.username, &self.source);
        }
    }
}

impl Debug for MongoDbCrAuthenticator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoDbCrAuthenticator")
            .field("username", &self.username)
            .field("source", &self.source)
            .field("server_api", &self.server_api)
            .finish_non_exhaustive()
    }
}

impl Authenticator for MongoDbCrAuthenticator {
    fn mechanism(&self) -> AuthMechanism {
        AuthMechanism::MongoDbCr
    }

    async fn authenticate<C: Connection>(
        &self,
        conn: &mut C,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        let connection_id = conn.id().clone();
        self.emit(&connection_id, None);

        let mut conversation = self.conversation(connection_id.clone());
        let mut command = conversation.first_command();
        let result = loop {
            let reply = conn.send_command(command, cancellation).await;
            match conversation.handle_reply(reply) {
                Ok(Step::Send(next)) => command = next,
                Ok(Step::Done) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.emit(&connection_id, Some(&result));
        result
    }

    fn authenticate_blocking<C: sync::Connection>(
        &self,
        conn: &mut C,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        let connection_id = conn.id().clone();
        self.emit(&connection_id, None);

        let mut conversation = self.conversation(connection_id.clone());
        let mut command = conversation.first_command();
        let result = loop {
            let reply = conn.send_command(command, cancellation);
            match conversation.handle_reply(reply) {
                Ok(Step::Send(next)) => command = next,
                Ok(Step::Done) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.emit(&connection_id, Some(&result));
        result
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    AwaitingNonce,
    Authenticating,
    Done,
    Failed,
}

/// What the caller should do after handing a reply to a [`Conversation`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Step {
    /// Send this command and pass its reply back to the conversation.
    Send(Command),

    /// Authentication succeeded.
    Done,
}

/// A single MONGODB-CR exchange, independent of how commands reach the server.
///
/// The conversation moves from awaiting a nonce to authenticating to done. Any failed reply moves
/// it to a terminal failed state and is reported as an authentication error that carries the
/// reply's error as its cause. This includes transport failures such as I/O errors or a
/// cancelled send, not only commands the server rejected; inspect [`Error::cause`] to tell them
/// apart. There is no retry.
#[derive(Debug)]
pub struct Conversation<'a> {
    authenticator: &'a MongoDbCrAuthenticator,
    connection_id: Option<ConnectionId>,
    state: State,
}

impl Conversation<'_> {
    /// The `getnonce` command that opens the conversation.
    pub fn first_command(&self) -> Command {
        self.authenticator
            .command("getnonce", doc! { "getnonce": 1 })
    }

    /// Advances the conversation with the outcome of the last command sent.
    pub fn handle_reply(&mut self, reply: Result<Document>) -> Result<Step> {
        let outcome = match self.state {
            State::AwaitingNonce => reply.and_then(|reply| self.authenticate_command(&reply)),
            State::Authenticating => reply.map(|_| Step::Done),
            State::Done | State::Failed => {
                return Err(Error::internal(
                    "MONGODB-CR conversation received a reply after it finished",
                ))
            }
        };

        match outcome {
            Ok(Step::Send(command)) => {
                self.state = State::Authenticating;
                Ok(Step::Send(command))
            }
            Ok(Step::Done) => {
                self.state = State::Done;
                Ok(Step::Done)
            }
            Err(cause) => {
                self.state = State::Failed;
                Err(self.failure(cause))
            }
        }
    }

    /// Whether the conversation finished successfully.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Whether the conversation finished with an error.
    pub fn is_failed(&self) -> bool {
        self.state == State::Failed
    }

    fn authenticate_command(&self, reply: &Document) -> Result<Step> {
        let nonce = reply.get_str("nonce").map_err(|_| {
            Error::invalid_response("getnonce reply did not contain a string nonce")
        })?;
        let authenticator = self.authenticator;
        let body = doc! {
            "authenticate": 1,
            "user": authenticator.username.as_str(),
            "nonce": nonce,
            "key": authenticator.key(nonce),
        };
        Ok(Step::Send(authenticator.command("authenticate", body)))
    }

    fn failure(&self, cause: Error) -> Error {
        Error::from(ErrorKind::Authentication {
            message: format!(
                "Unable to authenticate username '{}' on database '{}'.",
                self.authenticator.username, self.authenticator.source
            ),
            connection_id: self.connection_id.clone(),
        })
        .with_source(cause)
    }
}
