//! Contains the initial handshake sent on every new connection.
//!
//! The handshake identifies the client to the server and, for authenticated connections, is
//! followed by the authentication conversation. Authenticators get to annotate the handshake
//! document before it is sent (see [`Authenticator::customize_initial_hello`]).

use typed_builder::TypedBuilder;

use crate::{
    bson::{doc, Document},
    client::{auth::Authenticator, options::ServerApi},
    cmap::{CancellationToken, Command, Connection},
    error::Result,
    sync,
};

/// The legacy version of the `hello` command which was deprecated in 5.0.
/// To limit usages of the legacy name in the codebase, this constant should be used
/// wherever possible.
pub const LEGACY_HELLO_COMMAND_NAME: &str = "isMaster";

const DRIVER_NAME: &str = "mongodb-core";

/// Options that shape the initial handshake.
#[derive(Clone, Debug, Default, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct HandshakeOptions {
    /// The application name reported to the server in the client metadata.
    pub app_name: Option<String>,

    /// The declared server API, if any. Declaring one forces the `hello` command.
    pub server_api: Option<ServerApi>,

    /// Whether the server is already known to support `hello`. `None` means unknown.
    pub hello_ok: Option<bool>,
}

/// Construct a hello or legacy hello command, depending on the circumstances.
///
/// If an API version is provided or the server indicated `helloOk: true`, `hello` will be used.
/// Otherwise, legacy hello will be used, and if it's unknown whether the server supports hello,
/// the command also will contain `helloOk: true`.
pub fn hello_command(server_api: Option<&ServerApi>, hello_ok: Option<bool>) -> Command {
    let (body, command_name) = if server_api.is_some() || matches!(hello_ok, Some(true)) {
        (doc! { "hello": 1 }, "hello")
    } else {
        let mut body = doc! { LEGACY_HELLO_COMMAND_NAME: 1 };
        if hello_ok.is_none() {
            body.insert("helloOk", true);
        }
        (body, LEGACY_HELLO_COMMAND_NAME)
    };

    let mut command = Command::new(command_name, "admin", body);
    if let Some(server_api) = server_api {
        command.set_server_api(server_api);
    }
    command
}

/// The `client` metadata document sent with the handshake.
pub fn client_metadata(app_name: Option<&str>) -> Document {
    let mut metadata = doc! {
        "driver": {
            "name": DRIVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "os": {
            "type": std::env::consts::OS,
            "architecture": std::env::consts::ARCH,
        },
    };
    if let Some(app_name) = app_name {
        metadata.insert("application", doc! { "name": app_name });
    }
    metadata
}

/// Builds the handshake for a connection that will not be authenticated.
pub fn handshake_command(options: &HandshakeOptions) -> Command {
    let mut command = hello_command(options.server_api.as_ref(), options.hello_ok);
    command
        .body
        .insert("client", client_metadata(options.app_name.as_deref()));
    command
}

/// Builds the handshake for a connection that `authenticator` will authenticate, after letting
/// it annotate the handshake document.
pub fn authenticated_handshake_command(
    options: &HandshakeOptions,
    authenticator: &impl Authenticator,
) -> Command {
    let mut command = handshake_command(options);
    command.body = authenticator.customize_initial_hello(command.body);
    command
}

/// Sends the handshake and then runs the authentication conversation, returning the handshake
/// reply.
pub async fn handshake<C: Connection, A: Authenticator>(
    conn: &mut C,
    options: &HandshakeOptions,
    authenticator: &A,
    cancellation: &CancellationToken,
) -> Result<Document> {
    let command = authenticated_handshake_command(options, authenticator);
    let reply = conn.send_command(command, cancellation).await?;
    authenticator.authenticate(conn, cancellation).await?;
    Ok(reply)
}

/// Blocking form of [`handshake`].
pub fn handshake_blocking<C: sync::Connection, A: Authenticator>(
    conn: &mut C,
    options: &HandshakeOptions,
    authenticator: &A,
    cancellation: &CancellationToken,
) -> Result<Document> {
    let command = authenticated_handshake_command(options, authenticator);
    let reply = conn.send_command(command, cancellation)?;
    authenticator.authenticate_blocking(conn, cancellation)?;
    Ok(reply)
}
