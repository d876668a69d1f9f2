//! Contains the model of the `buildInfo` command, which is how a server reports its version.

use serde::Deserialize;

use crate::{
    bson::{doc, from_document, Document},
    cmap::{CancellationToken, Command, Connection},
    error::{Error, Result},
    sync,
    version::Version,
};

/// Builds the `{ buildInfo: 1 }` command, run against `admin`.
pub fn build_info_command() -> Command {
    Command::new("buildInfo", "admin", doc! { "buildInfo": 1 })
}

/// The parts of a `buildInfo` reply that describe the server's version.
///
/// See the documentation [here](https://www.mongodb.com/docs/manual/reference/command/buildInfo/) for more details.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct BuildInfo {
    /// The version string, e.g. `"4.4.1"` or `"4.3.4-10-gabcdef0"` for development builds.
    pub version: Option<String>,

    /// The numeric components of the version, e.g. `[4, 4, 1, 0]`.
    pub version_array: Option<Vec<i32>>,

    /// The commit the server was built from.
    pub git_version: Option<String>,
}

impl BuildInfo {
    /// Parses a `buildInfo` reply.
    pub fn from_reply(reply: Document) -> Result<Self> {
        Ok(from_document(reply)?)
    }

    /// The server's version. The `version` string is preferred since it carries pre-release
    /// information; `versionArray` is used when the string is absent.
    pub fn server_version(&self) -> Result<Version> {
        match (&self.version, &self.version_array) {
            (Some(version), _) => Version::parse(version),
            (None, Some(components)) => Version::from_version_array(components),
            (None, None) => Err(Error::invalid_response(
                "buildInfo reply contained neither version nor versionArray",
            )),
        }
    }
}

/// Runs `buildInfo` over `conn` and returns the server's version.
pub async fn server_version<C: Connection>(
    conn: &mut C,
    cancellation: &CancellationToken,
) -> Result<Version> {
    let reply = conn.send_command(build_info_command(), cancellation).await?;
    BuildInfo::from_reply(reply)?.server_version()
}

/// Blocking form of [`server_version`].
pub fn server_version_blocking<C: sync::Connection>(
    conn: &mut C,
    cancellation: &CancellationToken,
) -> Result<Version> {
    let reply = conn.send_command(build_info_command(), cancellation)?;
    BuildInfo::from_reply(reply)?.server_version()
}
