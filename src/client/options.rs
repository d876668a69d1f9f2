//! Contains the options that configure how commands are sent to a server.


use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{de::Unexpected, Deserialize, Deserializer, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{Error, Result};

pub use crate::client::auth::{AuthMechanism, Credential};

/// Specifies the server API version to declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum ServerApiVersion {
    /// Use API version 1.
    #[serde(rename = "1")]
    V1,
}

impl FromStr for ServerApiVersion {
    type Err = Error;

    fn from_str(str: &str) -> Result<Self> {
        match str {
            "1" => Ok(Self::V1),
            _ => Err(Error::invalid_argument(format!(
                "invalid server api version string: {str}"
            ))),
        }
    }
}

impl Display for ServerApiVersion {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "1"),
        }
    }
}

impl<'de> Deserialize<'de> for ServerApiVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        ServerApiVersion::from_str(&s).map_err(|_| {
            serde::de::Error::invalid_value(Unexpected::Str(&s), &"a valid version number")
        })
    }
}

/// Options used to declare a stable server API. When set, the declaration is attached to every
/// command sent to the server, including the commands sent while authenticating.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash, Serialize, TypedBuilder)]
#[non_exhaustive]
pub struct ServerApi {
    /// The declared API version.
    #[serde(rename = "apiVersion")]
    pub version: ServerApiVersion,

    /// Whether the MongoDB server should reject all commands that are not part of the
    /// declared API version. This includes command options and aggregation pipeline stages.
    #[builder(default, setter(strip_option))]
    #[serde(rename = "apiStrict")]
    pub strict: Option<bool>,

    /// Whether the MongoDB server should return command failures when functionality that is
    /// deprecated from the declared API version is used.
    #[builder(default, setter(strip_option))]
    #[serde(rename = "apiDeprecationErrors")]
    pub deprecation_errors: Option<bool>,
}

impl Display for ServerApi {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{{ Version : {}", self.version)?;
        if let Some(strict) = self.strict {
            write!(f, ", Strict : {strict}")?;
        }
        if let Some(deprecation_errors) = self.deprecation_errors {
            write!(f, ", DeprecationErrors : {deprecation_errors}")?;
        }
        write!(f, " }}")
    }
}
