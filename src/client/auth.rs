//! Contains the types needed to specify the auth configuration and to authenticate a
//! [`Connection`](crate::cmap::Connection).

pub(crate) mod mongodb_cr;

use std::{
    fmt::{self, Debug, Display, Formatter},
    future::Future,
    str::FromStr,
};

use md5::{Digest, Md5};
use serde::{de::Unexpected, Deserialize, Deserializer};
use typed_builder::TypedBuilder;

use crate::{
    bson::Document,
    cmap::{CancellationToken, Connection},
    error::{Error, Result},
    sync,
};

pub use self::mongodb_cr::{Conversation, MongoDbCrAuthenticator, Step};

const SCRAM_SHA_1_STR: &str = "SCRAM-SHA-1";
const SCRAM_SHA_256_STR: &str = "SCRAM-SHA-256";
const MONGODB_CR_STR: &str = "MONGODB-CR";
const GSSAPI_STR: &str = "GSSAPI";
const MONGODB_AWS_STR: &str = "MONGODB-AWS";
const MONGODB_X509_STR: &str = "MONGODB-X509";
const PLAIN_STR: &str = "PLAIN";
const MONGODB_OIDC_STR: &str = "MONGODB-OIDC";

/// The authentication mechanisms supported by MongoDB.
///
/// Note: only MONGODB-CR is implemented by this crate. The other mechanisms are listed so that
/// configuration naming them can be parsed and rejected with a clear error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum AuthMechanism {
    /// MongoDB Challenge Response nonce and MD5 based authentication system. It was removed in
    /// MongoDB 4.0 in favor of SCRAM and is only useful against older servers.
    MongoDbCr,

    /// The SCRAM-SHA-1 mechanism as defined in [RFC 5802](http://tools.ietf.org/html/rfc5802).
    ScramSha1,

    /// The SCRAM-SHA-256 mechanism which extends [RFC 5802](http://tools.ietf.org/html/rfc5802) and is formally defined in [RFC 7677](https://tools.ietf.org/html/rfc7677).
    ScramSha256,

    /// The MONGODB-X509 mechanism based on the usage of X.509 certificates to validate a client
    /// where the distinguished subject name of the client certificate acts as the username.
    MongoDbX509,

    /// Kerberos authentication mechanism as defined in [RFC 4752](http://tools.ietf.org/html/rfc4752).
    Gssapi,

    /// The SASL PLAIN mechanism, as defined in [RFC 4616](https://tools.ietf.org/html/rfc4616),
    /// used in MongoDB to perform LDAP authentication.
    Plain,

    /// MONGODB-AWS authenticates using AWS IAM credentials.
    MongoDbAws,

    /// MONGODB-OIDC authenticates using [OpenID Connect](https://openid.net/developers/specs/) access tokens.
    MongoDbOidc,
}

impl AuthMechanism {
    /// The name used to identify this mechanism to the server and in connection strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMechanism::ScramSha1 => SCRAM_SHA_1_STR,
            AuthMechanism::ScramSha256 => SCRAM_SHA_256_STR,
            AuthMechanism::MongoDbCr => MONGODB_CR_STR,
            AuthMechanism::MongoDbX509 => MONGODB_X509_STR,
            AuthMechanism::Gssapi => GSSAPI_STR,
            AuthMechanism::Plain => PLAIN_STR,
            AuthMechanism::MongoDbAws => MONGODB_AWS_STR,
            AuthMechanism::MongoDbOidc => MONGODB_OIDC_STR,
        }
    }

    /// Determines if the provided credentials have the required information to perform
    /// authentication.
    pub fn validate_credential(&self, credential: &Credential) -> Result<()> {
        match self {
            AuthMechanism::MongoDbCr | AuthMechanism::ScramSha1 | AuthMechanism::ScramSha256 => {
                if credential.username.as_deref().is_none_or(str::is_empty) {
                    return Err(Error::invalid_argument(format!(
                        "No username provided for {} authentication",
                        self.as_str()
                    )));
                }
                if credential.password.is_none() {
                    return Err(Error::invalid_argument(format!(
                        "No password provided for {} authentication",
                        self.as_str()
                    )));
                }
                if credential.source.as_deref() == Some("") {
                    return Err(Error::invalid_argument(format!(
                        "{} authentication requires a non-empty source database",
                        self.as_str()
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Get the default authSource for this mechanism.
    pub(crate) fn default_source(&self) -> &'static str {
        match self {
            AuthMechanism::MongoDbCr | AuthMechanism::ScramSha1 | AuthMechanism::ScramSha256 => {
                "admin"
            }
            _ => "$external",
        }
    }

    /// Returns the authenticator for this mechanism, after validating that `credential` carries
    /// what the mechanism needs.
    pub fn authenticator(&self, credential: &Credential) -> Result<MongoDbCrAuthenticator> {
        match self {
            AuthMechanism::MongoDbCr => MongoDbCrAuthenticator::new(credential.clone()),
            _ => Err(Error::authentication_error(
                self.as_str(),
                "mechanism is not supported by this crate",
            )),
        }
    }
}

impl Display for AuthMechanism {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMechanism {
    type Err = Error;

    fn from_str(str: &str) -> Result<Self> {
        match str {
            SCRAM_SHA_1_STR => Ok(AuthMechanism::ScramSha1),
            SCRAM_SHA_256_STR => Ok(AuthMechanism::ScramSha256),
            MONGODB_CR_STR => Ok(AuthMechanism::MongoDbCr),
            MONGODB_X509_STR => Ok(AuthMechanism::MongoDbX509),
            GSSAPI_STR => Ok(AuthMechanism::Gssapi),
            PLAIN_STR => Ok(AuthMechanism::Plain),
            MONGODB_AWS_STR => Ok(AuthMechanism::MongoDbAws),
            MONGODB_OIDC_STR => Ok(AuthMechanism::MongoDbOidc),
            _ => Err(Error::invalid_argument(format!(
                "invalid mechanism string: {str}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for AuthMechanism {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        AuthMechanism::from_str(&s).map_err(|_| {
            serde::de::Error::invalid_value(Unexpected::Str(&s), &"an authentication mechanism")
        })
    }
}

/// A struct containing authentication information.
///
/// The source may be omitted, in which case it defaults to the mechanism's default database
/// (`"admin"` for password-based mechanisms).
#[derive(Clone, Default, Deserialize, TypedBuilder, PartialEq)]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct Credential {
    /// The username to authenticate with.
    pub username: Option<String>,

    /// The database used to authenticate.
    pub source: Option<String>,

    /// The password to authenticate with.
    pub password: Option<String>,

    /// Which authentication mechanism to use.
    pub mechanism: Option<AuthMechanism>,
}

impl Credential {
    /// The database this credential authenticates against: the explicit source if one was
    /// provided, otherwise the default for the mechanism.
    pub fn resolved_source(&self) -> &str {
        match self.source {
            Some(ref source) => source,
            None => self
                .mechanism
                .as_ref()
                .map(AuthMechanism::default_source)
                .unwrap_or("admin"),
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential")
            .field(&"REDACTED".to_string())
            .finish()
    }
}

/// An authentication mechanism implementation.
///
/// Authenticators run after the initial handshake on a freshly established connection. The same
/// conversation is available in a suspending form for async connections and a blocking form for
/// [`sync::Connection`]s; both send the same commands in the same order.
pub trait Authenticator {
    /// The mechanism this authenticator implements.
    fn mechanism(&self) -> AuthMechanism;

    /// Gives the authenticator a chance to annotate the initial handshake document before it is
    /// sent. Mechanisms that need no annotation return it unchanged.
    fn customize_initial_hello(&self, hello: Document) -> Document {
        hello
    }

    /// Authenticates `conn`, yielding only while waiting for the server's replies.
    /// `cancellation` is passed through to every command sent.
    fn authenticate<C: Connection>(
        &self,
        conn: &mut C,
        cancellation: &CancellationToken,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Authenticates `conn`, blocking the current thread for each round trip.
    fn authenticate_blocking<C: sync::Connection>(
        &self,
        conn: &mut C,
        cancellation: &CancellationToken,
    ) -> Result<()>;
}

/// The hex-encoded `MD5("<username>:mongo:<password>")` digest MongoDB stores for password
/// credentials.
pub(crate) fn mongo_password_digest(username: &str, password: &str) -> String {
    // nosemgrep: insecure-hashes
    let mut md5 = Md5::new(); // mongodb rating: No Fix Needed
    md5.update(format!("{username}:mongo:{password}"));
    hex::encode(md5.finalize())
}
