//! This crate contains the server version negotiation and connection authentication core of the
//! MongoDB Rust driver. It uses the [`bson`] crate for BSON support.
//!
//! It provides:
//! - [`version::Version`] and [`version::BuildVersion`], which parse and totally order the version
//!   strings reported by servers, including release candidates and development builds.
//! - [`feature::FeatureRegistry`], a read-only table of [`feature::Feature`] gates that decide
//!   whether a server version supports a capability, and whether an option such as a write hint
//!   should be sent, left out, or rejected.
//! - [`MongoDbCrAuthenticator`], the legacy MONGODB-CR challenge-response mechanism, usable over
//!   an async [`cmap::Connection`] or a blocking [`sync::Connection`].
//!
//! The transport is not part of this crate: callers provide a connection that can send a
//! [`cmap::Command`] and return the reply document.
//!
//! # Example
//!
//! ```rust
//! use mongodb_core::{
//!     feature::{FeatureRegistry, SESSIONS},
//!     version::Version,
//! };
//!
//! let registry = FeatureRegistry::default();
//! let server_version: Version = "4.2.0-rc1".parse()?;
//!
//! assert!(server_version < Version::new(4, 2, 0));
//! assert!(registry.is_supported(SESSIONS, &server_version)?);
//! # Ok::<(), mongodb_core::error::Error>(())
//! ```
//!
//! # Feature Flags
//!
//! | Feature            | Description                                                                                  |
//! |:-------------------|:---------------------------------------------------------------------------------------------|
//! | `tracing-unstable` | Emit [`tracing`](https://docs.rs/tracing) events for authentication and feature-gate checks. |
//!
//! ## Minimum supported Rust version (MSRV)
//!
//! The MSRV for this crate is currently 1.83.0. This will rarely be increased, and if it ever is,
//! it will only happen in a minor or major version release.

#![warn(missing_docs)]
#![cfg_attr(docsrs, warn(rustdoc::missing_crate_level_docs))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod options;

pub use ::bson;

mod bson_util;
pub mod build_info;
mod client;
pub mod cmap;
pub mod error;
pub mod feature;
pub mod hello;
pub mod sync;
#[cfg(feature = "tracing-unstable")]
mod trace;
pub mod version;

pub use crate::client::auth::{Authenticator, Conversation, MongoDbCrAuthenticator, Step};
