//! Contains all of the types needed to configure version negotiation and authentication.
//!
//! The options structs in this module use the
//! [`typed-builder`](https://crates.io/crates/typed-builder) crate to derive a type-safe builder
//! API on them. For example, to declare the stable server API with strict mode enabled:
//!
//! ```rust
//! # use mongodb_core::options::{ServerApi, ServerApiVersion};
//! #
//! # let server_api = ServerApi::builder()
//! #                   .version(ServerApiVersion::V1)
//! #                   .strict(true)
//! #                   .build();
//! ```

pub use crate::{client::options::*, hello::HandshakeOptions};
