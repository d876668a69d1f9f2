//! Contains the feature gates used to decide which server capabilities can be relied upon.
//!
//! A [`Feature`] names a capability and the first server version that supports it. Gates are
//! collected in a [`FeatureRegistry`], which is built once and then shared read-only by whatever
//! needs version-dependent behavior:
//!
//! ```
//! use mongodb_core::{
//!     feature::{FeatureRegistry, HintDisposition, HINT_FOR_FIND_AND_MODIFY},
//!     version::Version,
//! };
//!
//! let registry = FeatureRegistry::default();
//! let hint = registry.require(HINT_FOR_FIND_AND_MODIFY)?;
//!
//! assert_eq!(hint.check_hint(&Version::new(4, 4, 0))?, HintDisposition::Include);
//! assert_eq!(hint.check_hint(&Version::new(4, 2, 0))?, HintDisposition::Omit);
//! assert!(hint.check_hint(&Version::new(4, 0, 0)).is_err());
//! # Ok::<(), mongodb_core::error::Error>(())
//! ```

#[cfg(test)]
mod test;

use std::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
};

use crate::{
    error::{Error, ErrorKind, Result},
    version::Version,
};

/// The name of the `aggregate_cursor_result` gate.
pub const AGGREGATE_CURSOR_RESULT: &str = "aggregate_cursor_result";
/// The name of the `aggregate_out` gate.
pub const AGGREGATE_OUT: &str = "aggregate_out";
/// The name of the `array_filters` gate.
pub const ARRAY_FILTERS: &str = "array_filters";
/// The name of the `change_stream_stage` gate.
pub const CHANGE_STREAM_STAGE: &str = "change_stream_stage";
/// The name of the `collation` gate.
pub const COLLATION: &str = "collation";
/// The name of the `commands_that_write_accept_write_concern` gate.
pub const COMMANDS_THAT_WRITE_ACCEPT_WRITE_CONCERN: &str =
    "commands_that_write_accept_write_concern";
/// The name of the `retryable_writes` gate.
pub const RETRYABLE_WRITES: &str = "retryable_writes";
/// The name of the `scram_sha_256_authentication` gate.
pub const SCRAM_SHA_256_AUTHENTICATION: &str = "scram_sha_256_authentication";
/// The name of the `sessions` gate.
pub const SESSIONS: &str = "sessions";
/// The name of the `transactions` gate.
pub const TRANSACTIONS: &str = "transactions";
/// The name of the `sharded_transactions` gate.
pub const SHARDED_TRANSACTIONS: &str = "sharded_transactions";
/// The name of the `versioned_api` gate.
pub const VERSIONED_API: &str = "versioned_api";
/// The name of the `hint_for_delete_operations` gate.
pub const HINT_FOR_DELETE_OPERATIONS: &str = "hint_for_delete_operations";
/// The name of the `hint_for_find_and_modify` gate.
pub const HINT_FOR_FIND_AND_MODIFY: &str = "hint_for_find_and_modify";
/// The name of the `hint_for_update_and_replace_operations` gate.
pub const HINT_FOR_UPDATE_AND_REPLACE_OPERATIONS: &str = "hint_for_update_and_replace_operations";

/// A named capability and the first server version that supports it.
///
/// Some gates also carry an error threshold. These guard options, such as write hints, that
/// servers in between the two versions silently ignore but older servers reject with a confusing
/// error, so the caller fails early instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Feature {
    name: String,
    first_supported_version: Version,
    error_threshold_version: Option<Version>,
}

/// Whether a caller-supplied hint should be sent to the server, as decided by
/// [`Feature::check_hint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintDisposition {
    /// The server supports the hint.
    Include,

    /// The server would ignore the hint, so it can be left out of the command.
    Omit,
}

impl Feature {
    /// Creates a gate for `name` that is supported from `first_supported_version` on.
    pub fn new(name: impl Into<String>, first_supported_version: Version) -> Self {
        Self {
            name: name.into(),
            first_supported_version,
            error_threshold_version: None,
        }
    }

    /// Makes servers older than `version` reject the gated option outright.
    pub fn with_error_threshold(mut self, version: Version) -> Self {
        self.error_threshold_version = Some(version);
        self
    }

    /// The unique name of this gate.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first server version that supports this feature.
    pub fn first_supported_version(&self) -> &Version {
        &self.first_supported_version
    }

    /// The version below which the gated option must be rejected, if this gate has one.
    pub fn error_threshold_version(&self) -> Option<&Version> {
        self.error_threshold_version.as_ref()
    }

    /// Whether a server running `server_version` supports this feature.
    pub fn is_supported(&self, server_version: &Version) -> bool {
        *server_version >= self.first_supported_version
    }

    /// Returns an [`ErrorKind::IncompatibleServer`] error if a server running `server_version`
    /// does not support this feature.
    pub fn ensure_supported(&self, server_version: &Version) -> Result<()> {
        if self.is_supported(server_version) {
            return Ok(());
        }
        self.emit_rejected(server_version, &self.first_supported_version);
        Err(self.incompatible(server_version, &self.first_supported_version))
    }

    /// Whether a server running `server_version` is old enough that the gated option must be
    /// rejected before contacting it. Always false for gates without an error threshold.
    pub fn must_reject(&self, server_version: &Version) -> bool {
        self.error_threshold_version
            .as_ref()
            .is_some_and(|threshold| server_version < threshold)
    }

    /// Decides what to do with a hint the caller explicitly provided for an operation gated by
    /// this feature.
    pub fn check_hint(&self, server_version: &Version) -> Result<HintDisposition> {
        if self.is_supported(server_version) {
            return Ok(HintDisposition::Include);
        }
        match self.error_threshold_version {
            Some(ref threshold) if server_version < threshold => {
                self.emit_rejected(server_version, threshold);
                Err(self.incompatible(server_version, threshold))
            }
            _ => Ok(HintDisposition::Omit),
        }
    }

    fn incompatible(&self, server_version: &Version, required: &Version) -> Error {
        ErrorKind::IncompatibleServer {
            message: format!(
                "{} requires server version {required} or newer, but the server version is \
                 {server_version}",
                self.name
            ),
        }
        .into()
    }

    #[cfg_attr(not(feature = "tracing-unstable"), allow(unused_variables))]
    fn emit_rejected(&self, server_version: &Version, required: &Version) {
        #[cfg(feature = "tracing-unstable")]
        {
            use crate::trace::{
                trace_or_log_enabled,
                TracingOrLogLevel,
                TracingRepresentation,
                FEATURE_TRACING_EVENT_TARGET,
            };

            if trace_or_log_enabled!(
                target: FEATURE_TRACING_EVENT_TARGET,
                TracingOrLogLevel::Debug
            ) {
                tracing::debug!(
                    target: FEATURE_TRACING_EVENT_TARGET,
                    feature = self.name.as_str(),
                    serverVersion = server_version.tracing_representation(),
                    requiredVersion = required.tracing_representation(),
                    "Feature rejected",
                );
            }
        }
    }
}

/// The gates every server-facing component is expected to know about.
fn well_known_features() -> Vec<Feature> {
    vec![
        Feature::new(AGGREGATE_CURSOR_RESULT, Version::new(2, 6, 0)),
        Feature::new(AGGREGATE_OUT, Version::new(2, 6, 0)),
        Feature::new(ARRAY_FILTERS, Version::new(3, 5, 6)),
        Feature::new(CHANGE_STREAM_STAGE, Version::new(3, 5, 11)),
        Feature::new(COLLATION, Version::new(3, 3, 11)),
        Feature::new(
            COMMANDS_THAT_WRITE_ACCEPT_WRITE_CONCERN,
            Version::new(3, 3, 11),
        ),
        Feature::new(RETRYABLE_WRITES, Version::new(3, 6, 0)),
        Feature::new(SCRAM_SHA_256_AUTHENTICATION, Version::new(4, 0, 0)),
        Feature::new(SESSIONS, Version::new(3, 6, 0)),
        Feature::new(TRANSACTIONS, Version::new(4, 0, 0)),
        Feature::new(SHARDED_TRANSACTIONS, Version::new(4, 2, 0)),
        Feature::new(VERSIONED_API, Version::new(4, 9, 0)),
        Feature::new(HINT_FOR_DELETE_OPERATIONS, Version::new(4, 3, 4))
            .with_error_threshold(Version::new(3, 4, 0)),
        Feature::new(HINT_FOR_FIND_AND_MODIFY, Version::new(4, 3, 4))
            .with_error_threshold(Version::new(4, 2, 0)),
        Feature::new(HINT_FOR_UPDATE_AND_REPLACE_OPERATIONS, Version::new(4, 2, 0))
            .with_error_threshold(Version::new(3, 4, 0)),
    ]
}

/// An immutable table of feature gates keyed by name.
///
/// Cloning a registry is cheap; clones share the same gates.
#[derive(Clone, Debug)]
pub struct FeatureRegistry {
    features: Arc<BTreeMap<String, Feature>>,
}

impl Default for FeatureRegistry {
    /// A registry holding the well-known gates.
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FeatureRegistry {
    /// Starts a registry containing the well-known gates, to which more can be added.
    pub fn builder() -> FeatureRegistryBuilder {
        let features = well_known_features()
            .into_iter()
            .map(|feature| (feature.name.clone(), feature))
            .collect();
        FeatureRegistryBuilder { features }
    }

    /// Starts a registry with no gates.
    pub fn empty_builder() -> FeatureRegistryBuilder {
        FeatureRegistryBuilder {
            features: BTreeMap::new(),
        }
    }

    /// Looks up the gate registered as `name`.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }

    /// Looks up the gate registered as `name`, returning an [`ErrorKind::InvalidArgument`] error
    /// if there is none.
    pub fn require(&self, name: &str) -> Result<&Feature> {
        self.get(name)
            .ok_or_else(|| Error::invalid_argument(format!("unknown feature: {name}")))
    }

    /// Whether the gate registered as `name` is supported by `server_version`.
    pub fn is_supported(&self, name: &str, server_version: &Version) -> Result<bool> {
        Ok(self.require(name)?.is_supported(server_version))
    }

    /// All registered gates, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// The number of registered gates.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no gates are registered.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Collects the gates of a [`FeatureRegistry`]. Gates can only be added, never replaced.
#[derive(Debug)]
pub struct FeatureRegistryBuilder {
    features: BTreeMap<String, Feature>,
}

impl FeatureRegistryBuilder {
    /// Adds `feature`, returning an [`ErrorKind::InvalidArgument`] error if a gate with the same
    /// name is already registered.
    pub fn register(mut self, feature: Feature) -> Result<Self> {
        match self.features.entry(feature.name.clone()) {
            Entry::Occupied(_) => Err(Error::invalid_argument(format!(
                "a feature named {} is already registered",
                feature.name
            ))),
            Entry::Vacant(entry) => {
                entry.insert(feature);
                Ok(self)
            }
        }
    }

    /// Freezes the registered gates.
    pub fn build(self) -> FeatureRegistry {
        FeatureRegistry {
            features: Arc::new(self.features),
        }
    }
}
