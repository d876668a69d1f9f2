use pretty_assertions::assert_eq;

use crate::{
    feature::{
        Feature,
        FeatureRegistry,
        HintDisposition,
        HINT_FOR_DELETE_OPERATIONS,
        HINT_FOR_FIND_AND_MODIFY,
        HINT_FOR_UPDATE_AND_REPLACE_OPERATIONS,
        RETRYABLE_WRITES,
        SESSIONS,
        VERSIONED_API,
    },
    version::Version,
};

fn version(text: &str) -> Version {
    Version::parse(text).unwrap()
}

#[test]
fn supported_from_first_version() {
    let feature = Feature::new("x", Version::new(3, 6, 0));
    assert!(feature.is_supported(&Version::new(3, 6, 0)));
    assert!(feature.is_supported(&Version::new(4, 0, 0)));
    assert!(!feature.is_supported(&Version::new(3, 5, 9)));
}

#[test]
fn release_candidates_are_not_supported() {
    let feature = Feature::new("x", Version::new(4, 2, 0));
    assert!(!feature.is_supported(&version("4.2.0-rc1")));
    assert!(feature.is_supported(&version("4.2.0-10-gabcdef1234")));
}

#[test]
fn ensure_supported() {
    let feature = Feature::new("x", Version::new(3, 6, 0));
    feature.ensure_supported(&Version::new(3, 6, 0)).unwrap();

    let err = feature
        .ensure_supported(&Version::new(3, 4, 0))
        .unwrap_err();
    assert!(err.is_incompatible_server());
    assert!(err.to_string().contains("3.6.0"));
    assert!(err.to_string().contains("3.4.0"));
}

#[test]
fn must_reject_needs_a_threshold() {
    let plain = Feature::new("x", Version::new(4, 2, 0));
    assert!(!plain.must_reject(&Version::new(2, 0, 0)));

    let gated = plain.with_error_threshold(Version::new(3, 4, 0));
    assert!(gated.must_reject(&Version::new(3, 2, 0)));
    assert!(!gated.must_reject(&Version::new(3, 4, 0)));
    assert!(!gated.must_reject(&Version::new(4, 2, 0)));
}

#[test]
fn hint_for_find_and_modify() {
    let registry = FeatureRegistry::default();
    let feature = registry.require(HINT_FOR_FIND_AND_MODIFY).unwrap();

    assert_eq!(
        feature.check_hint(&Version::new(4, 4, 0)).unwrap(),
        HintDisposition::Include
    );
    assert_eq!(
        feature.check_hint(&Version::new(4, 3, 4)).unwrap(),
        HintDisposition::Include
    );
    assert_eq!(
        feature.check_hint(&Version::new(4, 2, 0)).unwrap(),
        HintDisposition::Omit
    );
    assert!(feature
        .check_hint(&Version::new(4, 0, 0))
        .unwrap_err()
        .is_incompatible_server());
}

#[test]
fn hint_for_write_operations_thresholds() {
    let registry = FeatureRegistry::default();

    let delete = registry.require(HINT_FOR_DELETE_OPERATIONS).unwrap();
    assert_eq!(delete.first_supported_version(), &Version::new(4, 3, 4));
    assert_eq!(
        delete.error_threshold_version(),
        Some(&Version::new(3, 4, 0))
    );
    assert_eq!(
        delete.check_hint(&Version::new(3, 6, 0)).unwrap(),
        HintDisposition::Omit
    );

    let update = registry
        .require(HINT_FOR_UPDATE_AND_REPLACE_OPERATIONS)
        .unwrap();
    assert_eq!(
        update.check_hint(&Version::new(4, 2, 0)).unwrap(),
        HintDisposition::Include
    );
    assert!(update.check_hint(&Version::new(3, 2, 0)).is_err());
}

#[test]
fn default_registry() {
    let registry = FeatureRegistry::default();
    assert_eq!(registry.len(), 15);
    assert_eq!(
        registry.get(SESSIONS).map(Feature::first_supported_version),
        Some(&Version::new(3, 6, 0))
    );
    assert_eq!(
        registry.get(VERSIONED_API).map(Feature::first_supported_version),
        Some(&Version::new(4, 9, 0))
    );
    assert!(registry.is_supported(RETRYABLE_WRITES, &Version::new(3, 6, 0)).unwrap());
    assert!(registry.get("no_such_feature").is_none());
    assert!(registry
        .require("no_such_feature")
        .unwrap_err()
        .is_invalid_argument());

    let names: Vec<_> = registry.iter().map(Feature::name).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn registry_is_append_only() {
    let registry = FeatureRegistry::builder()
        .register(Feature::new("custom", Version::new(5, 0, 0)))
        .unwrap()
        .build();
    assert_eq!(registry.len(), 16);
    assert!(registry.get("custom").is_some());

    let err = FeatureRegistry::builder()
        .register(Feature::new(SESSIONS, Version::new(1, 0, 0)))
        .unwrap_err();
    assert!(err.is_invalid_argument());

    let empty = FeatureRegistry::empty_builder().build();
    assert!(empty.is_empty());
}

#[test]
fn clones_share_gates() {
    let registry = FeatureRegistry::default();
    let clone = registry.clone();
    let a = registry.get(SESSIONS).unwrap() as *const Feature;
    let b = clone.get(SESSIONS).unwrap() as *const Feature;
    assert_eq!(a, b);
}
