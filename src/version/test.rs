use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use pretty_assertions::assert_eq;

use crate::{
    bson::{from_bson, to_bson, Bson},
    error::ErrorKind,
    version::{BuildVersion, PreRelease, Version},
};

fn version(text: &str) -> Version {
    Version::parse(text).unwrap()
}

fn build(text: &str) -> BuildVersion {
    BuildVersion::parse(text).unwrap()
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn parse() {
    let v = version("4.2.1");
    assert_eq!((v.major(), v.minor(), v.patch()), (4, 2, 1));
    assert!(v.pre_release().is_none());

    let v = version("4.2");
    assert_eq!((v.major(), v.minor(), v.patch()), (4, 2, 0));
    assert_eq!(v.to_string(), "4.2.0");

    let v = version("4.2.0-alpha-2");
    assert_eq!(v.pre_release().map(PreRelease::as_str), Some("alpha-2"));
    assert_eq!(v.to_string(), "4.2.0-alpha-2");

    assert_eq!("3.6.8".parse::<Version>().unwrap(), Version::new(3, 6, 8));
}

#[test]
fn parse_finds_embedded_version() {
    for (text, expected) in [
        ("v4.2.0", "4.2.0"),
        ("4.2.0 ", "4.2.0"),
        (" 4.2.0", "4.2.0"),
        ("4.2.0beta", "4.2.0"),
        ("4.2-rc1", "4.2.0"),
        ("4.2.", "4.2.0"),
        ("-1.0.0", "1.0.0"),
        ("4.-2.0", "2.0.0"),
        ("db version v4.4.1-rc0", "4.4.1-rc0"),
        ("4.2.0-beta\nmore", "4.2.0-beta"),
    ] {
        assert_eq!(version(text).to_string(), expected, "{text:?}");
    }

    assert_eq!(version("4.2.0beta"), Version::new(4, 2, 0));
    assert!(version("4.2.0-rc1 ").pre_release().is_some_and(|tag| !tag.is_build()));
}

#[test]
fn parse_failures() {
    for text in [
        "",
        "4",
        "4.",
        "a.b",
        "v4",
        "4.x",
        ". 4",
        "99999999999.0.0",
        "4.99999999999",
        "4.2.99999999999",
    ] {
        let err = Version::parse(text).unwrap_err();
        match err.kind.as_ref() {
            ErrorKind::InvalidVersion { input } => assert_eq!(input, text),
            other => panic!("expected an invalid version error for {text:?}, got {other:?}"),
        }
        assert!(Version::try_parse(text).is_none(), "{text:?}");
    }
}

#[test]
fn round_trip() {
    for major in [0, 1, 4, 10, u32::MAX] {
        for minor in [0, 2, 99] {
            for patch in [0, 7, 1000] {
                let v = Version::new(major, minor, patch);
                assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
            }
        }
    }

    for text in ["4.2.0-rc1", "4.2.0-beta", "4.0.0-10-gabcdef1234", "4.2.0-"] {
        assert_eq!(version(text).to_string(), text);
    }
}

#[test]
fn construction_rejects_negative_components() {
    for (components, name) in [
        ((-1, 0, 0), "major"),
        ((0, -1, 0), "minor"),
        ((0, 0, -1), "patch"),
    ] {
        let (major, minor, patch) = components;
        let err = Version::from_components(major, minor, patch).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains(name));
    }

    assert!(Version::from_components(0, 0, i64::from(u32::MAX) + 1).is_err());
    assert_eq!(
        Version::from_components(4, 2, 1).unwrap(),
        Version::new(4, 2, 1)
    );
}

#[test]
fn version_array() {
    assert_eq!(
        Version::from_version_array(&[4, 4, 1, 0]).unwrap(),
        Version::new(4, 4, 1)
    );
    assert_eq!(
        Version::from_version_array(&[3, 6]).unwrap(),
        Version::new(3, 6, 0)
    );
    assert!(Version::from_version_array(&[4]).unwrap_err().is_invalid_argument());
    assert!(Version::from_version_array(&[4, -1, 0])
        .unwrap_err()
        .is_invalid_argument());
}

#[test]
fn pre_release_classification() {
    let classify = |tag: &str| Version::with_pre_release(4, 2, 0, tag).pre_release().cloned();

    for opaque in [
        "",
        "-",
        "beta",
        "rc",
        "rcx",
        "10-gabc",
        "10-gABCD",
        "10-g0123456789012345678901234567890123456789a",
        "rc99999999999",
    ] {
        let pre_release = classify(opaque).unwrap();
        assert!(!pre_release.is_build(), "{opaque:?} should be opaque");
        assert_eq!(pre_release.as_str(), opaque);
    }

    // An overflowing count leaves the tag opaque, so it orders like any other opaque tag.
    assert!(version("4.2.0-rc99999999999") < version("4.2.0"));
    assert!(version("4.2.0-rc99999999999") > version("4.2.0-rc1"));
    assert!(version("4.2.0-rc99999999999") > version("4.2.0-beta"));

    let tag = |text: &str| match classify(text) {
        Some(PreRelease::Build(tag)) => (
            tag.release_candidate(),
            tag.commits_after_release(),
            tag.commit_hash().map(str::to_owned),
        ),
        other => panic!("{text:?} should be a build tag, got {other:?}"),
    };

    assert_eq!(tag("rc1"), (Some(1), None, None));
    assert_eq!(tag("rc1-"), (Some(1), None, None));
    assert_eq!(tag("10-gabcd"), (None, Some(10), Some("abcd".to_string())));
    assert_eq!(
        tag("rc0-3-g1234abcd"),
        (Some(0), Some(3), Some("1234abcd".to_string()))
    );
    assert_eq!(
        tag("-10-gabcd"),
        (None, Some(10), Some("abcd".to_string()))
    );
    // Without a separator the longest release candidate that still leaves a commit count wins.
    assert_eq!(
        tag("rc110-gabcd"),
        (Some(11), Some(0), Some("abcd".to_string()))
    );
}

#[test]
fn release_candidate_sorts_before_release() {
    assert!(version("4.2.0-rc1") < version("4.2.0"));
    assert!(version("4.2.0-rc1") < version("4.2.0-rc2"));
    assert!(version("4.2.0-rc9") < version("4.2.0-rc10"));
    assert!(version("4.2.0-rc0-3-gabcd") > version("4.2.0-rc0"));
    assert!(version("4.2.0-rc0-3-gabcd") < version("4.2.0-rc1"));
    assert!(version("4.2.1-rc0") > version("4.2.0"));
}

#[test]
fn commits_after_release_sort_after_release() {
    assert!(version("4.0.0") < version("4.0.0-10-gabcdef1234"));
    assert!(version("4.0.0-10-gabcd") < version("4.0.0-11-gabcd"));
    assert!(version("4.0.0-10-gabcd") < version("4.0.1"));

    // Hash content only breaks the remaining tie.
    assert!(version("4.0.0-10-g1234") < version("4.0.0-10-gabcd"));
    assert_ne!(version("4.0.0-10-gabcd"), version("4.0.0-10-g1234"));
    assert!(version("4.0.0-10-gffff") < version("4.0.0-11-g0000"));
    assert_eq!(
        hash_of(&version("4.0.0-10-gabcd")),
        hash_of(&version("4.0.0-10-gabcd"))
    );
}

#[test]
fn opaque_pre_releases() {
    assert!(version("4.2.0-alpha") < version("4.2.0-beta"));
    assert!(version("4.2.0-beta") < version("4.2.0"));
    assert!(version("4.2.0-beta") < version("4.2.1-alpha"));
    assert_ne!(version("4.2.0-beta"), version("4.2.0"));

    // Against a build tag an opaque tag counts as the final release.
    assert!(version("4.2.0-beta") > version("4.2.0-rc1"));
    assert!(version("4.2.0-beta") < version("4.2.0-1-gabcd"));
}

#[test]
fn total_order_laws() {
    let corpus: Vec<Version> = [
        "3.6.0",
        "3.5.9",
        "4.0.0",
        "4.0.0-",
        "4.0.0-beta",
        "4.0.0-alpha",
        "4.0.0-rc0",
        "4.0.0-rc1",
        "4.0.0-rc1-2-gabcd",
        "4.0.0-rc10",
        "4.0.0-1-gabcd",
        "4.0.0-10-gabcdef1234",
        "4.0.0-10-g1234",
        "4.0.0-2-gffff",
        "4.0.1",
        "4.0.1-rc0",
        "4.2",
    ]
    .into_iter()
    .map(version)
    .collect();

    for a in &corpus {
        assert_eq!(a.cmp(a), Ordering::Equal);
        for b in &corpus {
            assert_eq!(a.cmp(b), b.cmp(a).reverse(), "{a} vs {b}");
            if a == b {
                assert_eq!(hash_of(a), hash_of(b), "{a} == {b}");
            }
            for c in &corpus {
                if a <= b && b <= c {
                    assert!(a <= c, "{a} <= {b} <= {c}");
                }
            }
        }
    }
}

#[test]
fn serde() {
    let v = version("4.2.0-rc1");
    assert_eq!(to_bson(&v).unwrap(), Bson::String("4.2.0-rc1".to_string()));
    assert_eq!(
        from_bson::<Version>(Bson::String("4.4.1".to_string())).unwrap(),
        Version::new(4, 4, 1)
    );
    assert!(from_bson::<Version>(Bson::String("four".to_string())).is_err());
}

#[test]
fn build_version_parse() {
    let b = build("4.2.0-rc1-10-gabcdef");
    assert_eq!((b.major(), b.minor(), b.patch()), (4, 2, 0));
    assert_eq!(b.release_type(), Some("rc"));
    assert_eq!(b.release_candidate(), Some(1));
    assert_eq!(b.commits_after_release(), Some(10));
    assert_eq!(b.commit_hash(), Some("abcdef"));
    assert_eq!(b.to_string(), "4.2.0-rc1-10-gabcdef");

    let b = build("4.2.0-beta");
    assert_eq!(b.release_type(), Some("beta"));
    assert_eq!(b.release_candidate(), None);

    let b = build("4.2.0-10-gabcd");
    assert_eq!(b.release_type(), None);
    assert_eq!(b.commits_after_release(), Some(10));

    assert_eq!(build("4.2"), BuildVersion::new(4, 2, 0));
    assert_eq!(build("4.2").to_string(), "4.2.0");
}

#[test]
fn build_version_parse_failures() {
    for text in [
        "",
        "4",
        "4.2-rc1",
        "4.2.0-",
        "4.2.0-rc1-10",
        "4.2.0-10-gABCD",
        "4.2.0-10-gabc",
        "4.2.0-rc1-",
        "4.2.0-rc1-10-gabcd-extra",
    ] {
        assert!(BuildVersion::try_parse(text).is_none(), "{text:?}");
        assert!(BuildVersion::parse(text).is_err(), "{text:?}");
    }
}

#[test]
fn build_version_ordering() {
    let release = BuildVersion::new(4, 0, 0);
    let with_commits = BuildVersion::builder()
        .major(4)
        .minor(0)
        .patch(0)
        .commits_after_release(10)
        .commit_hash("gabcdef")
        .build();
    assert!(with_commits > release);

    assert!(build("4.2.0-rc1") < build("4.2.0"));
    assert!(build("4.2.0-alpha1") < build("4.2.0-beta1"));
    assert!(build("4.2.0-rc1") < build("4.2.0-rc2"));

    let without_hash = BuildVersion::builder()
        .major(4)
        .commits_after_release(10)
        .build();
    let with_hash = BuildVersion::builder()
        .major(4)
        .commits_after_release(10)
        .commit_hash("abcd")
        .build();
    assert!(without_hash < with_hash);
    assert!(build("4.0.0-10-g1234") < build("4.0.0-10-gabcd"));
    assert_ne!(build("4.0.0-10-gabcd"), build("4.0.0-10-g1234"));
    assert_ne!(
        hash_of(&build("4.0.0-10-gabcd")),
        hash_of(&build("4.0.0-10-g1234"))
    );
}

#[test]
fn build_version_display_always_parses() {
    let hash_only = BuildVersion::builder()
        .major(4)
        .commit_hash("abcd")
        .build();
    let commits_only = BuildVersion::builder()
        .major(4)
        .commits_after_release(10)
        .build();
    let complete = BuildVersion::builder()
        .major(4)
        .release_type("rc")
        .release_candidate(2)
        .commits_after_release(10)
        .commit_hash("abcd")
        .build();

    assert_eq!(hash_only.to_string(), "4.0.0");
    assert_eq!(commits_only.to_string(), "4.0.0");
    assert_eq!(complete.to_string(), "4.0.0-rc2-10-gabcd");
    for b in [&hash_only, &commits_only, &complete] {
        assert!(BuildVersion::try_parse(&b.to_string()).is_some(), "{b}");
    }
    assert_eq!(build(&complete.to_string()), complete);
}

#[test]
fn build_version_from_version() {
    assert_eq!(
        BuildVersion::from(&version("4.2.0-rc1-10-gabcd")),
        build("4.2.0-rc1-10-gabcd")
    );
    assert_eq!(
        BuildVersion::from(&version("4.2.0-beta")),
        BuildVersion::new(4, 2, 0)
    );
    assert_eq!(BuildVersion::from(&version("4.2.1")), build("4.2.1"));
}
