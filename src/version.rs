//! Contains the version number types used to decide which features a server supports.
//!
//! Servers report their version as a dotted string such as `"4.4.1"`, `"4.2.0-rc1"` or, for
//! development builds, `"4.3.4-10-gabcdef0"`. A [`Version`] parses all of these. Its pre-release
//! tag is classified once at construction time: tags that look like they were produced by a server
//! build are ordered using the richer [`BuildVersion`] rules, while any other tag is compared as an
//! ordinary string.

mod build;
#[cfg(test)]
mod test;

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{de::Unexpected, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, ErrorKind, Result};

pub use self::build::BuildVersion;

/// A `major.minor.patch[-preRelease]` version number.
///
/// Versions are totally ordered. The numeric components are compared first. When they are equal,
/// a version without a pre-release tag sorts after one with an opaque tag (`4.2.0-beta < 4.2.0`)
/// and two opaque tags are compared ordinally. If either side carries a server build tag (see
/// [`PreRelease::Build`]), both sides are compared as [`BuildVersion`]s instead.
#[derive(Clone, Debug)]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
    pre_release: Option<PreRelease>,
}

/// The pre-release portion of a [`Version`], i.e. everything after the first `-` that follows the
/// patch number.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreRelease {
    /// A tag with no further structure, such as `beta` or `alpha-2`.
    Opaque(String),

    /// A tag produced by a server build: a release candidate marker, a number of commits after
    /// the last release plus the commit hash, or both (e.g. `rc1`, `10-gabcdef0`,
    /// `rc0-3-g1234abcd`).
    Build(BuildTag),
}

/// The structured contents of a server build pre-release tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTag {
    text: String,
    release_candidate: Option<u32>,
    commits_after_release: Option<u32>,
    commit_hash: Option<String>,
}

impl BuildTag {
    /// The release candidate number, if the tag starts with an `rc<N>` marker.
    pub fn release_candidate(&self) -> Option<u32> {
        self.release_candidate
    }

    /// The number of commits made after the last release, if present.
    pub fn commits_after_release(&self) -> Option<u32> {
        self.commits_after_release
    }

    /// The abbreviated commit hash, without its `g` prefix.
    pub fn commit_hash(&self) -> Option<&str> {
        self.commit_hash.as_deref()
    }
}

impl PreRelease {
    /// Classifies a pre-release tag. The tag is a build tag only if it matches the server build
    /// grammar and at least one of the release candidate or commit parts is present; an empty tag
    /// or a lone `-` is opaque.
    ///
    /// A tag whose release candidate or commit count does not fit in a `u32`, such as
    /// `rc99999999999`, is also opaque. Treating it as a build tag with the count dropped would
    /// make it equal to the final release while an opaque tag sorts below it, and equality would
    /// no longer be transitive. As an opaque tag it sorts below the final release and compares
    /// ordinally with other opaque tags.
    fn classify(text: String) -> Self {
        let Some(parts) = build::scan_build_tag(&text) else {
            return PreRelease::Opaque(text);
        };
        if parts.release_candidate.is_none() && parts.commits_after_release.is_none() {
            return PreRelease::Opaque(text);
        }

        let parsed = (
            parts.release_candidate.map(str::parse::<u32>).transpose(),
            parts.commits_after_release.map(str::parse::<u32>).transpose(),
        );
        let (Ok(release_candidate), Ok(commits_after_release)) = parsed else {
            return PreRelease::Opaque(text);
        };
        let commit_hash = parts.commit_hash.map(str::to_owned);

        PreRelease::Build(BuildTag {
            text,
            release_candidate,
            commits_after_release,
            commit_hash,
        })
    }

    /// The tag exactly as it appeared in the version string.
    pub fn as_str(&self) -> &str {
        match self {
            PreRelease::Opaque(text) => text,
            PreRelease::Build(tag) => &tag.text,
        }
    }

    /// Whether this tag was produced by a server build.
    pub fn is_build(&self) -> bool {
        matches!(self, PreRelease::Build(_))
    }
}

impl Version {
    /// Creates a release version with no pre-release tag.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    /// Creates a version with the given pre-release tag.
    pub fn with_pre_release(
        major: u32,
        minor: u32,
        patch: u32,
        pre_release: impl Into<String>,
    ) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: Some(PreRelease::classify(pre_release.into())),
        }
    }

    /// Creates a version from untrusted integer components, returning an
    /// [`ErrorKind::InvalidArgument`] error if any of them is negative or out of range.
    pub fn from_components(major: i64, minor: i64, patch: i64) -> Result<Self> {
        Ok(Self::new(
            component("major", major)?,
            component("minor", minor)?,
            component("patch", patch)?,
        ))
    }

    /// Creates a version from the `versionArray` field of a `buildInfo` reply, e.g.
    /// `[4, 4, 1, 0]`. Elements after the patch number describe the build and are ignored.
    pub fn from_version_array(components: &[i32]) -> Result<Self> {
        match components {
            [major, minor] => Self::from_components((*major).into(), (*minor).into(), 0),
            [major, minor, patch, ..] => {
                Self::from_components((*major).into(), (*minor).into(), (*patch).into())
            }
            _ => Err(Error::invalid_argument(format!(
                "versionArray must contain at least a major and minor version, got {components:?}"
            ))),
        }
    }

    /// Parses a `major.minor[.patch[-preRelease]]` string. The patch number defaults to 0 and the
    /// pre-release tag is everything after the first `-` following the patch number, up to the end
    /// of the line.
    ///
    /// The version may be embedded in other text: the first `major.minor` found is used and
    /// anything around it is ignored, so `"v4.2.0"`, `"4.2.0 "` and `"4.2.0beta"` all parse as
    /// `4.2.0`. A component that does not fit in a `u32` is an error.
    pub fn parse(text: &str) -> Result<Self> {
        Self::try_parse(text).ok_or_else(|| {
            ErrorKind::InvalidVersion {
                input: text.to_string(),
            }
            .into()
        })
    }

    /// Parses a version string, returning `None` rather than an error if it is malformed.
    pub fn try_parse(text: &str) -> Option<Self> {
        let start = text
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| starts_with_major_minor(&text[i..]))?;

        let mut scanner = Scanner::new(&text[start..]);
        let major = scanner.number()?;
        scanner.eat(".");
        let minor = scanner.number()?;

        let has_patch = scanner
            .rest()
            .strip_prefix('.')
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
        if !has_patch {
            return Some(Self::new(major, minor, 0));
        }
        scanner.eat(".");
        let patch = scanner.number()?;
        if !scanner.eat("-") {
            return Some(Self::new(major, minor, patch));
        }

        let rest = scanner.rest();
        let pre_release = rest.split_once('\n').map_or(rest, |(line, _)| line);
        Some(Self::with_pre_release(major, minor, patch, pre_release))
    }

    /// The major version.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The minor version.
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// The patch version.
    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// The pre-release tag, if any.
    pub fn pre_release(&self) -> Option<&PreRelease> {
        self.pre_release.as_ref()
    }

    fn cmp_pre_release(&self, other: &Self) -> Ordering {
        match (&self.pre_release, &other.pre_release) {
            (Some(PreRelease::Build(_)), _) | (_, Some(PreRelease::Build(_))) => {
                BuildVersion::from(self).cmp(&BuildVersion::from(other))
            }
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.as_str().cmp(b.as_str()),
        }
    }
}

/// Whether `text` starts with `<digits>.<digits>`.
fn starts_with_major_minor(text: &str) -> bool {
    let digits = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();
    let major = digits(text);
    major > 0
        && text[major..]
            .strip_prefix('.')
            .is_some_and(|rest| digits(rest) > 0)
}

fn component(name: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::invalid_argument(format!(
            "the {name} version must be between 0 and {}, but was {value}",
            u32::MAX
        ))
    })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| self.cmp_pre_release(other))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    // Must agree with `Ord`: build tags hash the fields their ordering reads.
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
        match &self.pre_release {
            None => 0u8.hash(state),
            Some(PreRelease::Opaque(text)) => {
                1u8.hash(state);
                text.hash(state);
            }
            Some(PreRelease::Build(tag)) => {
                2u8.hash(state);
                tag.release_candidate.hash(state);
                tag.commits_after_release.hash(state);
                tag.commit_hash.hash(state);
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre_release) = self.pre_release {
            write!(f, "-{}", pre_release.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Version::try_parse(&s).ok_or_else(|| {
            serde::de::Error::invalid_value(Unexpected::Str(&s), &"a version string")
        })
    }
}

/// A cursor over a version string, used by the hand-written version grammars.
pub(crate) struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Consumes the longest non-empty prefix whose characters all satisfy `pred`.
    pub(crate) fn take_while(&mut self, pred: impl Fn(char) -> bool) -> Option<&'a str> {
        let end = self
            .rest
            .find(|c: char| !pred(c))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(taken)
    }

    /// Consumes a run of ASCII digits that fits in a `u32`.
    pub(crate) fn number(&mut self) -> Option<u32> {
        self.take_while(|c| c.is_ascii_digit())?.parse().ok()
    }

    /// Consumes `prefix` if the remaining input starts with it.
    pub(crate) fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    pub(crate) fn rest(&self) -> &'a str {
        self.rest
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}
