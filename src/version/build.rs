use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use typed_builder::TypedBuilder;

use super::{PreRelease, Scanner, Version};
use crate::error::{Error, ErrorKind, Result};

/// The version of a server build, as printed by development and release candidate binaries:
/// `major.minor.patch[-<releaseType><releaseCandidate>][-<commitsAfterRelease>-g<commitHash>]`.
///
/// Build versions order a final release after any release candidate of the same
/// `major.minor.patch`, and a build with commits after the release after one without. A build
/// without a commit hash sorts before one with a hash, and two hashes only break the remaining tie
/// by ordinal comparison.
///
/// The commit suffix is only displayed when both the commit count and the hash are set, since
/// parsing requires the two together. A build with only one of them displays without a suffix.
///
/// ```
/// use mongodb_core::version::BuildVersion;
///
/// let release = BuildVersion::new(4, 0, 0);
/// let dev = BuildVersion::builder()
///     .major(4)
///     .minor(0)
///     .patch(0)
///     .commits_after_release(10)
///     .commit_hash("abcdef")
///     .build();
/// assert!(dev > release);
/// ```
#[derive(Clone, Debug, Default, TypedBuilder)]
#[builder(field_defaults(default))]
pub struct BuildVersion {
    major: u32,
    minor: u32,
    patch: u32,

    #[builder(setter(into, strip_option))]
    release_type: Option<String>,

    #[builder(setter(strip_option))]
    release_candidate: Option<u32>,

    #[builder(setter(strip_option))]
    commits_after_release: Option<u32>,

    #[builder(setter(into, strip_option))]
    commit_hash: Option<String>,
}

impl BuildVersion {
    /// Creates a final release build with no release type or commit information.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            ..Default::default()
        }
    }

    /// Parses a build version string. The patch number defaults to 0 when omitted, in which case
    /// no release type or commit information may follow.
    pub fn parse(text: &str) -> Result<Self> {
        Self::try_parse(text).ok_or_else(|| {
            ErrorKind::InvalidVersion {
                input: text.to_string(),
            }
            .into()
        })
    }

    /// Parses a build version string, returning `None` rather than an error if it is malformed.
    pub fn try_parse(text: &str) -> Option<Self> {
        let mut scanner = Scanner::new(text);
        let major = scanner.number()?;
        if !scanner.eat(".") {
            return None;
        }
        let minor = scanner.number()?;
        let mut version = Self::new(major, minor, 0);
        if scanner.is_empty() {
            return Some(version);
        }
        if !scanner.eat(".") {
            return None;
        }
        version.patch = scanner.number()?;

        // A dash followed by letters starts the release type; a dash followed by digits starts
        // the commit suffix.
        let starts_release_type = scanner
            .rest()
            .strip_prefix('-')
            .is_some_and(|r| r.starts_with(|c: char| c.is_ascii_alphabetic()));
        if starts_release_type {
            scanner.eat("-");
            version.release_type = Some(scanner.take_while(|c| c.is_ascii_alphabetic())?.into());
            if scanner.rest().starts_with(|c: char| c.is_ascii_digit()) {
                version.release_candidate = Some(scanner.number()?);
            }
        }

        if scanner.eat("-") {
            version.commits_after_release = Some(scanner.number()?);
            if !scanner.eat("-g") {
                return None;
            }
            let hash = scanner.take_while(is_hex_digit)?;
            if !is_commit_hash(hash) {
                return None;
            }
            version.commit_hash = Some(hash.into());
        }

        scanner.is_empty().then_some(version)
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

    /// The release type, e.g. `rc`.
    pub fn release_type(&self) -> Option<&str> {
        self.release_type.as_deref()
    }

    /// The release candidate number that follows the release type.
    pub fn release_candidate(&self) -> Option<u32> {
        self.release_candidate
    }

    /// The number of commits made after the last release.
    pub fn commits_after_release(&self) -> Option<u32> {
        self.commits_after_release
    }

    /// The abbreviated commit hash, without its `g` prefix.
    pub fn commit_hash(&self) -> Option<&str> {
        self.commit_hash.as_deref()
    }

    fn cmp_release(&self, other: &Self) -> Ordering {
        match (&self.release_type, &other.release_type) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a
                .cmp(b)
                .then_with(|| self.release_candidate.cmp(&other.release_candidate)),
        }
    }
}

impl Ord for BuildVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| self.cmp_release(other))
            // `None` sorts before `Some`: extra commits make a build newer.
            .then_with(|| self.commits_after_release.cmp(&other.commits_after_release))
            .then_with(|| self.commit_hash.cmp(&other.commit_hash))
    }
}

impl PartialOrd for BuildVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BuildVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BuildVersion {}

impl Hash for BuildVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
        self.release_type.hash(state);
        if self.release_type.is_some() {
            self.release_candidate.hash(state);
        }
        self.commits_after_release.hash(state);
        self.commit_hash.hash(state);
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref release_type) = self.release_type {
            write!(f, "-{release_type}")?;
            if let Some(rc) = self.release_candidate {
                write!(f, "{rc}")?;
            }
        }
        if let (Some(commits), Some(hash)) = (self.commits_after_release, &self.commit_hash) {
            write!(f, "-{commits}-g{hash}")?;
        }
        Ok(())
    }
}

impl FromStr for BuildVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Recovers the build fields carried by a version's pre-release tag. Opaque tags carry none, so a
/// version such as `4.2.0-beta` converts to the final release build `4.2.0`.
impl From<&Version> for BuildVersion {
    fn from(version: &Version) -> Self {
        let mut build = Self::new(version.major(), version.minor(), version.patch());
        if let Some(PreRelease::Build(tag)) = version.pre_release() {
            if let Some(rc) = tag.release_candidate() {
                build.release_type = Some("rc".to_string());
                build.release_candidate = Some(rc);
            }
            build.commits_after_release = tag.commits_after_release();
            build.commit_hash = tag.commit_hash().map(str::to_owned);
        }
        build
    }
}

/// The textual parts of a pre-release tag that matched the build tag grammar.
#[derive(Debug, Default)]
pub(super) struct BuildTagParts<'a> {
    pub(super) release_candidate: Option<&'a str>,
    pub(super) commits_after_release: Option<&'a str>,
    pub(super) commit_hash: Option<&'a str>,
}

/// Matches all of `text` against `(rc<digits>)?-?(<digits>-g<hash>)?`.
///
/// Alternatives are tried in the order a backtracking matcher would: the longest release
/// candidate first, then with the separator consumed, then with the commit suffix present. The
/// first complete match decides which parts were captured. `None` means the tag does not match
/// at all; a match with no parts (an empty tag or a lone `-`) is reported as such and left to the
/// caller to reject.
pub(super) fn scan_build_tag(text: &str) -> Option<BuildTagParts<'_>> {
    for (release_candidate, rest) in release_candidate_splits(text) {
        let candidates = rest.strip_prefix('-').into_iter().chain([rest]);
        for rest in candidates {
            if let Some((commits, hash)) = commit_suffix(rest) {
                return Some(BuildTagParts {
                    release_candidate,
                    commits_after_release: Some(commits),
                    commit_hash: Some(hash),
                });
            }
            if rest.is_empty() {
                return Some(BuildTagParts {
                    release_candidate,
                    ..Default::default()
                });
            }
        }
    }
    None
}

fn release_candidate_splits(text: &str) -> Vec<(Option<&str>, &str)> {
    let mut splits = Vec::new();
    if let Some(after) = text.strip_prefix("rc") {
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        for len in (1..=digits).rev() {
            let (rc, rest) = after.split_at(len);
            splits.push((Some(rc), rest));
        }
    }
    splits.push((None, text));
    splits
}

/// Matches all of `text` against `<digits>-g<hash>`.
fn commit_suffix(text: &str) -> Option<(&str, &str)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let (commits, rest) = text.split_at(digits);
    let hash = rest.strip_prefix("-g")?;
    is_commit_hash(hash).then_some((commits, hash))
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_digit() || ('a'..='f').contains(&c)
}

fn is_commit_hash(hash: &str) -> bool {
    (4..=40).contains(&hash.len()) && hash.chars().all(is_hex_digit)
}
