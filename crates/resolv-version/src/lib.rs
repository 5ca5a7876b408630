//! The "legacy" version scheme used throughout this workspace.
//!
//! This is deliberately simpler than the strict PEP 440-style scheme some
//! package ecosystems use: a numeric release compared component-wise, plus
//! an optional suffix compared as plain text. See [`Version::cmp`] for the
//! exact rules, including the documented quirk around pre-release/dev
//! suffix ordering.

mod specifier;

pub use specifier::{Matcher, Operator, VersionSpecifier, VersionSpecifierParseError};

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A parsed legacy-scheme version, e.g. `1.2.3`, `1.0a1`, `2.0.dev3`.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    /// Numeric release components with trailing zeros trimmed, e.g. `1.0.0` -> `[1]`.
    release: Vec<u64>,
    /// Everything after the numeric release, compared as plain text.
    suffix: Option<String>,
    raw: String,
}

impl Version {
    /// Construct a version directly from release components, with no suffix.
    pub fn from_release(release: impl Into<Vec<u64>>) -> Self {
        let release = trim_trailing_zeros(release.into());
        let raw = release
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            release,
            suffix: None,
            raw: if raw.is_empty() { "0".to_string() } else { raw },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Does this version carry a suffix (e.g. `a1`, `.dev3`)? Used by
    /// locators to filter pre-releases out of a catalog when the caller has
    /// asked for stable versions only.
    pub fn is_prerelease(&self) -> bool {
        self.suffix.is_some()
    }
}

fn trim_trailing_zeros(mut release: Vec<u64>) -> Vec<u64> {
    while release.last() == Some(&0) {
        release.pop();
    }
    release
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError(s.to_string()));
        }

        // The release is the longest prefix made of digits and separators
        // (`.`, `-`); the first alphabetic byte starts the suffix.
        let split_at = trimmed
            .char_indices()
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map(|(idx, _)| idx);

        let (release_part, suffix_part) = match split_at {
            Some(idx) => (&trimmed[..idx], Some(&trimmed[idx..])),
            None => (trimmed, None),
        };

        let release_part = release_part.trim_end_matches(['.', '-']);
        if release_part.is_empty() {
            return Err(VersionParseError(s.to_string()));
        }

        let mut release = Vec::new();
        for component in release_part.split(['.', '-']) {
            if component.is_empty() {
                continue;
            }
            let n: u64 = component
                .parse()
                .map_err(|_| VersionParseError(s.to_string()))?;
            release.push(n);
        }
        if release.is_empty() {
            return Err(VersionParseError(s.to_string()));
        }
        let release = trim_trailing_zeros(release);

        let suffix = suffix_part
            .map(|suffix| suffix.trim_start_matches(['.', '-']).to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            release,
            suffix,
            raw: s.to_string(),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    /// Numeric release compared component-wise (missing trailing components
    /// treated as zero), then: no suffix ranks above any suffix, and two
    /// suffixed versions are ordered by plain text comparison of the suffix.
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        match (&self.suffix, &other.suffix) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.release.hash(state);
        self.suffix.hash(state);
    }
}

#[derive(Debug, Error)]
#[error("invalid version: `{0}`")]
pub struct VersionParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("2"), v("2.0.0"));
    }

    #[test]
    fn release_compares_numerically_not_lexically() {
        assert!(v("1.9") < v("1.10"));
    }

    #[test]
    fn unsuffixed_outranks_suffixed() {
        assert!(v("1.0") > v("1.0a1"));
        assert!(v("1.0") > v("1.0.dev1"));
    }

    #[test]
    fn suffix_ordering_is_plain_lexicographic_by_design() {
        // documented quirk: "dev1" > "a1" byte-wise, so 1.0.dev1 outranks 1.0a1
        // even though a stricter scheme would rank dev releases lowest.
        assert!(v("1.0.dev1") > v("1.0a1"));
    }

    #[test]
    fn newest_of_a_list() {
        let mut versions = vec![v("0.9"), v("2.1"), v("1.0"), v("2.0"), v("1.5")];
        versions.sort();
        assert_eq!(versions.last().unwrap().as_str(), "2.1");
    }

    #[test]
    fn prerelease_is_detected_by_suffix_presence() {
        assert!(!v("1.0").is_prerelease());
        assert!(v("1.0a1").is_prerelease());
    }

    #[test]
    fn rejects_empty_and_non_numeric_release() {
        assert!("".parse::<Version>().is_err());
        assert!("abc".parse::<Version>().is_err());
    }
}
