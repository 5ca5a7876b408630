//! Normalization rules for package names, shared by the requirement parser,
//! the maestro's by-name lookups, and the finder's hyphen/underscore retry.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A normalized package name.
///
/// Two names normalize equal iff they differ only in case or in runs of
/// `-`, `_`, and `.` (each run folds to a single `-`). The canonical form
/// (what [`PackageName::as_str`] returns) prefers hyphens, matching the
/// requirement parser's canonicalization rule.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackageName(String);

impl PackageName {
    /// Normalize `name` into a [`PackageName`].
    ///
    /// Fails only if `name` contains no name characters at all.
    pub fn new(name: impl AsRef<str>) -> Result<Self, InvalidNameError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(InvalidNameError(name.to_string()));
        }
        let normalized = normalize(name);
        if normalized.is_empty() {
            return Err(InvalidNameError(name.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fold runs of `-`, `_`, `.` to a single `-` and lowercase the rest.
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if ch == '-' || ch == '_' || ch == '.' {
            if !in_run && !out.is_empty() {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(ch.to_ascii_lowercase());
            in_run = false;
        }
    }
    out.trim_end_matches('-').to_string()
}

impl FromStr for PackageName {
    type Err = InvalidNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
#[error("not a valid package name: `{0}`")]
pub struct InvalidNameError(String);

/// Swap every `_` in `name` for `-` and vice versa, preserving everything
/// else verbatim. Used by the finder to retry a failed lookup under the
/// other common spelling, and by the maestro's fallback matching.
///
/// This is a textual transform over the *raw* string, distinct from
/// [`PackageName::new`]'s normalization, which collapses both spellings
/// to the same canonical form.
pub fn swap_separators(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '-' => '_',
            '_' => '-',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_hyphen_underscore_dot() {
        assert_eq!(PackageName::new("My_Package").unwrap().as_str(), "my-package");
        assert_eq!(PackageName::new("my.package").unwrap().as_str(), "my-package");
        assert_eq!(PackageName::new("my--package").unwrap().as_str(), "my-package");
    }

    #[test]
    fn equal_across_spellings() {
        assert_eq!(
            PackageName::new("foo_bar").unwrap(),
            PackageName::new("foo-bar").unwrap()
        );
    }

    #[test]
    fn rejects_empty() {
        assert!(PackageName::new("").is_err());
        assert!(PackageName::new("---").is_err());
    }

    #[test]
    fn swap_separators_round_trips_hyphen_and_underscore() {
        assert_eq!(swap_separators("my-pkg"), "my_pkg");
        assert_eq!(swap_separators("my_pkg"), "my-pkg");
    }
}
