use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::Version;

/// One of `==`, `!=`, `<`, `<=`, `>`, `>=`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl Operator {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            Self::Equal => ord == Ordering::Equal,
            Self::NotEqual => ord != Ordering::Equal,
            Self::LessThan => ord == Ordering::Less,
            Self::LessThanEqual => ord != Ordering::Greater,
            Self::GreaterThan => ord == Ordering::Greater,
            Self::GreaterThanEqual => ord != Ordering::Less,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = VersionSpecifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanEqual,
            other => return Err(VersionSpecifierParseError(other.to_string())),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `operator version` constraint, e.g. `>= 1.0`.
#[derive(Debug, Clone)]
pub struct VersionSpecifier {
    pub operator: Operator,
    pub version: Version,
}

impl VersionSpecifier {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self { operator, version }
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        self.operator.matches(candidate.cmp(&self.version))
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}

impl FromStr for VersionSpecifier {
    type Err = VersionSpecifierParseError;

    /// Parse `OPERATOR VERSION`, with optional whitespace around and between
    /// the two tokens (e.g. `>=1.0`, `>= 1.0`, `>= 1.0 `).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split_at = s
            .char_indices()
            .take_while(|(_, c)| !c.is_ascii_alphanumeric())
            .last()
            .map(|(idx, c)| idx + c.len_utf8())
            .ok_or_else(|| VersionSpecifierParseError(s.to_string()))?;
        let (operator, version) = s.split_at(split_at);
        let operator: Operator = operator.trim().parse()?;
        let version = version
            .trim()
            .parse()
            .map_err(|_| VersionSpecifierParseError(s.to_string()))?;
        Ok(Self::new(operator, version))
    }
}

#[derive(Debug, Error)]
#[error("invalid version specifier: `{0}`")]
pub struct VersionSpecifierParseError(String);

/// A conjunction of [`VersionSpecifier`]s: a candidate matches iff it
/// satisfies every one of them. An empty matcher matches everything.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    specifiers: Vec<VersionSpecifier>,
}

impl Matcher {
    pub fn new(specifiers: Vec<VersionSpecifier>) -> Self {
        Self { specifiers }
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        self.specifiers.iter().all(|spec| spec.matches(candidate))
    }

    pub fn specifiers(&self) -> &[VersionSpecifier] {
        &self.specifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_space() {
        let a: VersionSpecifier = ">=1.0".parse().unwrap();
        let b: VersionSpecifier = ">= 1.0".parse().unwrap();
        assert_eq!(a.operator, b.operator);
        assert_eq!(a.version, b.version);
    }

    #[test]
    fn conjunction_requires_all_specifiers() {
        let matcher = Matcher::new(vec![
            ">=1.0".parse().unwrap(),
            "<=2.0".parse().unwrap(),
        ]);
        assert!(matcher.matches(&"1.5".parse().unwrap()));
        assert!(!matcher.matches(&"2.5".parse().unwrap()));
        assert!(!matcher.matches(&"0.5".parse().unwrap()));
    }

    #[test]
    fn empty_matcher_matches_everything() {
        let matcher = Matcher::default();
        assert!(matcher.matches(&"0.0.1".parse().unwrap()));
    }
}
