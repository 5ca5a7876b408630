//! Parses the `name (constraint, constraint, ...)` requirement grammar, plus
//! direct download/VCS links, into a canonical [`Requirement`].
//!
//! Canonicalization is what lets the maestro key its registry by meaning
//! rather than by whatever spelling the caller happened to type: `foo (==
//! 1.0)` and `foo (1.0)` both canonicalize to the raw string `foo (1.0)`.

use std::fmt;

use thiserror::Error;

use resolv_normalize::{InvalidNameError, PackageName};
use resolv_version::{Operator, Version, VersionSpecifier, VersionSpecifierParseError};

const LINK_PREFIXES: &[&str] = &["git+", "hg+", "svn+"];

/// A parsed requirement: either a `name (constraints)` form or a direct link.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Absent only for link requirements, which carry no package name.
    pub name: Option<PackageName>,
    pub constraints: Vec<VersionSpecifier>,
    pub is_link: bool,
    /// The canonical requirement string; this is what the maestro uses as
    /// its registry key.
    pub raw: String,
}

impl Requirement {
    /// Two requirement strings canonicalize identically iff they parse to
    /// the same [`Requirement::raw`].
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_link(s: &str) -> bool {
    s.contains("://") || LINK_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
}

/// Parse a raw requirement string into its canonical [`Requirement`].
pub fn parse_requirement(input: &str) -> Result<Requirement, BadRequirementError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BadRequirementError(input.to_string()));
    }

    if is_link(trimmed) {
        return Ok(Requirement {
            name: None,
            constraints: Vec::new(),
            is_link: true,
            raw: trimmed.to_string(),
        });
    }

    let (name_part, constraint_part) = match trimmed.find('(') {
        Some(idx) => {
            let name_part = trimmed[..idx].trim();
            let rest = trimmed[idx + 1..]
                .strip_suffix(')')
                .ok_or_else(|| BadRequirementError(input.to_string()))?;
            (name_part, Some(rest))
        }
        None => (trimmed, None),
    };

    if name_part.is_empty() {
        return Err(BadRequirementError(input.to_string()));
    }
    let name =
        PackageName::new(name_part).map_err(|_| BadRequirementError(input.to_string()))?;

    let mut constraints = Vec::new();
    if let Some(constraint_part) = constraint_part {
        let constraint_part = constraint_part.trim();
        if !constraint_part.is_empty() {
            for piece in constraint_part.split(',') {
                constraints.push(parse_constraint(piece.trim(), input)?);
            }
        }
    }

    let raw = format_canonical(name.as_str(), &constraints);
    Ok(Requirement {
        name: Some(name),
        constraints,
        is_link: false,
        raw,
    })
}

/// Parse one `OPERATOR VERSION` constraint, or a bare version (treated as
/// `== VERSION`, matching the common `name (1.2.3)` shorthand).
fn parse_constraint(piece: &str, original: &str) -> Result<VersionSpecifier, BadRequirementError> {
    let starts_with_operator = piece
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '=' | '!' | '<' | '>'));

    if starts_with_operator {
        piece
            .parse()
            .map_err(|_| BadRequirementError(original.to_string()))
    } else {
        let version: Version = piece
            .parse()
            .map_err(|_| BadRequirementError(original.to_string()))?;
        Ok(VersionSpecifier::new(Operator::Equal, version))
    }
}

/// Render `name` and its constraints into the canonical form: a bare name
/// when there are no constraints, otherwise `name (constraints)` with any
/// `== ` prefix dropped (so an exact pin reads as `name (1.2.3)` rather
/// than `name (== 1.2.3)`).
fn format_canonical(name: &str, constraints: &[VersionSpecifier]) -> String {
    if constraints.is_empty() {
        return name.to_string();
    }
    let rendered = constraints
        .iter()
        .map(|c| match c.operator {
            Operator::Equal => c.version.to_string(),
            other => format!("{other} {}", c.version),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{name} ({rendered})")
}

#[derive(Debug, Error)]
#[error("bad requirement: `{0}`")]
pub struct BadRequirementError(String);

impl From<VersionSpecifierParseError> for BadRequirementError {
    fn from(err: VersionSpecifierParseError) -> Self {
        Self(err.to_string())
    }
}

impl From<InvalidNameError> for BadRequirementError {
    fn from(err: InvalidNameError) -> Self {
        Self(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_has_no_constraints() {
        let req = parse_requirement("foo").unwrap();
        assert!(req.constraints.is_empty());
        assert_eq!(req.raw, "foo");
    }

    #[test]
    fn exact_pin_drops_equals_prefix() {
        let req = parse_requirement("foo (== 1.0)").unwrap();
        assert_eq!(req.raw, "foo (1.0)");
    }

    #[test]
    fn bare_version_is_treated_as_exact_pin() {
        let req = parse_requirement("foo (1.0)").unwrap();
        assert_eq!(req.constraints.len(), 1);
        assert_eq!(req.constraints[0].operator, Operator::Equal);
        assert_eq!(req.raw, "foo (1.0)");
    }

    #[test]
    fn multiple_constraints_join_with_comma_space() {
        let req = parse_requirement("bar (>= 1.0, <= 2.0)").unwrap();
        assert_eq!(req.raw, "bar (>= 1.0, <= 2.0)");
    }

    #[test]
    fn hyphen_and_underscore_normalize_to_the_same_name() {
        let a = parse_requirement("My_Package (1.0)").unwrap();
        let b = parse_requirement("my-package (1.0)").unwrap();
        assert_eq!(a.raw, b.raw);
    }

    #[test]
    fn canonical_round_trips() {
        let canonical = parse_requirement("foo (>= 1.0)").unwrap().raw;
        let reparsed = parse_requirement(&canonical).unwrap();
        assert_eq!(reparsed.raw, canonical);
    }

    #[test]
    fn detects_links() {
        assert!(parse_requirement("https://example.com/pkg-1.0.tar.gz").unwrap().is_link);
        assert!(parse_requirement("git+https://example.com/repo.git").unwrap().is_link);
        assert!(parse_requirement("git+ssh://git@example.com/repo.git").unwrap().is_link);
        assert!(!parse_requirement("foo (>= 1.0)").unwrap().is_link);
    }

    #[test]
    fn rejects_unparsable_input() {
        assert!(parse_requirement("").is_err());
        assert!(parse_requirement("foo (unclosed").is_err());
        assert!(parse_requirement("foo (not a version)").is_err());
    }
}
