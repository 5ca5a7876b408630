//! The pluggable multi-source locator stack.
//!
//! Two back-ends share one capability set — fetch a catalog for a package
//! name, report a base URL, compare equal by configuration — and an
//! aggregating locator queries a configured list of them in order. The two
//! back-ends are modeled as a tagged enum rather than a trait object: there
//! is no open set of implementations to abstract over, only these two.

mod aggregating;
mod api;
mod scraping;

pub use aggregating::AggregatingLocator;
pub use api::ApiLocator;
pub use scraping::ScrapingLocator;

use std::collections::HashMap;

use resolv_distribution_types::Distribution;
use resolv_requirement::Requirement;
use resolv_version::{Matcher, Version};
use url::Url;

/// Per-package catalog: a mapping from the remote's raw version string to
/// the [`Distribution`] it names. Keyed by the raw string (not a parsed
/// [`Version`]) so that "first occurrence wins" dedup matches the remote's
/// own notion of version identity.
pub type Catalog = HashMap<String, Distribution>;

/// The version scheme identifier every locator in this workspace reports.
pub const SCHEME: &str = "legacy";

/// The two interchangeable locator back-ends an [`AggregatingLocator`] can hold.
#[derive(Debug, Clone)]
pub enum Locator {
    Scraping(ScrapingLocator),
    Api(ApiLocator),
}

impl Locator {
    pub fn base_url(&self) -> &Url {
        match self {
            Self::Scraping(l) => l.base_url(),
            Self::Api(l) => l.base_url(),
        }
    }

    /// Fetch the catalog for `name`, exactly as spelled. Callers that want
    /// the hyphen/underscore retry described in the finder's contract pass
    /// each spelling variant in turn — the locator stack itself does not
    /// normalize this string, since the point of the retry is to hit the
    /// remote under the spelling it actually indexes.
    pub async fn get_project(&self, name: &str) -> Catalog {
        match self {
            Self::Scraping(l) => l.get_project(name).await,
            Self::Api(l) => l.get_project(name).await,
        }
    }
}

impl PartialEq for Locator {
    /// Two locators are equal iff they have the same concrete variant and
    /// the same base URL, so callers can deduplicate configured locators.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scraping(a), Self::Scraping(b)) => a.base_url() == b.base_url(),
            (Self::Api(a), Self::Api(b)) => a.base_url() == b.base_url(),
            (_, _) => false,
        }
    }
}

/// Apply `requirement`'s constraint matcher to `catalog`, returning the
/// distribution for the newest matching version.
///
/// `prereleases = false` additionally excludes any version carrying a
/// suffix (see [`resolv_version::Version::is_prerelease`]) from
/// consideration, matching the `prereleases` knob of `LocatorConfig`.
pub fn find_packages(
    requirement: &Requirement,
    catalog: &Catalog,
    prereleases: bool,
) -> Option<Distribution> {
    let matcher = Matcher::new(requirement.constraints.clone());
    let mut matching: Vec<(Version, &str)> = catalog
        .keys()
        .filter_map(|raw| {
            let version: Version = raw.parse().ok()?;
            if version.is_prerelease() && !prereleases {
                return None;
            }
            matcher.matches(&version).then_some((version, raw.as_str()))
        })
        .collect();
    matching.sort_by(|a, b| a.0.cmp(&b.0));
    let (_, raw) = matching.last()?;
    catalog.get(*raw).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use resolv_distribution_types::LocatorHandle;
    use resolv_requirement::parse_requirement;

    #[derive(Debug)]
    struct FakeLocator(Url);
    impl LocatorHandle for FakeLocator {
        fn base_url(&self) -> &Url {
            &self.0
        }
    }

    fn dist(version: &str) -> Distribution {
        let locator = Arc::new(FakeLocator(Url::parse("https://example.com/").unwrap()));
        Distribution::new(
            "bar",
            version.parse().unwrap(),
            Url::parse("https://example.com/").unwrap(),
            Url::parse(&format!("https://example.com/bar-{version}.tar.gz")).unwrap(),
            locator,
        )
    }

    #[test]
    fn find_packages_picks_the_newest_match() {
        let requirement = parse_requirement("bar (>= 1.0, <= 2.0)").unwrap();
        let catalog: Catalog = [
            ("0.9".to_string(), dist("0.9")),
            ("1.0".to_string(), dist("1.0")),
            ("1.5".to_string(), dist("1.5")),
            ("2.0".to_string(), dist("2.0")),
            ("2.1".to_string(), dist("2.1")),
        ]
        .into_iter()
        .collect();
        let found = find_packages(&requirement, &catalog, true).unwrap();
        assert_eq!(found.version.as_str(), "2.0");
    }

    #[test]
    fn find_packages_excludes_prereleases_when_disabled() {
        let requirement = parse_requirement("bar (>= 1.0)").unwrap();
        let catalog: Catalog = [
            ("1.0".to_string(), dist("1.0")),
            ("1.1a1".to_string(), dist("1.1a1")),
        ]
        .into_iter()
        .collect();
        let found = find_packages(&requirement, &catalog, false).unwrap();
        assert_eq!(found.version.as_str(), "1.0");
    }

    #[test]
    fn find_packages_returns_none_when_nothing_matches() {
        let requirement = parse_requirement("bar (>= 5.0)").unwrap();
        let catalog: Catalog = [("1.0".to_string(), dist("1.0"))].into_iter().collect();
        assert!(find_packages(&requirement, &catalog, true).is_none());
    }
}
