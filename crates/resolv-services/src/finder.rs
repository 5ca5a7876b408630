//! Adapts a locator result into the `(requirement, url, locator_url)`
//! record the downloader consumes.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;
use url::Url;

use resolv_locator::AggregatingLocator;
use resolv_maestro::{DataField, Maestro, MaestroError, Status};
use resolv_normalize::swap_separators;
use resolv_requirement::parse_requirement;

/// The outcome of [`Finder::handle`]: the canonical requirement string,
/// the artifact URL a download should target, and (when the artifact came
/// from a locator rather than a direct link) that locator's base URL, used
/// by the downloader for credential propagation.
#[derive(Debug, Clone)]
pub struct FinderRecord {
    pub requirement: String,
    pub url: Url,
    pub locator_url: Option<Url>,
}

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("bad requirement: `{0}`")]
    BadRequirement(String),

    #[error("Requirement `{0}' not found")]
    NotFound(String),

    #[error("link requirement `{0}` is not a valid URL")]
    InvalidLinkUrl(String),
}

/// Resolves a filed requirement to a downloadable URL, either straight
/// from a direct link or by querying the configured locator stack.
pub struct Finder {
    locator: Arc<AggregatingLocator>,
}

impl Finder {
    pub fn new(locator: Arc<AggregatingLocator>) -> Self {
        Self { locator }
    }

    /// Resolve `requirement`. A link requirement synthesizes its record
    /// straight from the URL, with no locator lookup. A symbolic
    /// requirement is tried under its canonical hyphen spelling first,
    /// then its underscore spelling — remotes are inconsistent about
    /// which one they index under.
    #[instrument(skip(self))]
    pub async fn handle(&self, requirement: &str) -> Result<FinderRecord, FinderError> {
        let parsed = parse_requirement(requirement)
            .map_err(|_| FinderError::BadRequirement(requirement.to_string()))?;

        if parsed.is_link {
            let url = Url::parse(&parsed.raw)
                .map_err(|_| FinderError::InvalidLinkUrl(parsed.raw.clone()))?;
            return Ok(FinderRecord {
                requirement: parsed.raw,
                url,
                locator_url: None,
            });
        }

        let name = parsed
            .name
            .as_ref()
            .ok_or_else(|| FinderError::BadRequirement(parsed.raw.clone()))?;
        let hyphen = name.as_str().to_string();
        let underscore = swap_separators(&hyphen);

        for candidate in [hyphen, underscore] {
            if let Some(distribution) = self.locator.locate(&candidate, &parsed).await {
                return Ok(FinderRecord {
                    requirement: parsed.raw,
                    url: distribution.download_url.clone(),
                    locator_url: Some(distribution.locator.base_url().clone()),
                });
            }
        }

        Err(FinderError::NotFound(parsed.raw))
    }
}

/// Write a finder result into the maestro: the `url` (and, if present,
/// `locator_url`) data slots, then mark the requirement `FOUND`. Kept as a
/// free function, separate from `Finder::handle`, so the finder's locator
/// lookup has no direct maestro dependency — the worker harness that hosts
/// it is what wires a result back into the registry, matching the
/// message-passing model described for service workers.
pub fn file_found(maestro: &Maestro, record: &FinderRecord) -> Result<(), MaestroError> {
    maestro.set_data(&record.requirement, DataField::Url, record.url.to_string())?;
    if let Some(locator_url) = &record.locator_url {
        maestro.set_data(&record.requirement, DataField::LocatorUrl, locator_url.to_string())?;
    }
    maestro.add_status(&record.requirement, Status::FOUND)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn link_requirements_synthesize_a_record_without_a_locator() {
        let locator = Arc::new(AggregatingLocator::new(vec![], true));
        let finder = Finder::new(locator);
        let record = finder
            .handle("https://example.com/foo-1.0.tar.gz")
            .await
            .unwrap();
        assert_eq!(record.url.as_str(), "https://example.com/foo-1.0.tar.gz");
        assert!(record.locator_url.is_none());
    }

    #[tokio::test]
    async fn symbolic_requirements_with_no_locators_are_not_found() {
        let locator = Arc::new(AggregatingLocator::new(vec![], true));
        let finder = Finder::new(locator);
        let err = finder.handle("foo (>= 1.0)").await.unwrap_err();
        assert!(matches!(err, FinderError::NotFound(_)));
    }

    #[test]
    fn file_found_writes_url_and_marks_found() {
        let maestro = Maestro::new();
        maestro.file_requirement("foo (>= 1.0)", None).unwrap();
        let record = FinderRecord {
            requirement: "foo (>= 1.0)".to_string(),
            url: Url::parse("https://example.com/foo-1.0.tar.gz").unwrap(),
            locator_url: Some(Url::parse("https://example.com/simple/").unwrap()),
        };
        file_found(&maestro, &record).unwrap();
        assert_eq!(
            maestro.get_data("foo (>= 1.0)", DataField::Url).unwrap().as_deref(),
            Some("https://example.com/foo-1.0.tar.gz")
        );
        assert!(maestro.get_status("foo (>= 1.0)").unwrap().contains(Status::FOUND));
    }
}
