//! Builds an [`AggregatingLocator`] from a plain, already-parsed
//! configuration value. Turning a config *file* or CLI flags into a
//! [`LocatorConfig`] is an external collaborator's job; this module only
//! owns the one step in between: config value to wired-up locator stack.

use std::sync::Arc;

use resolv_client::Pool;
use resolv_locator::{AggregatingLocator, ApiLocator, Locator, ScrapingLocator};
use url::Url;

/// The inputs to [`get_locator`].
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Ordered scraping-locator (HTML simple-index) base URLs.
    pub pypi_urls: Vec<Url>,
    /// Ordered API-locator (JSON catalog) base URLs. Tried before
    /// `pypi_urls` in the aggregated order.
    pub curdling_urls: Vec<Url>,
    /// When `false`, pre-release versions are filtered out of
    /// `matching_versions`.
    pub prereleases: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            pypi_urls: Vec::new(),
            curdling_urls: Vec::new(),
            prereleases: true,
        }
    }
}

/// Wire `conf` into an [`AggregatingLocator`], sharing one [`Pool`] across
/// every back-end it creates. API locators come first, matching the
/// config's documented ordering: a private catalog server is consulted
/// before falling back to the public HTML index.
pub fn get_locator(conf: &LocatorConfig, pool: Arc<Pool>) -> AggregatingLocator {
    let locators = conf
        .curdling_urls
        .iter()
        .map(|url| Locator::Api(ApiLocator::new(url.clone(), Arc::clone(&pool))))
        .chain(
            conf.pypi_urls
                .iter()
                .map(|url| Locator::Scraping(ScrapingLocator::new(url.clone(), Arc::clone(&pool)))),
        )
        .collect();
    AggregatingLocator::new(locators, conf.prereleases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_locators_precede_scraping_locators() {
        let conf = LocatorConfig {
            pypi_urls: vec![Url::parse("https://pypi.example.com/simple/").unwrap()],
            curdling_urls: vec![Url::parse("https://curdling.example.com/").unwrap()],
            prereleases: true,
        };
        let pool = Arc::new(Pool::with_defaults());
        let aggregating = get_locator(&conf, pool);
        assert!(matches!(aggregating.locators()[0], Locator::Api(_)));
        assert!(matches!(aggregating.locators()[1], Locator::Scraping(_)));
    }

    #[test]
    fn defaults_to_prereleases_allowed_and_no_locators() {
        let conf = LocatorConfig::default();
        assert!(conf.prereleases);
        assert!(conf.pypi_urls.is_empty());
        assert!(conf.curdling_urls.is_empty());
    }
}
