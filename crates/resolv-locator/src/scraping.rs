//! The scraping locator: a `PyPI`-style HTML simple index, walked one level
//! deep for sub-index pages, with a total-links-visited budget so a
//! pathological index can't make a single `get_project` call unbounded.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, instrument, trace};
use url::Url;

use resolv_client::Pool;
use resolv_distribution_filename::DistFilename;
use resolv_distribution_types::{Distribution, LocatorHandle};
use resolv_platform_tags::{is_compatible, HostPlatform};

use crate::Catalog;

/// Links visited per [`ScrapingLocator::get_project`] call are capped at
/// this count; not part of the original locator, added so a misbehaving
/// index with an unbounded subpage tree can't stall a lookup forever.
const DEFAULT_LINK_BUDGET: usize = 500;

#[derive(Debug, Clone)]
pub struct ScrapingLocator {
    base_url: Url,
    pool: Arc<Pool>,
    host: HostPlatform,
    link_budget: usize,
}

impl ScrapingLocator {
    pub fn new(base_url: Url, pool: Arc<Pool>) -> Self {
        Self {
            base_url,
            pool,
            host: HostPlatform::from_env(),
            link_budget: DEFAULT_LINK_BUDGET,
        }
    }

    #[must_use]
    pub fn with_host_platform(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_link_budget(mut self, budget: usize) -> Self {
        self.link_budget = budget;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[instrument(skip(self), fields(locator = %self.base_url, package = %name))]
    pub async fn get_project(&self, name: &str) -> Catalog {
        let Ok(project_url) = self.base_url.join(&format!("{name}/")) else {
            return Catalog::new();
        };

        let mut seen = HashSet::new();
        let mut budget = self.link_budget;
        let mut catalog = Catalog::new();
        self.fetch(name, &project_url, &mut seen, &mut budget, false, &mut catalog)
            .await;
        catalog
    }

    /// Mirrors the legacy scraping locator's `_fetch`: for each link on a
    /// page, recurse one level into it first if it looks like a sub-index,
    /// then visit the link itself as a candidate distribution. The first
    /// link seen for a given version wins.
    fn fetch<'a>(
        &'a self,
        project_name: &'a str,
        url: &'a Url,
        seen: &'a mut HashSet<Url>,
        budget: &'a mut usize,
        subvisit: bool,
        catalog: &'a mut Catalog,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(page) = self.get_page(url).await else {
                return;
            };

            for link in &page.links {
                if *budget == 0 {
                    debug!(%url, "link budget exhausted, stopping early");
                    return;
                }

                if !subvisit && should_queue(link, url) {
                    self.fetch(project_name, link, seen, budget, true, catalog)
                        .await;
                }

                if seen.insert(link.clone()) {
                    *budget -= 1;
                    if let Some((version, distribution)) = self.visit_link(project_name, link) {
                        catalog.entry(version).or_insert(distribution);
                    }
                }
            }
        })
    }

    fn visit_link(&self, project_name: &str, link: &Url) -> Option<(String, Distribution)> {
        let filename = link.path_segments()?.next_back()?;
        if filename.is_empty() {
            return None;
        }
        let dist_filename = DistFilename::parse(filename).ok()?;
        if let DistFilename::Wheel(wheel) = &dist_filename {
            if !is_compatible(&wheel.platform_tag, &self.host) {
                return None;
            }
        }

        let version = dist_filename.version().as_str().to_string();
        let distribution = Distribution::new(
            project_name,
            dist_filename.version().clone(),
            link.clone(),
            link.clone(),
            Arc::new(self.clone()) as Arc<dyn LocatorHandle>,
        );
        Some((version, distribution))
    }

    /// Fetch and parse one page of links. Any transport failure or
    /// non-HTML response is swallowed, returning no links rather than an
    /// error — a `get_project` call degrades to an empty catalog, never a
    /// hard failure, matching the locator's contract.
    async fn get_page(&self, url: &Url) -> Option<Page> {
        let fetched = match self.pool.retrieve(url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                debug!(%url, %err, "failed to fetch index page");
                return None;
            }
        };

        if !fetched.response.status().is_success() {
            return None;
        }

        let content_type = fetched
            .response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("html") {
            return None;
        }

        let final_url = fetched.final_url.clone();
        let text = fetched.response.text().await.ok()?;
        trace!(%final_url, bytes = text.len(), "parsing index page");
        parse_links(&text, &final_url)
    }
}

impl LocatorHandle for ScrapingLocator {
    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

struct Page {
    links: Vec<Url>,
}

/// Is `link` a candidate sub-index page reachable from `referrer`? Matches
/// the legacy locator's "introspect one level down" rule: directory-style
/// links under the same host as the page that listed them.
fn should_queue(link: &Url, referrer: &Url) -> bool {
    link.host_str().is_some() && link.host_str() == referrer.host_str() && link.path().ends_with('/')
}

fn parse_links(text: &str, page_url: &Url) -> Option<Page> {
    let dom = tl::parse(text, tl::ParserOptions::default()).ok()?;

    let mut links = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else { continue };
        if tag.name().as_bytes() != b"a" {
            continue;
        }
        let Some(Some(href)) = tag.attributes().get("href") else {
            continue;
        };
        let Ok(href) = std::str::from_utf8(href.as_bytes()) else {
            continue;
        };
        let href = html_escape::decode_html_entities(href);
        if let Ok(url) = page_url.join(&href) {
            links.push(url);
        }
    }
    Some(Page { links })
}
