//! The API locator: a small JSON catalog endpoint (`GET base/api/<name>`)
//! exposed by a private index, as an alternative to HTML scraping.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use resolv_client::Pool;
use resolv_distribution_types::{Distribution, LocatorHandle};

use crate::Catalog;

#[derive(Debug, Deserialize)]
struct ApiEntry {
    name: String,
    version: String,
    urls: Vec<ApiUrl>,
}

#[derive(Debug, Deserialize)]
struct ApiUrl {
    url: String,
}

#[derive(Debug, Clone)]
pub struct ApiLocator {
    base_url: Url,
    pool: Arc<Pool>,
    not_found: Arc<Mutex<Vec<String>>>,
}

impl ApiLocator {
    pub fn new(base_url: Url, pool: Arc<Pool>) -> Self {
        Self {
            base_url,
            pool,
            not_found: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Package names that returned a non-200 status from this locator,
    /// queried by a caller deciding which remote server to notify about
    /// coverage gaps.
    pub fn not_found(&self) -> Vec<String> {
        self.not_found.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    #[instrument(skip(self), fields(locator = %self.base_url, package = %name))]
    pub async fn get_project(&self, name: &str) -> Catalog {
        let Ok(url) = self.base_url.join(&format!("api/{name}")) else {
            return Catalog::new();
        };

        let fetched = match self.pool.retrieve(&url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                debug!(%url, %err, "failed to reach API locator");
                return Catalog::new();
            }
        };

        if fetched.response.status() != reqwest::StatusCode::OK {
            self.not_found
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(name.to_string());
            return Catalog::new();
        }

        let entries: Vec<ApiEntry> = match fetched.response.json().await {
            Ok(entries) => entries,
            Err(err) => {
                debug!(%url, %err, "API locator returned unparsable JSON");
                return Catalog::new();
            }
        };

        let mut catalog = Catalog::new();
        for entry in entries {
            let Some(chosen) = entry
                .urls
                .iter()
                .find(|candidate| candidate.url.ends_with(".whl"))
                .or_else(|| entry.urls.first())
            else {
                continue;
            };
            let Ok(download_url) = Url::parse(&chosen.url) else {
                continue;
            };
            let Ok(version) = entry.version.parse() else {
                continue;
            };

            let distribution = Distribution::new(
                entry.name,
                version,
                download_url.clone(),
                download_url,
                Arc::new(self.clone()) as Arc<dyn LocatorHandle>,
            );
            catalog.entry(entry.version).or_insert(distribution);
        }
        catalog
    }
}

impl LocatorHandle for ApiLocator {
    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_starts_empty() {
        let pool = Arc::new(Pool::with_defaults());
        let locator = ApiLocator::new(Url::parse("https://example.com/").unwrap(), pool);
        assert!(locator.not_found().is_empty());
    }
}
