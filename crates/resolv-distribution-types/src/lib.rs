//! The [`Distribution`] record threaded from the locator stack through the
//! maestro to the downloader. It is intentionally immutable: once a locator
//! hands out a `Distribution`, nothing downstream mutates it in place — the
//! maestro stores it as the write-once "data" slot for a requirement.

use std::fmt;
use std::sync::Arc;

use resolv_version::Version;
use url::Url;

/// A locator's identity and base URL, as seen from a [`Distribution`].
///
/// `Distribution` needs to remember which locator produced it so that a
/// later download can propagate that locator's credentials (see
/// `update_url_credentials` in `resolv-client`) without `resolv-distribution-types`
/// depending on the locator stack itself — the dependency points the other
/// way, from `resolv-locator` down to here.
pub trait LocatorHandle: fmt::Debug + Send + Sync {
    /// The base URL this locator was configured with, including any
    /// userinfo credentials it was given.
    fn base_url(&self) -> &Url;
}

/// Immutable record of a single resolvable artifact: `{name, version,
/// source_url, download_url, locator}`.
///
/// `source_url` is the page the locator found the link on (a PyPI-style
/// simple index page, or an API response); `download_url` is the actual
/// artifact link extracted from it. For API locators the two are often
/// equal.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub name: String,
    pub version: Version,
    pub source_url: Url,
    pub download_url: Url,
    pub locator: Arc<dyn LocatorHandle>,
}

impl Distribution {
    pub fn new(
        name: impl Into<String>,
        version: Version,
        source_url: Url,
        download_url: Url,
        locator: Arc<dyn LocatorHandle>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            source_url,
            download_url,
            locator,
        }
    }

    /// The filename component of `download_url`, e.g. `foo-1.0-py3-none-any.whl`.
    pub fn filename(&self) -> &str {
        self.download_url
            .path_segments()
            .and_then(std::iter::Iterator::last)
            .unwrap_or("")
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeLocator(Url);
    impl LocatorHandle for FakeLocator {
        fn base_url(&self) -> &Url {
            &self.0
        }
    }

    #[test]
    fn filename_is_the_last_path_segment() {
        let locator = Arc::new(FakeLocator(Url::parse("https://example.com/simple/").unwrap()));
        let dist = Distribution::new(
            "foo",
            "1.0".parse().unwrap(),
            Url::parse("https://example.com/simple/foo/").unwrap(),
            Url::parse("https://example.com/packages/foo-1.0.tar.gz").unwrap(),
            locator,
        );
        assert_eq!(dist.filename(), "foo-1.0.tar.gz");
    }

    #[test]
    fn display_is_name_and_version() {
        let locator = Arc::new(FakeLocator(Url::parse("https://example.com/").unwrap()));
        let dist = Distribution::new(
            "foo",
            "1.0".parse().unwrap(),
            Url::parse("https://example.com/").unwrap(),
            Url::parse("https://example.com/foo-1.0.tar.gz").unwrap(),
            locator,
        );
        assert_eq!(dist.to_string(), "foo 1.0");
    }
}
