//! Dispatches a finder result by URL scheme to the HTTP or VCS retrieval
//! path and hands the resulting bytes (or checkout directory) to an
//! artifact index.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;
use url::Url;

use resolv_client::{update_url_credentials, Pool, PoolError};
use resolv_index::{ArtifactIndex, IndexError};
use resolv_maestro::{DataField, Maestro, MaestroError, Status};
use resolv_vcs::{checkout, parse_vcs_url, VcsError};

/// What a successful download produced: either a stored archive (source
/// distribution or wheel) or a VCS checkout directory.
#[derive(Debug, Clone)]
pub enum DownloadedArtifact {
    Archive { stored_name: String, is_wheel: bool },
    Vcs { directory: String },
}

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("unrecognized URL scheme in `{0}`")]
    UnknownUrl(String),

    #[error("failed to download `{url}`: {status} {reason}")]
    ReportableError { url: String, status: u16, reason: String },

    #[error(transparent)]
    Transport(#[from] PoolError),

    #[error("failed to read response body from `{0}`")]
    Body(String, #[source] reqwest::Error),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Vcs(#[from] VcsError),
}

/// Retrieves the bytes (or VCS checkout) a [`crate::FinderRecord`] points
/// at, and stores them through an [`ArtifactIndex`].
pub struct Downloader<I> {
    pool: Arc<Pool>,
    index: Arc<I>,
}

impl<I: ArtifactIndex> Downloader<I> {
    pub fn new(pool: Arc<Pool>, index: Arc<I>) -> Self {
        Self { pool, index }
    }

    #[instrument(skip(self, locator_url), fields(%url))]
    pub async fn handle(
        &self,
        url: &Url,
        locator_url: Option<&Url>,
    ) -> Result<DownloadedArtifact, DownloaderError> {
        let scheme = url.scheme();
        if scheme == "http" || scheme == "https" {
            return self.download_http(url, locator_url).await;
        }
        if scheme.starts_with("git+") || scheme.starts_with("hg+") || scheme.starts_with("svn+") {
            return self.download_vcs(url).await;
        }
        Err(DownloaderError::UnknownUrl(url.to_string()))
    }

    async fn download_http(
        &self,
        url: &Url,
        locator_url: Option<&Url>,
    ) -> Result<DownloadedArtifact, DownloaderError> {
        let target = match locator_url {
            Some(base) => update_url_credentials(base, url),
            None => url.clone(),
        };

        let fetched = self.pool.retrieve(&target).await?;
        let status = fetched.response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DownloaderError::ReportableError {
                url: target.to_string(),
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        let filename = derive_filename(&fetched.response, &fetched.final_url, &target);
        let bytes = fetched
            .response
            .bytes()
            .await
            .map_err(|err| DownloaderError::Body(target.to_string(), err))?;

        let stored_name = self.index.from_data(&filename, &bytes).await?;
        let is_wheel = filename.ends_with(".whl");
        Ok(DownloadedArtifact::Archive { stored_name, is_wheel })
    }

    async fn download_vcs(&self, url: &Url) -> Result<DownloadedArtifact, DownloaderError> {
        let vcs_url = parse_vcs_url(url.as_str())?;
        let checked_out = checkout(&vcs_url).await?;
        Ok(DownloadedArtifact::Vcs {
            directory: checked_out.into_path().display().to_string(),
        })
    }
}

/// Priority: `Content-Disposition: attachment; filename=X` (quotes
/// stripped), then the basename of the post-redirect URL, then the
/// basename of the pre-redirect URL.
fn derive_filename(response: &reqwest::Response, final_url: &Url, original_url: &Url) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition_filename)
        .or_else(|| basename(final_url))
        .or_else(|| basename(original_url))
        .unwrap_or_else(|| "download".to_string())
}

fn parse_content_disposition_filename(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
    })
}

fn basename(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(Iterator::last)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Write a downloaded artifact into the maestro's `tarball`/`wheel` (or
/// `directory`) data slot, then mark the requirement `RETRIEVED`.
pub fn file_retrieved(
    maestro: &Maestro,
    requirement: &str,
    artifact: &DownloadedArtifact,
) -> Result<(), MaestroError> {
    match artifact {
        DownloadedArtifact::Archive { stored_name, is_wheel } => {
            let field = if *is_wheel { DataField::Wheel } else { DataField::Tarball };
            maestro.set_data(requirement, field, stored_name.clone())?;
        }
        DownloadedArtifact::Vcs { directory } => {
            maestro.set_data(requirement, DataField::Directory, directory.clone())?;
        }
    }
    maestro.add_status(requirement, Status::RETRIEVED)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolv_index::InMemoryIndex;

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let downloader = Downloader::new(Arc::new(Pool::with_defaults()), Arc::new(InMemoryIndex::new()));
        let url = Url::parse("ftp://example.com/pkg.tar.gz").unwrap();
        let err = downloader.handle(&url, None).await.unwrap_err();
        assert!(matches!(err, DownloaderError::UnknownUrl(_)));
    }

    #[test]
    fn filename_prefers_content_disposition() {
        assert_eq!(
            parse_content_disposition_filename(r#"attachment; filename="foo-1.0.tar.gz""#)
                .as_deref(),
            Some("foo-1.0.tar.gz")
        );
    }

    #[test]
    fn filename_falls_back_to_url_basename() {
        let url = Url::parse("https://example.com/packages/foo-1.0.tar.gz").unwrap();
        assert_eq!(basename(&url).as_deref(), Some("foo-1.0.tar.gz"));
    }

    #[tokio::test]
    async fn archive_results_are_distinguished_by_whl_suffix() {
        let maestro = Maestro::new();
        maestro.file_requirement("foo (1.0)", None).unwrap();
        let artifact = DownloadedArtifact::Archive {
            stored_name: "abc123-foo-1.0-py3-none-any.whl".to_string(),
            is_wheel: true,
        };
        file_retrieved(&maestro, "foo (1.0)", &artifact).unwrap();
        assert_eq!(
            maestro.get_data("foo (1.0)", DataField::Wheel).unwrap().as_deref(),
            Some("abc123-foo-1.0-py3-none-any.whl")
        );
        assert!(maestro.get_status("foo (1.0)").unwrap().contains(Status::RETRIEVED));
    }
}
