//! Per-scheme VCS dispatch for the downloader: `git+`, `hg+`, and `svn+`
//! URLs are cloned into a fresh temporary directory with the matching
//! shell tool, and checked out to a pinned revision when the URL carries
//! one.
//!
//! This shells out rather than linking a VCS library (`git2` and
//! friends), matching the legacy downloader's own approach: VCS
//! invocations are one of this workspace's two blocking suspension
//! points (alongside HTTP), and there is no timeout around them — a
//! hung clone is fatal, per the concurrency model.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// One of the three version-control back-ends the downloader dispatches to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
}

impl VcsKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "git" => Some(Self::Git),
            "hg" => Some(Self::Hg),
            "svn" => Some(Self::Svn),
            _ => None,
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Svn => "svn",
        }
    }
}

/// A parsed VCS requirement URL: `<kind>+<repository>[@<revision>]`.
#[derive(Debug, Clone)]
pub struct VcsUrl {
    pub kind: VcsKind,
    /// The inner URL with the `<kind>+` prefix and any `@revision` suffix
    /// stripped, e.g. `https://example.com/repo.git`.
    pub repository: String,
    pub revision: Option<String>,
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("`{0}` is not a recognized VCS URL (expected a git+, hg+, or svn+ prefix)")]
    UnrecognizedScheme(String),

    #[error("failed to create a temporary checkout directory")]
    TempDir(#[source] std::io::Error),

    #[error("failed to spawn `{0}`")]
    Spawn(String, #[source] std::io::Error),

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: std::process::ExitStatus },
}

/// Parse a `vcs+inner` requirement URL. The scheme prefix is matched
/// against [`VcsKind::from_prefix`]; anything else is
/// [`VcsError::UnrecognizedScheme`].
pub fn parse_vcs_url(raw: &str) -> Result<VcsUrl, VcsError> {
    let (prefix, rest) = raw
        .split_once('+')
        .ok_or_else(|| VcsError::UnrecognizedScheme(raw.to_string()))?;
    let kind = VcsKind::from_prefix(prefix).ok_or_else(|| VcsError::UnrecognizedScheme(raw.to_string()))?;
    let (repository, revision) = split_revision(rest);
    Ok(VcsUrl {
        kind,
        repository: repository.to_string(),
        revision: revision.map(str::to_string),
    })
}

/// Split `scheme://[userinfo@]host[:port][/path][@revision]` on the last
/// `@` found in the path component, so a `user:pass@host` or `user@host`
/// userinfo segment — which sits inside the authority, before the path's
/// own leading `/` — is never mistaken for a revision marker. The
/// authority ends at the first `/` that follows the `://` separator, not
/// at the first `/` in the whole string (that one is part of `://`
/// itself).
fn split_revision(rest: &str) -> (&str, Option<&str>) {
    let authority_end = match rest.find("://") {
        Some(scheme_end) => {
            let after_scheme = scheme_end + 3;
            rest[after_scheme..]
                .find('/')
                .map_or(rest.len(), |i| after_scheme + i)
        }
        None => 0,
    };
    let path = &rest[authority_end..];
    match path.rfind('@') {
        Some(at) => (&rest[..authority_end + at], Some(&path[at + 1..])),
        None => (rest, None),
    }
}

/// A completed checkout: the bytes live in `dir` for as long as this value
/// is alive, and are removed when it is dropped.
pub struct Checkout {
    dir: TempDir,
}

impl Checkout {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the checkout directory on disk past this value's lifetime.
    pub fn into_path(self) -> PathBuf {
        self.dir.into_path()
    }
}

/// Clone `url` into a fresh temporary directory, then check out its
/// pinned revision if it carries one.
pub async fn checkout(url: &VcsUrl) -> Result<Checkout, VcsError> {
    let dir = TempDir::new().map_err(VcsError::TempDir)?;
    clone(url, dir.path()).await?;
    if let Some(revision) = &url.revision {
        update_to_revision(url, dir.path(), revision).await?;
    }
    Ok(Checkout { dir })
}

async fn clone(url: &VcsUrl, dest: &Path) -> Result<(), VcsError> {
    let args: Vec<&OsStr> = match url.kind {
        VcsKind::Git => vec![OsStr::new("clone"), OsStr::new(&url.repository), dest.as_os_str()],
        VcsKind::Hg => vec![OsStr::new("clone"), OsStr::new(&url.repository), dest.as_os_str()],
        VcsKind::Svn => vec![
            OsStr::new("co"),
            OsStr::new("-q"),
            OsStr::new(&url.repository),
            dest.as_os_str(),
        ],
    };
    run(url.kind, &args).await
}

async fn update_to_revision(url: &VcsUrl, dir: &Path, revision: &str) -> Result<(), VcsError> {
    match url.kind {
        VcsKind::Git => run(url.kind, &[OsStr::new("-C"), dir.as_os_str(), OsStr::new("reset"), OsStr::new("--hard"), OsStr::new(revision)]).await,
        VcsKind::Hg => run(url.kind, &[OsStr::new("-R"), dir.as_os_str(), OsStr::new("update"), OsStr::new("-q"), OsStr::new(revision)]).await,
        // svn has no separate "update to revision" step distinct from checkout;
        // the legacy downloader re-runs the checkout pinned to the revision.
        VcsKind::Svn => {
            run(
                url.kind,
                &[
                    OsStr::new("co"),
                    OsStr::new("-r"),
                    OsStr::new(revision),
                    OsStr::new(&url.repository),
                    dir.as_os_str(),
                ],
            )
            .await
        }
    }
}

async fn run(kind: VcsKind, args: &[&OsStr]) -> Result<(), VcsError> {
    let program = kind.program();
    debug!(program, ?args, "running VCS command");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|err| VcsError::Spawn(program.to_string(), err))?;
    if !status.success() {
        return Err(VcsError::CommandFailed {
            command: program.to_string(),
            status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_git_url_without_revision() {
        let url = parse_vcs_url("git+https://example.com/repo.git").unwrap();
        assert_eq!(url.kind, VcsKind::Git);
        assert_eq!(url.repository, "https://example.com/repo.git");
        assert!(url.revision.is_none());
    }

    #[test]
    fn parses_revision_suffix() {
        let url = parse_vcs_url("git+https://example.com/repo.git@v1.0").unwrap();
        assert_eq!(url.repository, "https://example.com/repo.git");
        assert_eq!(url.revision.as_deref(), Some("v1.0"));
    }

    #[test]
    fn userinfo_at_sign_is_not_mistaken_for_a_revision() {
        let url = parse_vcs_url("git+ssh://git@example.com/repo.git").unwrap();
        assert_eq!(url.repository, "ssh://git@example.com/repo.git");
        assert!(url.revision.is_none());
    }

    #[test]
    fn userinfo_and_revision_both_present() {
        let url = parse_vcs_url("hg+https://user:pw@example.com/repo@abc123").unwrap();
        assert_eq!(url.kind, VcsKind::Hg);
        assert_eq!(url.repository, "https://user:pw@example.com/repo");
        assert_eq!(url.revision.as_deref(), Some("abc123"));
    }

    #[test]
    fn rejects_unrecognized_scheme() {
        assert!(parse_vcs_url("https://example.com/pkg.tar.gz").is_err());
    }

    #[test]
    fn recognizes_svn() {
        let url = parse_vcs_url("svn+https://example.com/repo").unwrap();
        assert_eq!(url.kind, VcsKind::Svn);
    }
}
