//! The scraping locator only needs to answer one question about a wheel's
//! platform tags: "could this possibly run here?" This is a much smaller
//! problem than full wheel-to-interpreter tag matching (which also needs
//! the Python and ABI tags, and a ranked list of every tag the interpreter
//! accepts) — that lives in the build/install step, out of scope here.

/// The host's platform tag, as it would appear in a wheel filename's
/// `platform_tag` field (e.g. `manylinux_2_17_x86_64`, `win_amd64`, `any`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HostPlatform {
    tag: String,
}

impl HostPlatform {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Derive a coarse platform tag from the running process's `std::env::consts`.
    ///
    /// This is intentionally coarse (no libc/manylinux version detection):
    /// it is enough to distinguish "this wheel clearly targets a different
    /// OS/architecture" from "this wheel might run here", which is all the
    /// scraping locator's filter needs.
    pub fn from_env() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "macosx",
            "windows" => "win",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "x86_64",
            "x86" => "i686",
            "aarch64" => "aarch64",
            other => other,
        };
        Self::new(format!("{os}_{arch}"))
    }

    pub fn as_str(&self) -> &str {
        &self.tag
    }
}

/// Is a wheel carrying these platform tags usable on `host`?
///
/// A wheel is compatible if any of its (possibly `.`-joined) platform tags
/// is the universal `any` tag, or shares the host's OS/architecture prefix.
pub fn is_compatible(platform_tags: &[String], host: &HostPlatform) -> bool {
    platform_tags.iter().any(|tag| {
        tag == "any" || tag == host.as_str() || host.as_str().starts_with(tag.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_is_always_compatible() {
        let host = HostPlatform::new("win_amd64");
        assert!(is_compatible(&["any".to_string()], &host));
    }

    #[test]
    fn mismatched_platform_is_rejected() {
        let host = HostPlatform::new("win_amd64");
        assert!(!is_compatible(&["macosx_10_8_x86_64".to_string()], &host));
    }

    #[test]
    fn matching_platform_is_accepted() {
        let host = HostPlatform::new("macosx_11_0_arm64");
        assert!(is_compatible(&["macosx_11_0_arm64".to_string()], &host));
    }
}
