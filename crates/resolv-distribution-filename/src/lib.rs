//! Filename grammars for the two distribution kinds the locator stack deals
//! with: wheels (pre-built, tagged) and source distributions (archives).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use resolv_version::{Version, VersionParseError};

/// A parsed wheel filename: `name-version[-build]-pytag-abitag-platformtag.whl`.
///
/// Each of `python_tag`/`abi_tag`/`platform_tag` may be a `.`-joined list of
/// compatibility tags, per the wheel filename convention.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WheelFilename {
    pub distribution: String,
    pub version: Version,
    pub python_tag: Vec<String>,
    pub abi_tag: Vec<String>,
    pub platform_tag: Vec<String>,
}

impl FromStr for WheelFilename {
    type Err = DistributionFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let stem = filename.strip_suffix(".whl").ok_or_else(|| {
            DistributionFilenameError::InvalidFileName(
                filename.to_string(),
                "must end with .whl".to_string(),
            )
        })?;
        Self::parse(stem, filename)
    }
}

impl WheelFilename {
    fn parse(stem: &str, filename: &str) -> Result<Self, DistributionFilenameError> {
        // https://packaging.python.org/en/latest/specifications/binary-distribution-format/#file-name-convention
        match stem.split('-').collect::<Vec<_>>().as_slice() {
            &[distribution, version, _build, python_tag, abi_tag, platform_tag]
            | &[distribution, version, python_tag, abi_tag, platform_tag] => {
                let version = Version::from_str(version).map_err(|err| {
                    DistributionFilenameError::InvalidVersion(filename.to_string(), err)
                })?;
                Ok(Self {
                    distribution: distribution.to_string(),
                    version,
                    python_tag: python_tag.split('.').map(String::from).collect(),
                    abi_tag: abi_tag.split('.').map(String::from).collect(),
                    platform_tag: platform_tag.split('.').map(String::from).collect(),
                })
            }
            _ => Err(DistributionFilenameError::InvalidFileName(
                filename.to_string(),
                "expected four or five `-`-separated fields".to_string(),
            )),
        }
    }

    /// The version as implied by the filename's second `-`-separated field,
    /// used by the scraping locator, which trusts the filename over parsing
    /// the whole thing into a [`WheelFilename`].
    pub fn version_field(filename: &str) -> Result<&str, DistributionFilenameError> {
        filename
            .split('-')
            .nth(1)
            .ok_or_else(|| DistributionFilenameError::InvalidFileName(
                filename.to_string(),
                "missing version field".to_string(),
            ))
    }
}

impl Display for WheelFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}.{}.{}.whl",
            self.distribution,
            self.version,
            self.python_tag.join("."),
            self.abi_tag.join("."),
            self.platform_tag.join("."),
        )
    }
}

/// A parsed source distribution filename: `name-version.EXT`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SourceDistFilename {
    pub distribution: String,
    pub version: Version,
    pub extension: String,
}

const SOURCE_DIST_EXTENSIONS: &[&str] = &["tar.gz", "zip", "tar.bz2", "tar.xz"];

impl FromStr for SourceDistFilename {
    type Err = DistributionFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let (stem, extension) = SOURCE_DIST_EXTENSIONS
            .iter()
            .find_map(|ext| filename.strip_suffix(ext).map(|stem| (stem, *ext)))
            .ok_or_else(|| {
                DistributionFilenameError::InvalidFileName(
                    filename.to_string(),
                    "unrecognized source archive extension".to_string(),
                )
            })?;
        let stem = stem.trim_end_matches('.');
        let (distribution, version) = stem.rsplit_once('-').ok_or_else(|| {
            DistributionFilenameError::InvalidFileName(
                filename.to_string(),
                "expected a `-`-separated name and version".to_string(),
            )
        })?;
        let version = Version::from_str(version)
            .map_err(|err| DistributionFilenameError::InvalidVersion(filename.to_string(), err))?;
        Ok(Self {
            distribution: distribution.to_string(),
            version,
            extension: extension.to_string(),
        })
    }
}

impl Display for SourceDistFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.distribution, self.version, self.extension)
    }
}

/// Either filename kind, as produced while walking a scraping locator's
/// index page.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DistFilename {
    Wheel(WheelFilename),
    SourceDist(SourceDistFilename),
}

impl DistFilename {
    pub fn parse(filename: &str) -> Result<Self, DistributionFilenameError> {
        if filename.ends_with(".whl") {
            Ok(Self::Wheel(filename.parse()?))
        } else {
            Ok(Self::SourceDist(filename.parse()?))
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            Self::Wheel(w) => &w.version,
            Self::SourceDist(s) => &s.version,
        }
    }

    pub fn is_wheel(&self) -> bool {
        matches!(self, Self::Wheel(_))
    }
}

#[derive(Debug, Error)]
pub enum DistributionFilenameError {
    #[error("the filename `{0}` is invalid: {1}")]
    InvalidFileName(String, String),
    #[error("the filename `{0}` has an invalid version field")]
    InvalidVersion(String, #[source] VersionParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_field_wheel() {
        let wheel: WheelFilename = "forbiddenfruit-0.1.1-cp27-none-macosx_10_8_x86_64.whl"
            .parse()
            .unwrap();
        assert_eq!(wheel.distribution, "forbiddenfruit");
        assert_eq!(wheel.version.as_str(), "0.1.1");
        assert_eq!(wheel.python_tag, vec!["cp27"]);
    }

    #[test]
    fn parses_five_field_wheel_with_build_tag() {
        let wheel: WheelFilename = "pkg-1.0-1-py3-none-any.whl".parse().unwrap();
        assert_eq!(wheel.version.as_str(), "1.0");
    }

    #[test]
    fn version_field_matches_full_parse() {
        let filename = "pkg-1.2.3-py2-none-any.whl";
        assert_eq!(WheelFilename::version_field(filename).unwrap(), "1.2.3");
    }

    #[test]
    fn rejects_missing_whl_suffix() {
        assert!("pkg-1.0-py3-none-any".parse::<WheelFilename>().is_err());
    }

    #[test]
    fn parses_source_dist_tar_gz() {
        let sdist: SourceDistFilename = "curdling-0.0.1.tar.gz".parse().unwrap();
        assert_eq!(sdist.distribution, "curdling");
        assert_eq!(sdist.version.as_str(), "0.0.1");
    }

    #[test]
    fn dist_filename_dispatches_on_extension() {
        assert!(DistFilename::parse("pkg-1.0-py3-none-any.whl").unwrap().is_wheel());
        assert!(!DistFilename::parse("pkg-1.0.zip").unwrap().is_wheel());
    }
}
