//! The in-memory registry of every filed requirement: its status bitmap,
//! its write-once data slots, its dependency back-links, and the
//! constraint-intersection algorithm that picks a package's best version.
//!
//! The registry is a single `RwLock`-guarded map: readers (`get_status`,
//! `best_version`, ...) run concurrently, writers (`file_requirement`,
//! `set_data`, ...) serialize. Two workers racing to set the same data
//! slot deterministically produce one winner and one `DataSlotInUse`.

mod data;
mod error;
mod status;

pub use data::DataField;
pub use error::MaestroError;
pub use status::Status;

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::instrument;

use data::DataSlots;
use resolv_distribution_filename::WheelFilename;
use resolv_normalize::PackageName;
use resolv_requirement::{parse_requirement, Requirement};
use resolv_version::{Matcher, Operator, Version};

#[derive(Debug, Clone)]
struct Entry {
    status: Status,
    /// One element per `file_requirement` call; `None` is the root
    /// sentinel (a user-supplied requirement with no parent).
    dependency_of: Vec<Option<String>>,
    data: DataSlots,
}

impl Entry {
    fn new() -> Self {
        Self {
            status: Status::empty(),
            dependency_of: Vec::new(),
            data: DataSlots::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Maestro {
    mapping: RwLock<HashMap<String, Entry>>,
}

impl Maestro {
    pub fn new() -> Self {
        Self {
            mapping: RwLock::new(HashMap::new()),
        }
    }

    /// File `requirement`, creating it (as `PENDING`) on first sight, and
    /// append `dependency_of` to its back-link list. Returns the canonical
    /// requirement string, which is what every other operation keys on.
    #[instrument(skip(self))]
    pub fn file_requirement(
        &self,
        requirement: &str,
        dependency_of: Option<&str>,
    ) -> Result<String, MaestroError> {
        let raw = canonical(requirement)?;
        let mut mapping = self.mapping.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = mapping.entry(raw.clone()).or_insert_with(Entry::new);
        entry.dependency_of.push(dependency_of.map(str::to_string));
        Ok(raw)
    }

    pub fn set_status(&self, requirement: &str, status: Status) -> Result<(), MaestroError> {
        self.with_entry_mut(requirement, |entry| entry.status = status)
    }

    pub fn add_status(&self, requirement: &str, status: Status) -> Result<(), MaestroError> {
        self.with_entry_mut(requirement, |entry| entry.status |= status)
    }

    pub fn get_status(&self, requirement: &str) -> Result<Status, MaestroError> {
        self.with_entry(requirement, |entry| entry.status)
    }

    /// Write `field`, failing with [`MaestroError::DataSlotInUse`] if it is
    /// already set.
    pub fn set_data(
        &self,
        requirement: &str,
        field: DataField,
        value: impl Into<String>,
    ) -> Result<(), MaestroError> {
        let raw = canonical(requirement)?;
        let mut mapping = self.mapping.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = mapping
            .get_mut(&raw)
            .ok_or_else(|| MaestroError::UnknownRequirement(raw.clone()))?;
        entry
            .data
            .set(field, value.into())
            .map_err(|()| MaestroError::DataSlotInUse(raw, field))
    }

    pub fn get_data(&self, requirement: &str, field: DataField) -> Result<Option<String>, MaestroError> {
        self.with_entry(requirement, |entry| entry.data.get(field))
    }

    /// Distinct package names across every filed requirement.
    pub fn filed_packages(&self) -> Vec<PackageName> {
        let mapping = self.mapping.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut names: Vec<PackageName> = mapping
            .keys()
            .filter_map(|raw| parse_requirement(raw).ok())
            .filter_map(|requirement| requirement.name)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Every filed requirement whose status intersects `status` — or, when
    /// `status` is empty, every requirement that is still `PENDING`.
    pub fn filter_by(&self, status: Status) -> Vec<String> {
        let mapping = self.mapping.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        mapping
            .iter()
            .filter(|(_, entry)| {
                if status.is_empty() {
                    entry.status.is_empty()
                } else {
                    entry.status.intersects(status)
                }
            })
            .map(|(raw, _)| raw.clone())
            .collect()
    }

    pub fn get_requirements_by_package_name(&self, name: &str) -> Result<Vec<String>, MaestroError> {
        let target = PackageName::new(name).map_err(|_| MaestroError::BadRequirement(name.to_string()))?;
        let mapping = self.mapping.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(mapping
            .keys()
            .filter(|raw| {
                parse_requirement(raw)
                    .ok()
                    .and_then(|requirement| requirement.name)
                    .is_some_and(|name| name == target)
            })
            .cloned()
            .collect())
    }

    /// Every version present in the `wheel` data slot of any requirement
    /// for `name`, newest-first, with duplicates removed.
    pub fn available_versions(&self, name: &str) -> Result<Vec<Version>, MaestroError> {
        let requirements = self.get_requirements_by_package_name(name)?;
        let mapping = self.mapping.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut versions: Vec<Version> = requirements
            .iter()
            .filter_map(|raw| mapping.get(raw))
            .filter_map(|entry| entry.data.get(DataField::Wheel))
            .filter_map(|wheel| wheel_version(&wheel))
            .collect();
        versions.sort();
        versions.dedup();
        versions.reverse();
        Ok(versions)
    }

    /// Versions from `available_versions` that satisfy `requirement`'s
    /// constraint set.
    pub fn matching_versions(&self, requirement: &str) -> Result<Vec<Version>, MaestroError> {
        let parsed = parse_requirement(requirement)
            .map_err(|_| MaestroError::BadRequirement(requirement.to_string()))?;
        let name = parsed
            .name
            .as_ref()
            .ok_or_else(|| MaestroError::BadRequirement(requirement.to_string()))?;
        let matcher = Matcher::new(parsed.constraints.clone());
        let versions = self.available_versions(name.as_str())?;
        Ok(versions.into_iter().filter(|version| matcher.matches(version)).collect())
    }

    /// True iff every element of `requirement`'s back-link list is the
    /// root sentinel, i.e. it was filed directly by the caller.
    pub fn is_primary_requirement(&self, requirement: &str) -> Result<bool, MaestroError> {
        self.with_entry(requirement, |entry| entry.dependency_of.iter().all(Option::is_none))
    }

    /// The best version of a package name (or of a requirement naming
    /// one), per the primary-override-then-intersection algorithm: a
    /// user-filed ("primary") requirement's recorded wheel version wins
    /// outright; otherwise the newest version present in every
    /// requirement's matching-version set wins.
    #[instrument(skip(self))]
    pub fn best_version(&self, requirement_or_package_name: &str) -> Result<(Version, String), MaestroError> {
        let package_name = parse_requirement(requirement_or_package_name)
            .ok()
            .and_then(|requirement| requirement.name)
            .ok_or_else(|| MaestroError::BadRequirement(requirement_or_package_name.to_string()))?;
        let requirements = self.get_requirements_by_package_name(package_name.as_str())?;

        let mut primary_by_version: HashMap<Version, String> = HashMap::new();
        let mut requirements_by_version: HashMap<Version, String> = HashMap::new();
        let mut all_versions: Vec<Version> = Vec::new();
        let mut all_constraints: Vec<String> = Vec::new();

        for requirement in &requirements {
            if self.is_primary_requirement(requirement)? {
                if let Some(wheel) = self.get_data(requirement, DataField::Wheel)? {
                    if let Some(version) = wheel_version(&wheel) {
                        primary_by_version.insert(version.clone(), requirement.clone());
                    }
                }
            }

            let matching = self.matching_versions(requirement)?;
            for version in &matching {
                requirements_by_version.insert(version.clone(), requirement.clone());
            }
            all_versions.extend(matching);

            let parsed = parse_requirement(requirement)
                .map_err(|_| MaestroError::BadRequirement(requirement.clone()))?;
            all_constraints.push(format_constraints(&parsed));
        }

        // Primary override: a user-supplied requirement's recorded version
        // wins even if it would otherwise conflict with dependents.
        if let Some(newest) = primary_by_version.keys().max().cloned() {
            let source = primary_by_version
                .remove(&newest)
                .unwrap_or_else(|| requirement_or_package_name.to_string());
            return Ok((newest, source));
        }

        let mut counts: HashMap<Version, usize> = HashMap::new();
        for version in &all_versions {
            *counts.entry(version.clone()).or_insert(0) += 1;
        }
        let compatible: Vec<Version> = counts
            .into_iter()
            .filter(|(_, count)| *count == requirements.len())
            .map(|(version, _)| version)
            .collect();

        let Some(newest) = compatible.iter().max().cloned() else {
            return Err(MaestroError::VersionConflict {
                package: package_name.as_str().to_string(),
                constraints: all_constraints.join(", "),
                available: self
                    .available_versions(package_name.as_str())?
                    .iter()
                    .map(Version::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        };
        let source = requirements_by_version
            .remove(&newest)
            .unwrap_or_else(|| requirement_or_package_name.to_string());
        Ok((newest, source))
    }

    fn with_entry<T>(&self, requirement: &str, f: impl FnOnce(&Entry) -> T) -> Result<T, MaestroError> {
        let raw = canonical(requirement)?;
        let mapping = self.mapping.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        mapping
            .get(&raw)
            .map(f)
            .ok_or(MaestroError::UnknownRequirement(raw))
    }

    fn with_entry_mut(&self, requirement: &str, f: impl FnOnce(&mut Entry)) -> Result<(), MaestroError> {
        let raw = canonical(requirement)?;
        let mut mapping = self.mapping.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = mapping
            .get_mut(&raw)
            .ok_or_else(|| MaestroError::UnknownRequirement(raw))?;
        f(entry);
        Ok(())
    }
}

fn canonical(requirement: &str) -> Result<String, MaestroError> {
    parse_requirement(requirement)
        .map(|parsed| parsed.raw)
        .map_err(|_| MaestroError::BadRequirement(requirement.to_string()))
}

/// Recover a version from a stored wheel filename, as the `wheel` data
/// slot holds a filename, not a bare version string.
fn wheel_version(wheel: &str) -> Option<Version> {
    WheelFilename::version_field(wheel).ok()?.parse().ok()
}

fn format_constraints(parsed: &Requirement) -> String {
    parsed
        .constraints
        .iter()
        .map(|specifier| match specifier.operator {
            Operator::Equal => specifier.version.to_string(),
            other => format!("{other} {}", specifier.version),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
