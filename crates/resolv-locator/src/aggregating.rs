//! Queries a configured list of locators, in order, returning the first
//! one that yields a satisfying match.

use tracing::instrument;

use resolv_distribution_types::Distribution;
use resolv_requirement::Requirement;

use crate::{find_packages, Locator};

#[derive(Debug, Clone, Default)]
pub struct AggregatingLocator {
    locators: Vec<Locator>,
    prereleases: bool,
}

impl AggregatingLocator {
    pub fn new(locators: Vec<Locator>, prereleases: bool) -> Self {
        Self {
            locators,
            prereleases,
        }
    }

    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    /// Query each configured locator in turn under the single spelling
    /// `name`, returning the first non-empty match under `find_packages`.
    /// A locator that errors internally (transport failure, bad response)
    /// simply yields an empty catalog and the next locator is tried — see
    /// each locator's own `get_project` for where that swallowing happens.
    ///
    /// `name` is deliberately a bare string rather than `requirement.name`:
    /// the finder calls this once per spelling variant (hyphen, then
    /// underscore) of the same requirement, and only the catalog lookup
    /// should vary between those calls — the constraint matching always
    /// comes from `requirement` itself.
    #[instrument(skip(self, requirement), fields(%name, requirement = %requirement))]
    pub async fn locate(&self, name: &str, requirement: &Requirement) -> Option<Distribution> {
        for locator in &self.locators {
            let catalog = locator.get_project(name).await;
            if let Some(distribution) = find_packages(requirement, &catalog, self.prereleases) {
                return Some(distribution);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_locator_list_never_matches() {
        let aggregating = AggregatingLocator::new(vec![], true);
        assert!(aggregating.locators().is_empty());
    }
}
