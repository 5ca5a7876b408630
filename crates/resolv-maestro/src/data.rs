use std::fmt;

/// The fixed set of write-once fields tracked per filed requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataField {
    Requirement,
    Url,
    LocatorUrl,
    Directory,
    Tarball,
    Wheel,
    Exception,
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requirement => "requirement",
            Self::Url => "url",
            Self::LocatorUrl => "locator_url",
            Self::Directory => "directory",
            Self::Tarball => "tarball",
            Self::Wheel => "wheel",
            Self::Exception => "exception",
        };
        f.write_str(name)
    }
}

/// A write-once slot for each of [`DataField`]'s variants. Modeled as a
/// fixed struct (rather than a map) since the field set is closed.
#[derive(Debug, Default, Clone)]
pub(crate) struct DataSlots {
    requirement: Option<String>,
    url: Option<String>,
    locator_url: Option<String>,
    directory: Option<String>,
    tarball: Option<String>,
    wheel: Option<String>,
    exception: Option<String>,
}

impl DataSlots {
    pub(crate) fn get(&self, field: DataField) -> Option<String> {
        self.slot(field).clone()
    }

    /// Set `field` to `value`, failing if it is already set.
    pub(crate) fn set(&mut self, field: DataField, value: String) -> Result<(), ()> {
        let slot = self.slot_mut(field);
        if slot.is_some() {
            return Err(());
        }
        *slot = Some(value);
        Ok(())
    }

    fn slot(&self, field: DataField) -> &Option<String> {
        match field {
            DataField::Requirement => &self.requirement,
            DataField::Url => &self.url,
            DataField::LocatorUrl => &self.locator_url,
            DataField::Directory => &self.directory,
            DataField::Tarball => &self.tarball,
            DataField::Wheel => &self.wheel,
            DataField::Exception => &self.exception,
        }
    }

    fn slot_mut(&mut self, field: DataField) -> &mut Option<String> {
        match field {
            DataField::Requirement => &mut self.requirement,
            DataField::Url => &mut self.url,
            DataField::LocatorUrl => &mut self.locator_url,
            DataField::Directory => &mut self.directory,
            DataField::Tarball => &mut self.tarball,
            DataField::Wheel => &mut self.wheel,
            DataField::Exception => &mut self.exception,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_reads_as_none() {
        let slots = DataSlots::default();
        assert_eq!(slots.get(DataField::Wheel), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut slots = DataSlots::default();
        slots.set(DataField::Wheel, "foo-1.0-py3-none-any.whl".to_string()).unwrap();
        assert_eq!(slots.get(DataField::Wheel).as_deref(), Some("foo-1.0-py3-none-any.whl"));
    }

    #[test]
    fn overwriting_a_set_slot_fails() {
        let mut slots = DataSlots::default();
        slots.set(DataField::Url, "https://example.com/a".to_string()).unwrap();
        assert!(slots.set(DataField::Url, "https://example.com/b".to_string()).is_err());
    }
}
