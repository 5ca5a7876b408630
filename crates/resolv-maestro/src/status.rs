use bitflags::bitflags;

bitflags! {
    /// A requirement's progress bitmap. `PENDING` has no dedicated bit —
    /// it is [`Status::empty`] — matching the invariant that a pending
    /// requirement has no other bits set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const FOUND     = 1 << 0;
        const RETRIEVED = 1 << 1;
        const BUILT     = 1 << 2;
        const CHECKED   = 1 << 3;
        const INSTALLED = 1 << 4;
        const FAILED    = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_empty_bitmap() {
        assert!(Status::empty().is_empty());
    }

    #[test]
    fn add_status_is_monotonic_union() {
        let mut status = Status::empty();
        status |= Status::FOUND;
        status |= Status::RETRIEVED;
        assert!(status.contains(Status::FOUND));
        assert!(status.contains(Status::RETRIEVED));
    }

    #[test]
    fn failed_does_not_clear_other_bits() {
        let status = Status::RETRIEVED | Status::FAILED;
        assert!(status.contains(Status::RETRIEVED));
        assert!(status.contains(Status::FAILED));
    }
}
