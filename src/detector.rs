/// Classification of one observation against the persisted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// No snapshot exists yet, this is the first successful observation
    Initial,
    /// Current content differs from the persisted snapshot
    Changed,
    /// Current content is identical to the persisted snapshot
    Unchanged,
}

/// Compare the current page body against the previously persisted snapshot.
///
/// Comparison is exact string equality with no normalization, so volatile
/// markup in the source page (timestamps, session tokens) will surface as
/// `Changed`. Swapping in a normalizing comparison only requires replacing
/// this function; the loop depends on nothing but its signature.
pub fn classify(current: &str, previous: Option<&str>) -> ChangeEvent {
    match previous {
        None => ChangeEvent::Initial,
        Some(snapshot) if snapshot == current => ChangeEvent::Unchanged,
        Some(_) => ChangeEvent::Changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_snapshot_is_always_initial() {
        assert_eq!(classify("<html></html>", None), ChangeEvent::Initial);
        assert_eq!(classify("", None), ChangeEvent::Initial);
    }

    #[test]
    fn identical_content_is_unchanged() {
        assert_eq!(classify("page", Some("page")), ChangeEvent::Unchanged);
        assert_eq!(classify("", Some("")), ChangeEvent::Unchanged);
    }

    #[test]
    fn any_single_character_difference_is_changed() {
        assert_eq!(classify("page v2", Some("page v1")), ChangeEvent::Changed);
        // whitespace drift counts too, equality is byte-for-byte
        assert_eq!(classify("page ", Some("page")), ChangeEvent::Changed);
        assert_eq!(classify("Page", Some("page")), ChangeEvent::Changed);
    }
}
