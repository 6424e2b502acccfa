//! Blocked-time classifier
//!
//! Scheduling calendars mix real appointments with internal time blocks
//! (breaks, meetings, closures). Blocks must never be synchronized as
//! sales. Classification is conservative: a block requires BOTH the
//! absence of a customer and a title from the keyword set.

/// Keywords that mark internal time blocks (matched case-insensitively,
/// as substrings of the service title)
pub const BLOCKED_TITLE_KEYWORDS: &[&str] = &[
    "personal time",
    "block",
    "break",
    "lunch",
    "off",
    "not available",
    "closed",
    "meeting",
    "admin",
];

/// Generic placeholder title the scheduling platform emits when no real
/// service was selected
pub const GENERIC_SERVICE_TITLE: &str = "Service";

/// True when the event is internal time rather than a real appointment:
/// no customer identifier AND the title contains a block keyword.
pub fn is_blocked(service_title: Option<&str>, customer_id: Option<&str>) -> bool {
    if customer_id.is_some() {
        return false;
    }
    let Some(title) = service_title else {
        return false;
    };
    let lowered = title.to_lowercase();
    BLOCKED_TITLE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// True when the title identifies an actual service (present, non-empty,
/// and not the generic placeholder)
pub fn has_meaningful_title(service_title: Option<&str>) -> bool {
    match service_title {
        Some(title) => {
            let trimmed = title.trim();
            !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(GENERIC_SERVICE_TITLE)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_requires_missing_customer_and_keyword_title() {
        assert!(is_blocked(Some("Lunch Break"), None));
        assert!(!is_blocked(Some("Lunch Break"), Some("c1")));
        assert!(!is_blocked(Some("Haircut"), None));
        assert!(!is_blocked(None, None));
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert!(is_blocked(Some("PERSONAL TIME"), None));
        assert!(is_blocked(Some("Not Available"), None));
        assert!(is_blocked(Some("Team Meeting"), None));
        assert!(is_blocked(Some("Day Off"), None));
    }

    #[test]
    fn placeholder_and_missing_titles_are_meaningless() {
        assert!(!has_meaningful_title(None));
        assert!(!has_meaningful_title(Some("")));
        assert!(!has_meaningful_title(Some("  ")));
        assert!(!has_meaningful_title(Some("Service")));
        assert!(!has_meaningful_title(Some("service")));
        assert!(has_meaningful_title(Some("Haircut")));
    }
}
