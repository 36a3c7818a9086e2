use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::DocumentError;

/// Identifier of the outline document.
pub const OUTLINE_IDENTIFIER: &str = "summary.md";

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_\-.]*$").expect("identifier pattern"));

/// Purely numeric identifiers would shadow numeric document ids in `$<key>` links.
pub fn is_numeric(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate(identifier: &str) -> Result<(), DocumentError> {
    if !IDENTIFIER_REGEX.is_match(identifier) {
        return Err(DocumentError::validation(
            "invalid_identifier",
            "identifier may only contain letters, digits, '-', '_' and '.'",
        ));
    }
    if is_numeric(identifier) {
        return Err(DocumentError::validation(
            "numeric_identifier",
            "identifier must not be purely numeric",
        ));
    }
    Ok(())
}

/// Normalizes a symbolic link target (without the sigil) into the identifier
/// it refers to: the fragment is dropped and path separators become dashes.
pub fn normalize_link_target(target: &str) -> String {
    let without_fragment = target.split('#').next().unwrap_or_default();
    without_fragment.trim().replace('/', "-")
}

pub fn is_outline(identifier: &str) -> bool {
    identifier.eq_ignore_ascii_case(OUTLINE_IDENTIFIER)
}

/// Identifier assigned when a document is created without one.
pub fn generated(now: DateTime<Utc>) -> String {
    format!("date-{}", now.format("%Y.%m.%d.%H.%M.%S"))
}
