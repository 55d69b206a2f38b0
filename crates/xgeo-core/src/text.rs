// crates/xgeo-core/src/text.rs

//! Small text helpers shared by the resolver, the VPN heuristic and the
//! reconciler.

use once_cell::sync::Lazy;
use regex::Regex;

static ISOLATED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2})\b").expect("valid regex"));

/// Comparison form of a country name or keyword: ASCII, lower-case, trimmed.
///
/// Registry names, region keywords and free text are all folded the same
/// way before they are compared, so `"  Türkiye"` meets `"turkiye"`.
///
/// ```rust
/// use xgeo_core::text::fold_key;
///
/// assert_eq!(fold_key("  Côte d'Ivoire "), "cote d'ivoire");
/// assert_eq!(fold_key("CANADA"), "canada");
/// ```
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s.trim()).to_lowercase()
}

/// Normalize an account handle: drop one leading `@`, lower-case.
///
/// Returns `None` for handles that are empty after normalization.
///
/// ```rust
/// use xgeo_core::text::normalize_handle;
///
/// assert_eq!(normalize_handle("@Jack").as_deref(), Some("jack"));
/// assert_eq!(normalize_handle("@"), None);
/// ```
pub fn normalize_handle(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_lowercase())
    }
}

/// True if `needle` occurs in `haystack` with no letter or digit directly
/// before or after it. Both sides are expected to be folded already.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Every upper-case two-letter token standing on its own in `text`.
///
/// Lower-case tokens are ignored on purpose: "in", "of" and friends would
/// otherwise collide with real codes.
pub fn isolated_codes(text: &str) -> impl Iterator<Item = &str> {
    ISOLATED_CODE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// A fixed keyword list matched case-insensitively on word boundaries.
///
/// "anonym" does not fire inside "anonymous", and "tor" does not fire inside
/// "Toronto".
#[derive(Debug, Clone)]
pub struct KeywordSet {
    pattern: Regex,
}

impl KeywordSet {
    pub fn new(keywords: &[&str]) -> Self {
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern =
            Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("escaped keywords");
        Self { pattern }
    }

    #[inline]
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_codes_skip_lowercase_and_embedded_letters() {
        let found: Vec<_> = isolated_codes("Verified in US, not USA or us").collect();
        assert_eq!(found, vec!["US"]);
    }

    #[test]
    fn contains_word_checks_both_edges() {
        assert!(contains_word("kyiv, ukraine", "ukraine"));
        assert!(!contains_word("kyiv, ukraine", "uk"));
        assert!(contains_word("london, uk", "uk"));
        assert!(contains_word("east asia & pacific", "east asia & pacific"));
        assert!(!contains_word("anything", ""));
    }

    #[test]
    fn keyword_set_respects_word_boundaries() {
        let set = KeywordSet::new(&["tor", "anonym", "private relay"]);
        assert!(set.matches("Connected via Tor"));
        assert!(set.matches("iCloud Private Relay"));
        assert!(!set.matches("Toronto, Canada"));
        assert!(!set.matches("Anonymous America"));
    }

    #[test]
    fn normalize_handle_only_strips_one_at() {
        assert_eq!(normalize_handle("@@x").as_deref(), Some("@x"));
        assert_eq!(normalize_handle("  "), None);
    }
}
