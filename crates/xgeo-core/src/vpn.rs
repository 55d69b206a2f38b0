// crates/xgeo-core/src/vpn.rs

//! VPN / proxy classification of a subject record.
//!
//! Only the profile-context node can make a subject VPN-associated; without
//! one the answer is always `false`. An explicit `location_accurate: true`
//! wins over every other signal.

use crate::correlator::{LABEL_TEXT_PATHS, REASON_TEXT_PATHS};
use crate::registry::detect_region;
use crate::scanner::SubjectRecord;
use crate::schema::{ACCOUNT_BASED_IN, AFFILIATE_USERNAME, LOCATION_ACCURATE, PROXY_FLAGS, SOURCE};
use crate::text::KeywordSet;
use crate::tree::{Node, NodeRef};
use once_cell::sync::Lazy;

static VPN_KEYWORDS: Lazy<KeywordSet> = Lazy::new(|| {
    KeywordSet::new(&[
        "vpn",
        "virtual private network",
        "proxy",
        "private relay",
        "tor",
        "onion",
        "anonymizer",
        "anonymizing",
        "warp",
        "orbot",
        "psiphon",
        "secure relay",
    ])
});

/// Shorter list checked against the source and affiliate username only.
static VPN_PATTERNS: Lazy<KeywordSet> =
    Lazy::new(|| KeywordSet::new(&["vpn", "proxy", "relay", "anonym", "tor", "warp"]));

/// Text fields of the profile-context node scanned for keywords.
const PROFILE_TEXT_FIELDS: &[&str] = &[SOURCE, ACCOUNT_BASED_IN, "account_label", "note", "description"];

/// How many of the leading [`LABEL_TEXT_PATHS`] are scanned for keywords.
/// `longDescription` and `shortDescription` only feed country detection.
const LABEL_KEYWORD_PATHS: usize = 4;

pub fn classify(record: &SubjectRecord<'_>) -> bool {
    let Some(profile) = record.profile() else {
        return false;
    };

    let accurate = profile.get(LOCATION_ACCURATE).and_then(|v| v.as_bool());
    if accurate == Some(true) {
        return false;
    }

    has_explicit_flag(profile)
        || keyword_texts(record, profile).any(|text| VPN_KEYWORDS.matches(text))
        || [SOURCE, AFFILIATE_USERNAME]
            .iter()
            .filter_map(|key| profile.get(key).and_then(|v| v.as_str()))
            .any(|text| VPN_PATTERNS.matches(text))
        || (accurate == Some(false) && !based_in_is_region(profile))
}

fn has_explicit_flag(profile: NodeRef<'_>) -> bool {
    PROXY_FLAGS
        .iter()
        .filter_map(|key| profile.get(key))
        .any(|value| match value.node() {
            Node::Bool(b) => *b,
            Node::String(s) => s == "true",
            Node::Number(n) => n.as_f64() == Some(1.0),
            _ => false,
        })
}

fn keyword_texts<'a>(
    record: &SubjectRecord<'a>,
    profile: NodeRef<'a>,
) -> impl Iterator<Item = &'a str> + 'a {
    let profile_texts = PROFILE_TEXT_FIELDS
        .iter()
        .filter_map(move |key| profile.get(key).and_then(|v| v.as_str()));
    let label = record.affiliates_label;
    let label_texts = LABEL_TEXT_PATHS[..LABEL_KEYWORD_PATHS]
        .iter()
        .filter_map(move |path| label.and_then(|l| l.str_at(path)));
    let info = record.verification_info;
    let reason_texts = REASON_TEXT_PATHS
        .iter()
        .filter_map(move |path| info.and_then(|i| i.str_at(path)));
    profile_texts.chain(label_texts).chain(reason_texts)
}

/// A coarse region is a legitimate answer, not a masked location.
fn based_in_is_region(profile: NodeRef<'_>) -> bool {
    profile
        .get(ACCOUNT_BASED_IN)
        .and_then(|v| v.as_str())
        .and_then(detect_region)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Payload;
    use serde_json::{json, Value};

    fn classify_value(value: Value) -> bool {
        let payload = Payload::from_value(&value);
        let record = SubjectRecord::from_node("1", payload.root());
        classify(&record)
    }

    #[test]
    fn no_profile_means_no_vpn() {
        assert!(!classify_value(json!({
            "verification_info": {"reason": {"description": "VPN"}}
        })));
    }

    #[test]
    fn accurate_location_overrides_keywords_and_flags() {
        assert!(!classify_value(json!({
            "about_profile": {
                "location_accurate": true,
                "source": "Proxy VPN Store",
                "is_proxy": true
            }
        })));
    }

    #[test]
    fn explicit_flags_accept_boolish_values() {
        assert!(classify_value(json!({"about_profile": {"isProxy": "true"}})));
        assert!(classify_value(json!({"about_profile": {"proxy_enabled": 1}})));
        assert!(!classify_value(json!({"about_profile": {"proxy": "yes"}})));
    }

    #[test]
    fn keywords_need_word_boundaries() {
        assert!(classify_value(json!({"about_profile": {"note": "Connected through Tor"}})));
        assert!(!classify_value(json!({"about_profile": {"account_based_in": "Toronto"}})));
        assert!(!classify_value(json!({"about_profile": {"description": "Anonymous America"}})));
    }

    #[test]
    fn affiliate_and_reason_texts_are_checked() {
        assert!(classify_value(json!({
            "about_profile": {},
            "affiliates_highlighted_label": {"label": {"richtext": {"text": "iCloud Private Relay"}}}
        })));
        assert!(classify_value(json!({
            "about_profile": {},
            "verification_info": {"reason": {"name": "via proxy"}}
        })));
    }

    #[test]
    fn affiliate_username_pattern() {
        assert!(classify_value(json!({"about_profile": {"affiliate_username": "warp"}})));
    }

    #[test]
    fn inaccurate_country_is_vpn_but_inaccurate_region_is_not() {
        assert!(classify_value(json!({
            "about_profile": {"account_based_in": "Germany", "location_accurate": false}
        })));
        assert!(!classify_value(json!({
            "about_profile": {"account_based_in": "East Asia & Pacific", "location_accurate": false}
        })));
    }
}
