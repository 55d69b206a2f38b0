// crates/xgeo-core/src/resolver.rs

//! # Location Resolver
//!
//! Turns a [`SubjectRecord`] into at most one [`Location`] by walking a fixed
//! rule chain. The first rule that applies decides, including deciding
//! "nothing": an explicit but unusable answer is never overridden by a
//! coincidental match further down.
//!
//! | # | rule                     | applies when                                  |
//! |---|--------------------------|-----------------------------------------------|
//! | 1 | [`ResolutionRule::BasedIn`]        | `about_profile.account_based_in` has text |
//! | 2 | [`ResolutionRule::Source`]         | based-in field absent, `source` names a place |
//! | 3 | [`ResolutionRule::DirectField`]    | a known `countryCode` field holds a valid code |
//! | 4 | [`ResolutionRule::ExplicitEmpty`]  | `about_profile` exists, based-in present but empty |
//! | 5 | [`ResolutionRule::RecursiveScan`]  | otherwise                                      |

use crate::config::EngineConfig;
use crate::model::Location;
use crate::registry::{detect_country_name_in, detect_region, name_to_code, CountryCode};
use crate::scanner::SubjectRecord;
use crate::schema::{ACCOUNT_BASED_IN, COUNTRY_CODE_KEYS, SOURCE};
use crate::text::isolated_codes;
use crate::tree::{Node, NodeId, NodeRef};
use std::collections::HashSet;

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionRule {
    BasedIn,
    Source,
    DirectField,
    ExplicitEmpty,
    RecursiveScan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub location: Option<Location>,
    pub rule: ResolutionRule,
}

impl Resolution {
    fn found(location: Location, rule: ResolutionRule) -> Self {
        Self {
            location: Some(location),
            rule,
        }
    }

    fn nothing(rule: ResolutionRule) -> Self {
        Self {
            location: None,
            rule,
        }
    }

    pub fn country(&self) -> Option<CountryCode> {
        self.location.as_ref().and_then(Location::country)
    }

    pub fn region(&self) -> Option<&str> {
        self.location.as_ref().and_then(Location::region)
    }
}

/// State of the based-in field on the profile-context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasedInField<'a> {
    /// No profile node, no field, or `null`.
    Absent,
    /// Present but blank, or not text at all.
    Empty,
    Text(&'a str),
}

impl<'a> BasedInField<'a> {
    pub fn of(record: &SubjectRecord<'a>) -> Self {
        let Some(value) = record.profile().and_then(|p| p.get(ACCOUNT_BASED_IN)) else {
            return BasedInField::Absent;
        };
        match value.node() {
            Node::Null => BasedInField::Absent,
            Node::String(s) if !s.trim().is_empty() => BasedInField::Text(s.trim()),
            _ => BasedInField::Empty,
        }
    }

    pub fn text(&self) -> Option<&'a str> {
        match self {
            BasedInField::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Paths of direct country-code fields, relative to the record's
/// sub-structures, in the order they are trusted.
const VERIFICATION_CODE_PATHS: [&[&str]; 3] = [&["reason"], &["state"], &[]];

#[derive(Debug, Clone)]
pub struct LocationResolver {
    code_scan_depth: usize,
}

impl LocationResolver {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            code_scan_depth: config.code_scan_depth,
        }
    }

    pub fn resolve(&self, record: &SubjectRecord<'_>) -> Resolution {
        let based_in = BasedInField::of(record);

        if let BasedInField::Text(text) = based_in {
            return Resolution {
                location: location_from_based_in(text),
                rule: ResolutionRule::BasedIn,
            };
        }

        if based_in == BasedInField::Absent {
            if let Some(location) = record
                .profile()
                .and_then(|p| p.get(SOURCE))
                .and_then(|s| s.as_str())
                .and_then(location_from_source)
            {
                return Resolution::found(location, ResolutionRule::Source);
            }
        }

        if let Some(code) = direct_code(record) {
            return Resolution::found(Location::Country(code), ResolutionRule::DirectField);
        }

        if record.profile().is_some() && based_in == BasedInField::Empty {
            return Resolution::nothing(ResolutionRule::ExplicitEmpty);
        }

        let mut seen = HashSet::new();
        match self.scan_for_code(record.source_node, 0, &mut seen) {
            Some(code) => Resolution::found(Location::Country(code), ResolutionRule::RecursiveScan),
            None => Resolution::nothing(ResolutionRule::RecursiveScan),
        }
    }

    fn scan_for_code(
        &self,
        node: NodeRef<'_>,
        depth: usize,
        seen: &mut HashSet<NodeId>,
    ) -> Option<CountryCode> {
        if depth > self.code_scan_depth || !node.is_container() || !seen.insert(node.id()) {
            return None;
        }
        if !node.is_object() {
            return node
                .children()
                .into_iter()
                .find_map(|child| self.scan_for_code(child, depth + 1, seen));
        }

        for (key, value) in node.entries() {
            let key = key.to_ascii_lowercase();
            if let Some(text) = value.as_str() {
                if key.contains("country") || key == "cc" {
                    if let Some(code) = two_letters(text).and_then(CountryCode::parse) {
                        return Some(code);
                    }
                }
                if key.contains("description") {
                    if let Some(code) = isolated_codes(text).find_map(CountryCode::parse) {
                        return Some(code);
                    }
                }
            } else if let Some(code) = self.scan_for_code(value, depth + 1, seen) {
                return Some(code);
            }
        }
        None
    }
}

/// Rule 1: a name, a code, a macro-region, or a decisive nothing.
pub fn location_from_based_in(text: &str) -> Option<Location> {
    if let Some(code) = name_to_code(text) {
        return Some(Location::Country(code));
    }
    if let Some(code) = two_letters(text).and_then(CountryCode::parse) {
        return Some(Location::Country(code));
    }
    detect_region(text).map(|label| Location::Region(label.to_string()))
}

/// Rule 2: "Canada App Store" and the like.
fn location_from_source(source: &str) -> Option<Location> {
    detect_country_name_in(source)
        .map(Location::Country)
        .or_else(|| detect_region(source).map(|label| Location::Region(label.to_string())))
}

/// Rule 3: the first valid code among the known direct fields.
fn direct_code(record: &SubjectRecord<'_>) -> Option<CountryCode> {
    let mut candidates: Vec<NodeRef<'_>> = Vec::new();
    candidates.extend(record.profile_transparency);
    if let Some(info) = record.verification_info {
        candidates.extend(VERIFICATION_CODE_PATHS.iter().filter_map(|p| info.path(p)));
    }
    candidates.extend(record.affiliates_label);

    candidates.into_iter().find_map(|node| {
        COUNTRY_CODE_KEYS
            .iter()
            .filter_map(|key| node.get(key).and_then(|v| v.as_str()))
            .find_map(CountryCode::parse)
    })
}

/// `text` if it is exactly two ASCII letters after trimming.
fn two_letters(text: &str) -> Option<&str> {
    let text = text.trim();
    (text.len() == 2 && text.bytes().all(|b| b.is_ascii_alphabetic())).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Payload;
    use serde_json::{json, Value};

    fn resolve(value: Value) -> Resolution {
        let payload = Payload::from_value(&value);
        let record = SubjectRecord::from_node("1", payload.root());
        LocationResolver::new(&EngineConfig::default()).resolve(&record)
    }

    fn cc(code: &str) -> Option<Location> {
        CountryCode::parse(code).map(Location::Country)
    }

    #[test]
    fn based_in_country_name_resolves_to_code_only() {
        let r = resolve(json!({"about_profile": {"account_based_in": "Canada"}}));
        assert_eq!(r.location, cc("CA"));
        assert_eq!(r.region(), None);
        assert_eq!(r.rule, ResolutionRule::BasedIn);
    }

    #[test]
    fn based_in_region_keyword_resolves_to_region_only() {
        let r = resolve(json!({"about_profile": {"account_based_in": "East Asia & Pacific"}}));
        assert_eq!(r.location, Some(Location::Region("East Asia & Pacific".into())));
        assert_eq!(r.country(), None);
    }

    #[test]
    fn based_in_two_letter_code_is_accepted() {
        let r = resolve(json!({"about_profile": {"account_based_in": "jp"}}));
        assert_eq!(r.location, cc("JP"));
    }

    #[test]
    fn unparseable_based_in_is_a_decisive_nothing() {
        let r = resolve(json!({
            "about_profile": {"account_based_in": "Atlantis", "source": "Canada App Store"},
            "profile_transparency": {"countryCode": "DE"}
        }));
        assert_eq!(r.location, None);
        assert_eq!(r.rule, ResolutionRule::BasedIn);
    }

    #[test]
    fn source_is_used_when_based_in_is_absent() {
        let r = resolve(json!({"about_profile": {"source": "Canada App Store"}}));
        assert_eq!(r.location, cc("CA"));
        assert_eq!(r.rule, ResolutionRule::Source);
    }

    #[test]
    fn direct_fields_follow_priority_order() {
        let r = resolve(json!({
            "profile_transparency": {"countryCode": "XX"},
            "verification_info": {"reason": {"country_code": "fr"}, "countryCode": "DE"},
            "affiliates_highlighted_label": {"countryCode": "GB"}
        }));
        assert_eq!(r.location, cc("FR"));
        assert_eq!(r.rule, ResolutionRule::DirectField);
    }

    #[test]
    fn empty_based_in_blocks_the_recursive_scan() {
        let r = resolve(json!({
            "about_profile": {"account_based_in": ""},
            "legacy": {"description": "Proud to be in DE"}
        }));
        assert_eq!(r.location, None);
        assert_eq!(r.rule, ResolutionRule::ExplicitEmpty);
    }

    #[test]
    fn empty_based_in_still_honours_direct_fields() {
        let r = resolve(json!({
            "about_profile": {"account_based_in": "  "},
            "profile_transparency": {"country_code": "BR"}
        }));
        assert_eq!(r.location, cc("BR"));
    }

    #[test]
    fn recursive_scan_validates_candidates() {
        let r = resolve(json!({
            "legacy": {"location_country": "NY", "bio": {"description": "Living in NY, born in MX"}}
        }));
        assert_eq!(r.location, cc("MX"));
        assert_eq!(r.rule, ResolutionRule::RecursiveScan);
    }

    #[test]
    fn recursive_scan_gives_up_quietly() {
        let r = resolve(json!({"legacy": {"name": "nobody"}}));
        assert_eq!(r.location, None);
        assert_eq!(r.rule, ResolutionRule::RecursiveScan);
    }
}
