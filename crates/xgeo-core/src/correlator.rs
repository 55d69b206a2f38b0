// crates/xgeo-core/src/correlator.rs

//! Cross-checks two independently derived location claims for a subject.
//!
//! - *based in*: the resolved country, else the country named by the
//!   verification reason, else one detected in the raw based-in text.
//! - *connected via*: a country read off the affiliate label.
//!
//! The tier only reflects whether those two agree; the raw claims are kept
//! in [`Signals`] for display.

use crate::model::{Confidence, Location, Signals};
use crate::registry::{detect_country_in_text, CountryCode};
use crate::resolver::BasedInField;
use crate::scanner::SubjectRecord;
use crate::schema::COUNTRY_CODE_KEYS;
use crate::tree::NodeRef;

/// Code fields on an affiliate label, in the order they are trusted.
const LABEL_CODE_PATHS: [&[&str]; 8] = [
    &["countryCode"],
    &["country_code"],
    &["country"],
    &["badge", "countryCode"],
    &["badge", "country"],
    &["badge", "country_code"],
    &["label", "countryCode"],
    &["label", "country_code"],
];

/// Free-text fields on an affiliate label that may name a country.
pub(crate) const LABEL_TEXT_PATHS: &[&[&str]] = &[
    &["label", "description"],
    &["label", "richtext", "text"],
    &["label", "text"],
    &["description"],
    &["longDescription"],
    &["shortDescription"],
];

/// Free-text fields on a verification block that may name a country.
pub(crate) const REASON_TEXT_PATHS: &[&[&str]] = &[
    &["reason", "description"],
    &["reason", "name"],
    &["description"],
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub confidence: Confidence,
    pub signals: Signals,
}

/// Confidence tier for a pair of claims.
pub fn tier(based_in: Option<CountryCode>, connected_via: Option<CountryCode>) -> Confidence {
    match (based_in, connected_via) {
        (Some(a), Some(b)) if a == b => Confidence::High,
        (Some(_), Some(_)) => Confidence::Mismatch,
        (Some(_), None) => Confidence::Partial,
        (None, _) => Confidence::Unknown,
    }
}

pub fn correlate(record: &SubjectRecord<'_>, location: Option<&Location>) -> Correlation {
    let about_based_in = BasedInField::of(record).text();
    let reason_country = record.verification_info.and_then(country_from_verification);

    let based_in = location
        .and_then(Location::country)
        .or(reason_country)
        .or_else(|| about_based_in.and_then(detect_country_in_text));
    let connected_via = record.affiliates_label.and_then(country_from_affiliate_label);

    Correlation {
        confidence: tier(based_in, connected_via),
        signals: Signals {
            based_in,
            connected_via,
            reason_country,
            about_based_in: about_based_in.map(str::to_string),
            region: location.and_then(Location::region).map(str::to_string),
        },
    }
}

/// The country a verification block is about, from its reason code or text.
pub fn country_from_verification(info: NodeRef<'_>) -> Option<CountryCode> {
    let reason = info.get("reason");
    let direct = reason.and_then(|r| {
        COUNTRY_CODE_KEYS
            .iter()
            .find_map(|key| r.get(key).and_then(|v| v.as_str()).and_then(CountryCode::parse))
    });
    if direct.is_some() {
        return direct;
    }
    // Only the first non-empty description is considered.
    REASON_TEXT_PATHS
        .iter()
        .filter_map(|path| info.str_at(path))
        .find(|text| !text.is_empty())
        .and_then(detect_country_in_text)
}

/// The country an affiliate label points at, from its code fields or text.
pub fn country_from_affiliate_label(label: NodeRef<'_>) -> Option<CountryCode> {
    if !label.is_object() {
        return None;
    }
    LABEL_CODE_PATHS
        .iter()
        .filter_map(|path| label.str_at(path))
        .find_map(CountryCode::parse)
        .or_else(|| {
            LABEL_TEXT_PATHS
                .iter()
                .filter_map(|path| label.str_at(path))
                .find_map(detect_country_in_text)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Payload;
    use serde_json::{json, Value};

    fn code(c: &str) -> CountryCode {
        CountryCode::parse(c).expect("valid code")
    }

    fn run(value: Value, location: Option<Location>) -> Correlation {
        let payload = Payload::from_value(&value);
        let record = SubjectRecord::from_node("1", payload.root());
        correlate(&record, location.as_ref())
    }

    #[test]
    fn tiers_cover_every_combination() {
        assert_eq!(tier(Some(code("US")), Some(code("US"))), Confidence::High);
        assert_eq!(tier(Some(code("US")), Some(code("CA"))), Confidence::Mismatch);
        assert_eq!(tier(Some(code("US")), None), Confidence::Partial);
        assert_eq!(tier(None, Some(code("CA"))), Confidence::Unknown);
        assert_eq!(tier(None, None), Confidence::Unknown);
    }

    #[test]
    fn differing_claims_are_a_mismatch() {
        let c = run(
            json!({"affiliates_highlighted_label": {"label": {"countryCode": "CA"}}}),
            Some(Location::Country(code("US"))),
        );
        assert_eq!(c.confidence, Confidence::Mismatch);
        assert_eq!(c.signals.based_in, Some(code("US")));
        assert_eq!(c.signals.connected_via, Some(code("CA")));
    }

    #[test]
    fn verification_reason_backs_up_a_missing_resolution() {
        let c = run(
            json!({"verification_info": {"reason": {"description": "Identity verified in Germany"}}}),
            None,
        );
        assert_eq!(c.signals.based_in, Some(code("DE")));
        assert_eq!(c.signals.reason_country, Some(code("DE")));
        assert_eq!(c.confidence, Confidence::Partial);
    }

    #[test]
    fn affiliate_text_is_a_fallback_for_codes() {
        let c = run(
            json!({"affiliates_highlighted_label": {"label": {"description": "Official account of Japan"}}}),
            Some(Location::Country(code("JP"))),
        );
        assert_eq!(c.signals.connected_via, Some(code("JP")));
        assert_eq!(c.confidence, Confidence::High);
    }

    #[test]
    fn raw_based_in_text_and_region_are_recorded() {
        let c = run(
            json!({"about_profile": {"account_based_in": "Europe"}}),
            Some(Location::Region("Europe".into())),
        );
        assert_eq!(c.signals.about_based_in.as_deref(), Some("Europe"));
        assert_eq!(c.signals.region.as_deref(), Some("Europe"));
        assert_eq!(c.confidence, Confidence::Unknown);
    }
}
