// crates/xgeo-core/src/model.rs

//! Observation and entry types.
//!
//! A [`GeoObservation`] is what one pipeline pass learned about one subject;
//! a [`GeoEntry`] is the merged, persisted view. Both carry a [`Location`],
//! which is either a country or a macro-region and never both, so the
//! exclusivity rule is a property of the type rather than a runtime check.

use crate::error::XGeoError;
use crate::registry::CountryCode;
use crate::text::normalize_handle;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Country XOR macro-region.
///
/// Flattened into its parent it serializes as either `"countryCode": "CA"` or
/// `"regionName": "Europe"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Location {
    #[serde(rename = "countryCode")]
    Country(CountryCode),
    #[serde(rename = "regionName")]
    Region(String),
}

impl Location {
    pub fn country(&self) -> Option<CountryCode> {
        match self {
            Location::Country(code) => Some(*code),
            Location::Region(_) => None,
        }
    }

    pub fn region(&self) -> Option<&str> {
        match self {
            Location::Country(_) => None,
            Location::Region(label) => Some(label),
        }
    }
}

/// Which sub-structure the evidence for a subject came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    ProfileTransparency,
    AffiliatesLabel,
    VerificationInfo,
    #[default]
    Unknown,
}

/// Agreement between the "based in" and "connected via" claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Both claims present and equal.
    High,
    /// Only the "based in" claim is present.
    Partial,
    /// Both claims present and different.
    Mismatch,
    #[default]
    Unknown,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Partial => "partial",
            Confidence::Mismatch => "mismatch",
            Confidence::Unknown => "unknown",
        }
    }
}

/// The raw claims behind a confidence tier. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signals {
    pub based_in: Option<CountryCode>,
    pub connected_via: Option<CountryCode>,
    pub reason_country: Option<CountryCode>,
    pub about_based_in: Option<String>,
    pub region: Option<String>,
}

/// Copies of the subtrees an observation was derived from, for audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Evidence {
    pub verification_info: Option<Value>,
    pub profile_transparency: Option<Value>,
    pub affiliates_label: Option<Value>,
    pub about_profile: Option<Value>,
}

/// One pipeline pass's conclusion about one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoObservation {
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    pub signal_type: SignalType,
    pub confidence: Confidence,
    pub signals: Signals,
    /// `None` means "not assessed"; the store then keeps its previous value.
    #[serde(rename = "isVPN", skip_serializing_if = "Option::is_none")]
    pub is_vpn: Option<bool>,
    pub meta: Evidence,
}

impl GeoObservation {
    /// A bare observation: location only, everything else defaulted.
    pub fn new(subject_id: impl Into<String>, location: Location) -> Self {
        Self {
            subject_id: subject_id.into(),
            handle: None,
            location,
            signal_type: SignalType::Unknown,
            confidence: Confidence::Unknown,
            signals: Signals::default(),
            is_vpn: None,
            meta: Evidence::default(),
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_vpn(mut self, is_vpn: bool) -> Self {
        self.is_vpn = Some(is_vpn);
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }
}

/// The durable per-subject record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoEntry {
    pub subject_id: String,
    /// Normalized: lower-case, no leading `@`.
    pub handle: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    pub signal_type: SignalType,
    pub confidence: Confidence,
    pub signals: Signals,
    #[serde(rename = "isVPN")]
    pub is_vpn: bool,
    pub meta: Evidence,
    /// Epoch milliseconds of the last merge.
    pub cached_at: i64,
}

impl GeoEntry {
    /// True when everything a viewer can see is the same. `meta` and
    /// `cached_at` are bookkeeping and do not count.
    pub fn same_observables(&self, other: &GeoEntry) -> bool {
        self.subject_id == other.subject_id
            && self.handle == other.handle
            && self.location == other.location
            && self.signal_type == other.signal_type
            && self.confidence == other.confidence
            && self.signals == other.signals
            && self.is_vpn == other.is_vpn
    }
}

/// An entry as found in storage: every field optional and loosely typed.
///
/// Older snapshots used `userId` for the identity; both spellings load.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredEntry {
    #[serde(alias = "userId")]
    pub subject_id: Value,
    pub handle: Value,
    pub country_code: Value,
    pub region_name: Value,
    pub signal_type: Value,
    pub confidence: Value,
    pub signals: Value,
    #[serde(rename = "isVPN")]
    pub is_vpn: Value,
    pub meta: Value,
    pub cached_at: Value,
}

impl StoredEntry {
    /// Validate into a [`GeoEntry`], using `now` when no timestamp was saved.
    ///
    /// Fails when the identity is missing or neither a valid country code nor
    /// a region label is present. Everything else degrades to defaults.
    pub fn into_entry(self, now: i64) -> Result<GeoEntry, XGeoError> {
        let subject_id = match &self.subject_id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(XGeoError::InvalidEntry("missing subject id".into())),
        };

        let country = self.country_code.as_str().and_then(CountryCode::parse);
        let region = self
            .region_name
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let location = match (country, region) {
            (Some(code), _) => Location::Country(code),
            (None, Some(label)) => Location::Region(label.to_string()),
            (None, None) => {
                return Err(XGeoError::InvalidEntry(format!(
                    "entry {subject_id} has no location"
                )))
            }
        };

        Ok(GeoEntry {
            handle: self.handle.as_str().and_then(normalize_handle),
            location,
            signal_type: serde_json::from_value(self.signal_type).unwrap_or_default(),
            confidence: serde_json::from_value(self.confidence).unwrap_or_default(),
            signals: serde_json::from_value(self.signals).unwrap_or_default(),
            is_vpn: self.is_vpn.as_bool().unwrap_or(false),
            meta: serde_json::from_value(self.meta).unwrap_or_default(),
            cached_at: self.cached_at.as_i64().unwrap_or(now),
            subject_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(c: &str) -> CountryCode {
        CountryCode::parse(c).expect("valid code")
    }

    #[test]
    fn observation_serializes_location_flat() {
        let obs = GeoObservation::new("1", Location::Country(code("CA"))).with_vpn(false);
        let value = serde_json::to_value(&obs).expect("serialize");
        assert_eq!(value["countryCode"], "CA");
        assert!(value.get("regionName").is_none());
        assert_eq!(value["isVPN"], false);
        assert_eq!(value["confidence"], "unknown");
        assert_eq!(value["signalType"], "UNKNOWN");
    }

    #[test]
    fn stored_entries_accept_legacy_identity_key() {
        let raw: StoredEntry = serde_json::from_value(json!({
            "userId": 77,
            "handle": "@Someone",
            "countryCode": "de",
            "confidence": "high",
            "isVPN": true
        }))
        .expect("raw");
        let entry = raw.into_entry(5).expect("entry");
        assert_eq!(entry.subject_id, "77");
        assert_eq!(entry.handle.as_deref(), Some("someone"));
        assert_eq!(entry.location, Location::Country(code("DE")));
        assert_eq!(entry.confidence, Confidence::High);
        assert!(entry.is_vpn);
        assert_eq!(entry.cached_at, 5);
    }

    #[test]
    fn stored_entries_without_location_are_rejected() {
        let raw: StoredEntry =
            serde_json::from_value(json!({"subjectId": "1", "countryCode": "ZZ"})).expect("raw");
        assert!(raw.into_entry(0).is_err());
    }

    #[test]
    fn garbage_fields_fall_back_to_defaults() {
        let raw: StoredEntry = serde_json::from_value(json!({
            "subjectId": "1",
            "regionName": "Europe",
            "signalType": "SOMETHING_NEW",
            "signals": {"basedIn": "not a code"}
        }))
        .expect("raw");
        let entry = raw.into_entry(0).expect("entry");
        assert_eq!(entry.location, Location::Region("Europe".into()));
        assert_eq!(entry.signal_type, SignalType::Unknown);
        assert_eq!(entry.signals, Signals::default());
    }
}
