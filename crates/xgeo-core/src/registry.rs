// crates/xgeo-core/src/registry.rs

//! # Country Code Registry
//!
//! Static tables: the ISO 3166-1 alpha-2 set, a name/alias dictionary, display
//! names and the macro-region keyword table. Nothing here allocates at lookup
//! time except the folded key used for name matching.

use crate::text::{contains_word, fold_key, isolated_codes};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Valid ISO 3166-1 alpha-2 codes. Sorted, so lookups can binary search.
///
/// Subdivision codes that collide with nothing here (US states such as `NY`,
/// `TX`, `DC`) are rejected. Collisions that ARE countries (`CA`, `IN`, `DE`)
/// are accepted as the country.
const VALID_CODES: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX", "AZ",
    "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR", "BS",
    "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN",
    "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE",
    "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF",
    "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM",
    "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IO", "IQ", "IR", "IS", "IT", "JE", "JM",
    "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC",
    "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK",
    "ML", "MM", "MN", "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA",
    "NC", "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG",
    "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW",
    "SA", "SB", "SC", "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS",
    "ST", "SV", "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO",
    "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

/// Country names and common aliases, folded, in matching order.
///
/// Order matters for detection in free text: the first name found as a whole
/// word wins, so longer names that contain shorter ones ("south sudan" /
/// "sudan") come first.
const NAME_TO_CODE: &[(&str, &str)] = &[
    ("canada", "CA"),
    ("united states of america", "US"),
    ("united states", "US"),
    ("usa", "US"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("great britain", "GB"),
    ("australia", "AU"),
    ("germany", "DE"),
    ("france", "FR"),
    ("japan", "JP"),
    ("china", "CN"),
    ("india", "IN"),
    ("brazil", "BR"),
    ("russia", "RU"),
    ("south korea", "KR"),
    ("mexico", "MX"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("netherlands", "NL"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
    ("finland", "FI"),
    ("poland", "PL"),
    ("turkey", "TR"),
    ("south africa", "ZA"),
    ("egypt", "EG"),
    ("saudi arabia", "SA"),
    ("united arab emirates", "AE"),
    ("uae", "AE"),
    ("israel", "IL"),
    ("singapore", "SG"),
    ("thailand", "TH"),
    ("indonesia", "ID"),
    ("philippines", "PH"),
    ("vietnam", "VN"),
    ("malaysia", "MY"),
    ("new zealand", "NZ"),
    ("ireland", "IE"),
    ("switzerland", "CH"),
    ("austria", "AT"),
    ("belgium", "BE"),
    ("portugal", "PT"),
    ("greece", "GR"),
    ("czech republic", "CZ"),
    ("romania", "RO"),
    ("hungary", "HU"),
    ("ukraine", "UA"),
    ("argentina", "AR"),
    ("chile", "CL"),
    ("colombia", "CO"),
    ("peru", "PE"),
    ("venezuela", "VE"),
    ("pakistan", "PK"),
    ("bangladesh", "BD"),
    ("nigeria", "NG"),
    ("kenya", "KE"),
    ("ghana", "GH"),
    ("ethiopia", "ET"),
    ("morocco", "MA"),
    ("algeria", "DZ"),
    ("tunisia", "TN"),
    ("libya", "LY"),
    ("south sudan", "SS"),
    ("sudan", "SD"),
    ("iraq", "IQ"),
    ("iran", "IR"),
    ("afghanistan", "AF"),
    ("kazakhstan", "KZ"),
    ("uzbekistan", "UZ"),
    ("azerbaijan", "AZ"),
    ("georgia", "GE"),
    ("armenia", "AM"),
    ("lebanon", "LB"),
    ("jordan", "JO"),
    ("kuwait", "KW"),
    ("qatar", "QA"),
    ("bahrain", "BH"),
    ("oman", "OM"),
    ("yemen", "YE"),
    ("syria", "SY"),
    ("sri lanka", "LK"),
    ("nepal", "NP"),
    ("myanmar", "MM"),
    ("cambodia", "KH"),
    ("laos", "LA"),
    ("mongolia", "MN"),
    ("north korea", "KP"),
    ("taiwan", "TW"),
    ("hong kong", "HK"),
    ("macau", "MO"),
    ("kyrgyzstan", "KG"),
    ("tajikistan", "TJ"),
    ("turkmenistan", "TM"),
    ("palestine", "PS"),
    ("tanzania", "TZ"),
    ("uganda", "UG"),
    ("rwanda", "RW"),
    ("senegal", "SN"),
    ("mali", "ML"),
    ("burkina faso", "BF"),
    ("niger", "NE"),
    ("chad", "TD"),
    ("cameroon", "CM"),
    ("central african republic", "CF"),
    ("democratic republic of the congo", "CD"),
    ("republic of the congo", "CG"),
    ("gabon", "GA"),
    ("equatorial guinea", "GQ"),
    ("sao tome and principe", "ST"),
    ("angola", "AO"),
    ("zambia", "ZM"),
    ("malawi", "MW"),
    ("mozambique", "MZ"),
    ("madagascar", "MG"),
    ("mauritius", "MU"),
    ("seychelles", "SC"),
    ("comoros", "KM"),
    ("djibouti", "DJ"),
    ("eritrea", "ER"),
    ("somalia", "SO"),
    ("burundi", "BI"),
    ("zimbabwe", "ZW"),
    ("botswana", "BW"),
    ("namibia", "NA"),
    ("lesotho", "LS"),
    ("eswatini", "SZ"),
];

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("AD", "Andorra"), ("AE", "United Arab Emirates"), ("AF", "Afghanistan"),
    ("AG", "Antigua and Barbuda"), ("AI", "Anguilla"), ("AL", "Albania"), ("AM", "Armenia"),
    ("AO", "Angola"), ("AQ", "Antarctica"), ("AR", "Argentina"), ("AS", "American Samoa"),
    ("AT", "Austria"), ("AU", "Australia"), ("AW", "Aruba"), ("AX", "Åland Islands"),
    ("AZ", "Azerbaijan"), ("BA", "Bosnia and Herzegovina"), ("BB", "Barbados"),
    ("BD", "Bangladesh"), ("BE", "Belgium"), ("BF", "Burkina Faso"), ("BG", "Bulgaria"),
    ("BH", "Bahrain"), ("BI", "Burundi"), ("BJ", "Benin"), ("BL", "Saint Barthélemy"),
    ("BM", "Bermuda"), ("BN", "Brunei"), ("BO", "Bolivia"), ("BQ", "Caribbean Netherlands"),
    ("BR", "Brazil"), ("BS", "Bahamas"), ("BT", "Bhutan"), ("BV", "Bouvet Island"),
    ("BW", "Botswana"), ("BY", "Belarus"), ("BZ", "Belize"), ("CA", "Canada"),
    ("CC", "Cocos Islands"), ("CD", "DR Congo"), ("CF", "Central African Republic"),
    ("CG", "Republic of the Congo"), ("CH", "Switzerland"), ("CI", "Côte d'Ivoire"),
    ("CK", "Cook Islands"), ("CL", "Chile"), ("CM", "Cameroon"), ("CN", "China"),
    ("CO", "Colombia"), ("CR", "Costa Rica"), ("CU", "Cuba"), ("CV", "Cape Verde"),
    ("CW", "Curaçao"), ("CX", "Christmas Island"), ("CY", "Cyprus"), ("CZ", "Czechia"),
    ("DE", "Germany"), ("DJ", "Djibouti"), ("DK", "Denmark"), ("DM", "Dominica"),
    ("DO", "Dominican Republic"), ("DZ", "Algeria"), ("EC", "Ecuador"), ("EE", "Estonia"),
    ("EG", "Egypt"), ("EH", "Western Sahara"), ("ER", "Eritrea"), ("ES", "Spain"),
    ("ET", "Ethiopia"), ("FI", "Finland"), ("FJ", "Fiji"), ("FK", "Falkland Islands"),
    ("FM", "Micronesia"), ("FO", "Faroe Islands"), ("FR", "France"), ("GA", "Gabon"),
    ("GB", "United Kingdom"), ("GD", "Grenada"), ("GE", "Georgia"), ("GF", "French Guiana"),
    ("GG", "Guernsey"), ("GH", "Ghana"), ("GI", "Gibraltar"), ("GL", "Greenland"),
    ("GM", "Gambia"), ("GN", "Guinea"), ("GP", "Guadeloupe"), ("GQ", "Equatorial Guinea"),
    ("GR", "Greece"), ("GS", "South Georgia"), ("GT", "Guatemala"), ("GU", "Guam"),
    ("GW", "Guinea-Bissau"), ("GY", "Guyana"), ("HK", "Hong Kong"), ("HM", "Heard Island"),
    ("HN", "Honduras"), ("HR", "Croatia"), ("HT", "Haiti"), ("HU", "Hungary"),
    ("ID", "Indonesia"), ("IE", "Ireland"), ("IL", "Israel"), ("IM", "Isle of Man"),
    ("IN", "India"), ("IO", "British Indian Ocean Territory"), ("IQ", "Iraq"), ("IR", "Iran"),
    ("IS", "Iceland"), ("IT", "Italy"), ("JE", "Jersey"), ("JM", "Jamaica"), ("JO", "Jordan"),
    ("JP", "Japan"), ("KE", "Kenya"), ("KG", "Kyrgyzstan"), ("KH", "Cambodia"),
    ("KI", "Kiribati"), ("KM", "Comoros"), ("KN", "Saint Kitts and Nevis"),
    ("KP", "North Korea"), ("KR", "South Korea"), ("KW", "Kuwait"), ("KY", "Cayman Islands"),
    ("KZ", "Kazakhstan"), ("LA", "Laos"), ("LB", "Lebanon"), ("LC", "Saint Lucia"),
    ("LI", "Liechtenstein"), ("LK", "Sri Lanka"), ("LR", "Liberia"), ("LS", "Lesotho"),
    ("LT", "Lithuania"), ("LU", "Luxembourg"), ("LV", "Latvia"), ("LY", "Libya"),
    ("MA", "Morocco"), ("MC", "Monaco"), ("MD", "Moldova"), ("ME", "Montenegro"),
    ("MF", "Saint Martin"), ("MG", "Madagascar"), ("MH", "Marshall Islands"),
    ("MK", "North Macedonia"), ("ML", "Mali"), ("MM", "Myanmar"), ("MN", "Mongolia"),
    ("MO", "Macau"), ("MP", "Northern Mariana Islands"), ("MQ", "Martinique"),
    ("MR", "Mauritania"), ("MS", "Montserrat"), ("MT", "Malta"), ("MU", "Mauritius"),
    ("MV", "Maldives"), ("MW", "Malawi"), ("MX", "Mexico"), ("MY", "Malaysia"),
    ("MZ", "Mozambique"), ("NA", "Namibia"), ("NC", "New Caledonia"), ("NE", "Niger"),
    ("NF", "Norfolk Island"), ("NG", "Nigeria"), ("NI", "Nicaragua"), ("NL", "Netherlands"),
    ("NO", "Norway"), ("NP", "Nepal"), ("NR", "Nauru"), ("NU", "Niue"), ("NZ", "New Zealand"),
    ("OM", "Oman"), ("PA", "Panama"), ("PE", "Peru"), ("PF", "French Polynesia"),
    ("PG", "Papua New Guinea"), ("PH", "Philippines"), ("PK", "Pakistan"), ("PL", "Poland"),
    ("PM", "Saint Pierre and Miquelon"), ("PN", "Pitcairn Islands"), ("PR", "Puerto Rico"),
    ("PS", "Palestine"), ("PT", "Portugal"), ("PW", "Palau"), ("PY", "Paraguay"),
    ("QA", "Qatar"), ("RE", "Réunion"), ("RO", "Romania"), ("RS", "Serbia"), ("RU", "Russia"),
    ("RW", "Rwanda"), ("SA", "Saudi Arabia"), ("SB", "Solomon Islands"), ("SC", "Seychelles"),
    ("SD", "Sudan"), ("SE", "Sweden"), ("SG", "Singapore"), ("SH", "Saint Helena"),
    ("SI", "Slovenia"), ("SJ", "Svalbard and Jan Mayen"), ("SK", "Slovakia"),
    ("SL", "Sierra Leone"), ("SM", "San Marino"), ("SN", "Senegal"), ("SO", "Somalia"),
    ("SR", "Suriname"), ("SS", "South Sudan"), ("ST", "São Tomé and Príncipe"),
    ("SV", "El Salvador"), ("SX", "Sint Maarten"), ("SY", "Syria"), ("SZ", "Eswatini"),
    ("TC", "Turks and Caicos Islands"), ("TD", "Chad"), ("TF", "French Southern Territories"),
    ("TG", "Togo"), ("TH", "Thailand"), ("TJ", "Tajikistan"), ("TK", "Tokelau"),
    ("TL", "Timor-Leste"), ("TM", "Turkmenistan"), ("TN", "Tunisia"), ("TO", "Tonga"),
    ("TR", "Turkey"), ("TT", "Trinidad and Tobago"), ("TV", "Tuvalu"), ("TW", "Taiwan"),
    ("TZ", "Tanzania"), ("UA", "Ukraine"), ("UG", "Uganda"),
    ("UM", "United States Minor Outlying Islands"), ("US", "United States"),
    ("UY", "Uruguay"), ("UZ", "Uzbekistan"), ("VA", "Vatican City"),
    ("VC", "Saint Vincent and the Grenadines"), ("VE", "Venezuela"),
    ("VG", "British Virgin Islands"), ("VI", "United States Virgin Islands"),
    ("VN", "Vietnam"), ("VU", "Vanuatu"), ("WF", "Wallis and Futuna"), ("WS", "Samoa"),
    ("YE", "Yemen"), ("YT", "Mayotte"), ("ZA", "South Africa"), ("ZM", "Zambia"),
    ("ZW", "Zimbabwe"),
];

/// A coarse geographic label and the folded keywords that select it.
#[derive(Debug, Clone, Copy)]
pub struct RegionMapping {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Macro-regions, first match wins.
pub const REGION_MAPPINGS: &[RegionMapping] = &[
    RegionMapping { label: "North America", keywords: &["north america"] },
    RegionMapping { label: "South America", keywords: &["south america", "latin america"] },
    RegionMapping {
        label: "East Asia & Pacific",
        keywords: &["east asia", "east asia and pacific", "asia pacific", "apac", "east asia & pacific"],
    },
    RegionMapping {
        label: "West Asia / Middle East",
        keywords: &["west asia", "western asia", "middle east"],
    },
    RegionMapping { label: "Central Asia", keywords: &["central asia"] },
    RegionMapping { label: "Europe", keywords: &["europe", "eu"] },
    RegionMapping { label: "Sub-Saharan Africa", keywords: &["sub-saharan africa", "ssa"] },
    RegionMapping { label: "East Africa", keywords: &["east africa"] },
    RegionMapping { label: "West Africa", keywords: &["west africa"] },
    RegionMapping { label: "Southern Africa", keywords: &["southern africa"] },
    RegionMapping { label: "North Africa", keywords: &["north africa"] },
    RegionMapping { label: "Oceania", keywords: &["oceania"] },
    RegionMapping { label: "Caribbean", keywords: &["caribbean"] },
    RegionMapping { label: "Central America", keywords: &["central america"] },
];

/// Shown instead of a flag when a code cannot be rendered.
pub const PLACEHOLDER_FLAG: &str = "\u{1F3F3}\u{FE0F}";

const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// A validated ISO 3166-1 alpha-2 code.
///
/// Only obtainable through [`CountryCode::parse`], so holding one means the
/// code is in the registry. Serializes as the plain two-letter string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(&'static str);

impl CountryCode {
    /// Accepts any case and surrounding whitespace; rejects unknown codes.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() != 2 {
            return None;
        }
        let upper = code.to_ascii_uppercase();
        VALID_CODES
            .binary_search(&upper.as_str())
            .ok()
            .map(|idx| CountryCode(VALID_CODES[idx]))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// The two regional-indicator symbols for this code.
    pub fn flag_emoji(&self) -> String {
        self.0
            .bytes()
            .filter_map(|b| char::from_u32(REGIONAL_INDICATOR_A + u32::from(b - b'A')))
            .collect()
    }

    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAMES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
            .unwrap_or(self.0)
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for CountryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CountryCode::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown country code: {raw}")))
    }
}

/// True if `code` is a known alpha-2 code (case-insensitive).
pub fn is_valid(code: &str) -> bool {
    CountryCode::parse(code).is_some()
}

/// Exact lookup of a country name or alias (e.g. "United States", "uae").
pub fn name_to_code(name: &str) -> Option<CountryCode> {
    let key = fold_key(name);
    // Last definition wins if a name were ever listed twice.
    NAME_TO_CODE
        .iter()
        .rev()
        .find(|(n, _)| *n == key)
        .and_then(|(_, code)| CountryCode::parse(code))
}

/// Flag for a code, or [`PLACEHOLDER_FLAG`] when the code is not valid.
///
/// ```rust
/// use xgeo_core::registry::{code_to_flag_emoji, PLACEHOLDER_FLAG};
///
/// assert_eq!(code_to_flag_emoji("de"), "🇩🇪");
/// assert_eq!(code_to_flag_emoji("XX"), PLACEHOLDER_FLAG);
/// ```
pub fn code_to_flag_emoji(code: &str) -> String {
    CountryCode::parse(code)
        .map(|c| c.flag_emoji())
        .unwrap_or_else(|| PLACEHOLDER_FLAG.to_string())
}

/// Display name for a code; unknown input is echoed back unchanged.
pub fn code_to_display_name(code: &str) -> String {
    CountryCode::parse(code)
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Macro-region label whose keyword occurs in `text` as a whole word.
pub fn detect_region(text: &str) -> Option<&'static str> {
    let folded = fold_key(text);
    if folded.is_empty() {
        return None;
    }
    REGION_MAPPINGS
        .iter()
        .find(|m| m.keywords.iter().any(|k| contains_word(&folded, k)))
        .map(|m| m.label)
}

/// First country whose name occurs in `text` as a whole word.
pub fn detect_country_name_in(text: &str) -> Option<CountryCode> {
    let folded = fold_key(text);
    NAME_TO_CODE
        .iter()
        .find(|(name, _)| contains_word(&folded, name))
        .and_then(|(_, code)| CountryCode::parse(code))
}

/// Best-effort country from free text: a name substring first, then the first
/// isolated upper-case token that is a valid code.
pub fn detect_country_in_text(text: &str) -> Option<CountryCode> {
    detect_country_name_in(text).or_else(|| isolated_codes(text).find_map(CountryCode::parse))
}
