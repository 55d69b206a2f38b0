// crates/xgeo-core/src/schema.rs

//! Field names of the response shape the engine understands.
//!
//! Kept in one place so the scanner, resolver, correlator and VPN heuristic
//! agree on spelling.

/// Keys whose presence marks a node as carrying geo evidence.
pub const TRIGGER_KEYS: [&str; 3] = [VERIFICATION_INFO, PROFILE_TRANSPARENCY, AFFILIATES_LABEL];

pub const VERIFICATION_INFO: &str = "verification_info";
pub const PROFILE_TRANSPARENCY: &str = "profile_transparency";
pub const AFFILIATES_LABEL: &str = "affiliates_highlighted_label";

/// The "about this account" block: the profile-context node.
pub const ABOUT_PROFILE: &str = "about_profile";
pub const ACCOUNT_BASED_IN: &str = "account_based_in";
pub const SOURCE: &str = "source";
pub const LOCATION_ACCURATE: &str = "location_accurate";
pub const AFFILIATE_USERNAME: &str = "affiliate_username";

/// Where a handle may live on a matched node, in priority order.
pub const HANDLE_PATHS: [&[&str]; 3] = [
    &["core", "screen_name"],
    &["legacy", "screen_name"],
    &[ABOUT_PROFILE, "username"],
];

/// Boolean-ish proxy flags on the profile-context node.
pub const PROXY_FLAGS: [&str; 6] = [
    "is_proxy",
    "isProxy",
    "uses_proxy",
    "usesProxy",
    "proxy",
    "proxy_enabled",
];

pub const COUNTRY_CODE_KEYS: [&str; 2] = ["countryCode", "country_code"];
