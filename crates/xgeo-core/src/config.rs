// crates/xgeo-core/src/config.rs

//! Runtime configuration for the engine.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "subject_depth": 20, "target_operations": ["UserByScreenName"] }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Operation names that make a response worth inspecting when they appear
    /// in the request URL or body.
    pub target_operations: Vec<String>,
    /// URL fragments of the generic query endpoint. Any response from there is
    /// inspected; content decides the rest.
    pub endpoint_markers: Vec<String>,
    /// Identity-bearing fields, highest priority first.
    pub identity_fields: Vec<String>,
    /// Depth cap for the subject-record scan.
    pub subject_depth: usize,
    /// Depth cap for the "Account based in" phrase search.
    pub based_in_depth: usize,
    /// Depth cap for the last-resort country-code scan of a record.
    pub code_scan_depth: usize,
    /// Depth cap for the identity search that pairs with the phrase shortcut.
    pub identity_depth: usize,
    /// Prefix of every persisted entry key.
    pub storage_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_operations: [
                "UserByScreenName",
                "UserByRestId",
                "HomeTimeline",
                "UserProfile",
                "UserAbout",
                "Profile",
            ]
            .map(String::from)
            .to_vec(),
            endpoint_markers: ["/graphql/", "/i/api/graphql"].map(String::from).to_vec(),
            identity_fields: ["rest_id", "user_id", "id"].map(String::from).to_vec(),
            subject_depth: 15,
            based_in_depth: 15,
            code_scan_depth: 10,
            identity_depth: 10,
            storage_prefix: "geo:".to_string(),
        }
    }
}

impl EngineConfig {
    /// Storage key for a subject.
    pub fn storage_key(&self, subject_id: &str) -> String {
        format!("{}{}", self.storage_prefix, subject_id)
    }

    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    #[cfg(feature = "json")]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.identity_fields.is_empty() {
            return Err(crate::XGeoError::Config(
                "identity_fields must name at least one field".into(),
            ));
        }
        if self.storage_prefix.is_empty() {
            return Err(crate::XGeoError::Config("storage_prefix must not be empty".into()));
        }
        Ok(())
    }
}
