// crates/xgeo-core/src/scanner.rs

//! # Tree Scanner
//!
//! Depth-first searches over a [`Payload`](crate::tree::Payload):
//!
//! - [`TreeScanner::scan`] collects [`SubjectRecord`]s, one per node that
//!   carries a trigger key and has a known identity (its own or inherited).
//! - [`TreeScanner::find_based_in_phrase`] looks for an "Account based in …"
//!   sentence anywhere in the tree.
//! - [`TreeScanner::find_identity`] returns the shallowest identity field.
//!
//! All of them stop at the configured depth and never revisit a node.

use crate::config::EngineConfig;
use crate::registry::{detect_country_in_text, name_to_code, CountryCode};
use crate::schema::{ABOUT_PROFILE, AFFILIATES_LABEL, PROFILE_TRANSPARENCY, TRIGGER_KEYS, VERIFICATION_INFO};
use crate::tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashSet, VecDeque};

static BASED_IN_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)account\s+based\s+in\b[\s:]*([^\n.;,()]*)").expect("valid regex")
});

/// Evidence about one subject, borrowed from the payload it was found in.
#[derive(Debug, Clone)]
pub struct SubjectRecord<'a> {
    pub subject_id: String,
    pub verification_info: Option<NodeRef<'a>>,
    pub profile_transparency: Option<NodeRef<'a>>,
    pub affiliates_label: Option<NodeRef<'a>>,
    /// The whole matched node. Corroborating fields (`about_profile`, `core`,
    /// `legacy`) are siblings of the trigger keys, not children of them.
    pub source_node: NodeRef<'a>,
}

impl<'a> SubjectRecord<'a> {
    /// A record built from an arbitrary node, reading the trigger keys off it.
    pub fn from_node(subject_id: impl Into<String>, node: NodeRef<'a>) -> Self {
        Self {
            subject_id: subject_id.into(),
            verification_info: node.present(VERIFICATION_INFO),
            profile_transparency: node.present(PROFILE_TRANSPARENCY),
            affiliates_label: node.present(AFFILIATES_LABEL),
            source_node: node,
        }
    }

    /// The profile-context (`about_profile`) node, when it is an object.
    pub fn profile(&self) -> Option<NodeRef<'a>> {
        self.source_node.get(ABOUT_PROFILE).filter(NodeRef::is_object)
    }
}

#[derive(Debug, Clone)]
pub struct TreeScanner {
    identity_fields: Vec<String>,
    subject_depth: usize,
    based_in_depth: usize,
    identity_depth: usize,
}

impl TreeScanner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            identity_fields: config.identity_fields.clone(),
            subject_depth: config.subject_depth,
            based_in_depth: config.based_in_depth,
            identity_depth: config.identity_depth,
        }
    }

    fn own_identity(&self, node: NodeRef<'_>) -> Option<String> {
        self.identity_fields
            .iter()
            .find_map(|field| node.present(field).and_then(|v| v.scalar_text()))
    }

    /// Collect every subject record reachable from `root`.
    pub fn scan<'a>(&self, root: NodeRef<'a>) -> Vec<SubjectRecord<'a>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect(root, None, 0, &mut seen, &mut out);
        out
    }

    fn collect<'a>(
        &self,
        node: NodeRef<'a>,
        inherited: Option<&str>,
        depth: usize,
        seen: &mut HashSet<NodeId>,
        out: &mut Vec<SubjectRecord<'a>>,
    ) {
        if depth > self.subject_depth || !node.is_container() || !seen.insert(node.id()) {
            return;
        }

        let own = self.own_identity(node);
        let current = own.as_deref().or(inherited);

        if let Some(id) = current {
            let has_signal = node.entries().any(|(k, _)| TRIGGER_KEYS.contains(&k));
            if has_signal {
                out.push(SubjectRecord::from_node(id, node));
            }
        }

        for child in node.children() {
            self.collect(child, current, depth + 1, seen, out);
        }
    }

    /// The shallowest identity in the tree. See [`find_identity_holder`](Self::find_identity_holder).
    pub fn find_identity(&self, root: NodeRef<'_>) -> Option<String> {
        self.find_identity_holder(root).map(|(id, _)| id)
    }

    /// The shallowest identity in the tree and the object that carries it.
    ///
    /// Breadth-first: every node of one depth is checked before any node
    /// below it, and within a node the identity fields are tried in priority
    /// order. Ties at the same depth go to the node reached first.
    pub fn find_identity_holder<'a>(&self, root: NodeRef<'a>) -> Option<(String, NodeRef<'a>)> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([(root, 0usize)]);

        while let Some((node, depth)) = queue.pop_front() {
            if depth > self.identity_depth || !node.is_container() || !seen.insert(node.id()) {
                continue;
            }
            if let Some(id) = self.own_identity(node) {
                return Some((id, node));
            }
            queue.extend(node.children().into_iter().map(|child| (child, depth + 1)));
        }
        None
    }

    /// Country named by an "Account based in …" sentence anywhere in the tree.
    pub fn find_based_in_phrase(&self, root: NodeRef<'_>) -> Option<CountryCode> {
        let mut seen = HashSet::new();
        self.phrase_in(root, 0, &mut seen)
    }

    fn phrase_in(&self, node: NodeRef<'_>, depth: usize, seen: &mut HashSet<NodeId>) -> Option<CountryCode> {
        if depth > self.based_in_depth || !node.is_container() || !seen.insert(node.id()) {
            return None;
        }
        for child in node.children() {
            let found = match child.as_str() {
                Some(text) => country_from_based_in_phrase(text),
                None => self.phrase_in(child, depth + 1, seen),
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }
}

/// Resolve the country named after "Account based in" in `text`.
///
/// The words following the phrase are tried as a country name, then as a
/// two-letter code; failing both, any country mentioned elsewhere in the text
/// is accepted.
pub fn country_from_based_in_phrase(text: &str) -> Option<CountryCode> {
    let caps = BASED_IN_PHRASE.captures(text)?;
    let tail = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");

    name_to_code(tail)
        .or_else(|| tail.split_whitespace().next().and_then(CountryCode::parse))
        .or_else(|| detect_country_in_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Payload;
    use serde_json::json;

    fn scanner() -> TreeScanner {
        TreeScanner::new(&EngineConfig::default())
    }

    #[test]
    fn nested_evidence_inherits_the_enclosing_identity() {
        let payload = Payload::from_value(&json!({
            "data": {"user": {"result": {
                "rest_id": "42",
                "wrapper": {"verification_info": {"reason": {"description": "x"}}}
            }}}
        }));
        let records = scanner().scan(payload.root());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject_id, "42");
        assert!(records[0].verification_info.is_some());
        assert!(records[0].profile_transparency.is_none());
    }

    #[test]
    fn nodes_without_identity_are_skipped() {
        let payload = Payload::from_value(&json!({"verification_info": {"a": 1}}));
        assert!(scanner().scan(payload.root()).is_empty());
    }

    #[test]
    fn siblings_keep_scanning_after_a_match() {
        let payload = Payload::from_value(&json!({"users": [
            {"rest_id": "1", "profile_transparency": {"countryCode": "DE"}},
            {"rest_id": "2", "affiliates_highlighted_label": {"label": {}}}
        ]}));
        let ids: Vec<_> = scanner()
            .scan(payload.root())
            .into_iter()
            .map(|r| r.subject_id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn self_reference_terminates() {
        let mut payload = Payload::from_value(&json!({
            "rest_id": "7", "verification_info": {"x": 1}
        }));
        let root = payload.root().id();
        assert!(payload.link(root, "self", root));
        let records = scanner().scan(payload.root());
        assert_eq!(records.len(), 1);
        assert!(scanner().find_based_in_phrase(payload.root()).is_none());
        assert_eq!(scanner().find_identity(payload.root()).as_deref(), Some("7"));
    }

    #[test]
    fn depth_cap_stops_the_branch_quietly() {
        let mut deep = json!({"rest_id": "deep", "verification_info": {"x": 1}});
        for _ in 0..40 {
            deep = json!({ "next": deep });
        }
        let payload = Payload::from_value(&deep);
        assert!(scanner().scan(payload.root()).is_empty());
    }

    #[test]
    fn based_in_phrase_accepts_names_and_codes() {
        assert_eq!(country_from_based_in_phrase("Account based in Canada").map(|c| c.as_str()), Some("CA"));
        assert_eq!(country_from_based_in_phrase("account based in: JP.").map(|c| c.as_str()), Some("JP"));
        assert_eq!(country_from_based_in_phrase("Account based in somewhere"), None);
        assert_eq!(country_from_based_in_phrase("Based in France"), None);
    }

    #[test]
    fn identity_search_walks_arrays() {
        let payload = Payload::from_value(&json!({"entries": [{"content": {"user_id": 99}}]}));
        assert_eq!(scanner().find_identity(payload.root()).as_deref(), Some("99"));
    }

    #[test]
    fn shallowest_identity_beats_a_nested_one() {
        let payload = Payload::from_value(&json!({
            "data": {"user": {"result": {
                "legacy": {"pinned": {"id": "999"}},
                "rest_id": "42"
            }}},
            "note": "Account based in Canada"
        }));
        let (id, holder) = scanner().find_identity_holder(payload.root()).expect("identity");
        assert_eq!(id, "42");
        assert!(holder.get("legacy").is_some());
    }

    #[test]
    fn identity_fields_are_tried_in_priority_order_on_one_node() {
        let payload = Payload::from_value(&json!({"user": {"id": "3", "user_id": "2", "rest_id": "1"}}));
        assert_eq!(scanner().find_identity(payload.root()).as_deref(), Some("1"));
    }
}
