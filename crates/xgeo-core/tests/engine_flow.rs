use serde_json::json;
use xgeo_core::{
    Badge, BadgeState, Confidence, EngineConfig, FileStorage, GeoEngine, MemoryStorage,
    Payload, PresentationTarget,
};

const URL: &str = "https://x.com/i/api/graphql/abc/HomeTimeline";

fn timeline() -> serde_json::Value {
    json!({"data": {"home": {"timeline": {"instructions": [{"entries": [
        {"content": {"item": {"user_results": {"result": {
            "rest_id": "100",
            "core": {"screen_name": "Maple"},
            "about_profile": {"account_based_in": "Canada", "source": "Canada App Store"},
            "affiliates_highlighted_label": {"label": {"countryCode": "CA"}}
        }}}}},
        {"content": {"item": {"user_results": {"result": {
            "rest_id": "200",
            "core": {"screen_name": "Tunnel"},
            "about_profile": {
                "account_based_in": "Germany",
                "location_accurate": false
            },
            "profile_transparency": {}
        }}}}},
        {"content": {"item": {"user_results": {"result": {
            "rest_id": "300",
            "core": {"screen_name": "Quiet"},
            "verification_info": {"is_identity_verified": false}
        }}}}}
    ]}]}}}})
}

struct Link {
    href: String,
    badge: Option<Badge>,
}

impl Link {
    fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            badge: None,
        }
    }
}

impl PresentationTarget for Link {
    fn link_href(&self) -> Option<&str> {
        Some(&self.href)
    }
    fn text(&self) -> &str {
        ""
    }
    fn applied_badge(&self) -> Option<&BadgeState> {
        self.badge.as_ref().map(|b| &b.state)
    }
    fn attach_badge(&mut self, badge: Badge) {
        self.badge = Some(badge);
    }
    fn remove_badge(&mut self) {
        self.badge = None;
    }
}

#[test]
fn timeline_payload_yields_one_entry_per_located_subject() {
    let mut engine = GeoEngine::new(MemoryStorage::new(), EngineConfig::default());
    let outcomes = engine.ingest(&Payload::from_value(&timeline()), URL, None);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(engine.store().len(), 2);

    let maple = engine.store().lookup_by_handle("@maple").expect("maple");
    assert_eq!(maple.confidence, Confidence::High);
    assert!(!maple.is_vpn);

    let tunnel = engine.store().lookup_by_handle("TUNNEL").expect("tunnel");
    assert!(tunnel.is_vpn);
    assert_eq!(Badge::from_entry(tunnel).label, "🇩🇪 VPN");

    assert!(engine.store().get("300").is_none());
}

#[test]
fn irrelevant_urls_are_ignored() {
    let mut engine = GeoEngine::new(MemoryStorage::new(), EngineConfig::default());
    let outcomes = engine.ingest(
        &Payload::from_value(&timeline()),
        "https://x.com/i/api/1.1/jot/client_event",
        None,
    );
    assert!(outcomes.is_empty());
    assert!(!engine.scheduler().is_pending());
}

#[test]
fn render_runs_once_per_batch_of_changes() {
    let mut engine = GeoEngine::new(MemoryStorage::new(), EngineConfig::default());
    let mut links = vec![Link::new("/maple"), Link::new("https://x.com/Tunnel/status/1")];

    assert!(engine.render(&mut links).is_none());

    engine.ingest(&Payload::from_value(&timeline()), URL, None);
    engine.notify_view_changed();
    let report = engine.render(&mut links).expect("pending pass");
    assert_eq!(report.attached, 2);
    assert!(engine.render(&mut links).is_none());

    // Same payload again: nothing visible changes, so no pass is requested.
    let outcomes = engine.ingest(&Payload::from_value(&timeline()), URL, None);
    assert!(outcomes.iter().all(|o| !o.changed));
    assert!(engine.render(&mut links).is_none());

    engine.clear().expect("clear");
    let report = engine.render(&mut links).expect("pass after clear");
    assert_eq!(report.removed, 2);
    assert!(links.iter().all(|l| l.badge.is_none()));
}

#[test]
fn file_store_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("entries.json");

    {
        let mut engine =
            GeoEngine::restore(FileStorage::new(&path), EngineConfig::default()).expect("restore");
        assert!(engine.store().is_empty());
        engine.ingest(&Payload::from_value(&timeline()), URL, None);
    }

    let engine =
        GeoEngine::restore(FileStorage::new(&path), EngineConfig::default()).expect("restore");
    assert_eq!(engine.store().len(), 2);
    assert!(engine.scheduler().is_pending());
    let tunnel = engine.store().lookup_by_handle("tunnel").expect("tunnel");
    assert!(tunnel.is_vpn);
    assert_eq!(tunnel.location.country().map(|c| c.as_str()), Some("DE"));
}

#[test]
fn clear_leaves_foreign_keys_alone() {
    let mut storage = MemoryStorage::new();
    storage.insert("settings:theme", json!("dark"));
    storage.insert(
        "geo:42",
        json!({"subjectId": "42", "handle": "old", "regionName": "Europe", "isVPN": true}),
    );

    let mut engine = GeoEngine::restore(storage, EngineConfig::default()).expect("restore");
    assert_eq!(engine.store().len(), 1);
    assert_eq!(engine.clear().expect("clear"), 1);
    assert!(engine.store().is_empty());
    assert!(engine.store().storage().get("settings:theme").is_some());
    assert!(engine.store().storage().get("geo:42").is_none());
}
