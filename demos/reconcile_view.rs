//! Reconciling a view against the entry store
//!
//! A "view" here is a list of author links, standing in for the rendered
//! page. The example shows:
//! - Implementing `PresentationTarget` for your own element type
//! - Coalesced render requests
//! - Badges replaced when an entry changes, removed when it disappears

use serde_json::json;
use xgeo_core::{
    Badge, BadgeState, EngineConfig, GeoEngine, MemoryStorage, Payload, PresentationTarget,
    Result,
};

const URL: &str = "https://x.com/i/api/graphql/abc/UserByScreenName";

#[derive(Debug)]
struct AuthorLink {
    href: String,
    text: String,
    badge: Option<Badge>,
}

impl AuthorLink {
    fn new(href: &str, text: &str) -> Self {
        Self {
            href: href.to_string(),
            text: text.to_string(),
            badge: None,
        }
    }
}

impl PresentationTarget for AuthorLink {
    fn link_href(&self) -> Option<&str> {
        Some(&self.href)
    }

    fn text(&self) -> &str {
        &self.text
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

fn profile(id: &str, handle: &str, based_in: &str, accurate: bool) -> Payload {
    Payload::from_value(&json!({"data": {"user": {"result": {
        "rest_id": id,
        "core": {"screen_name": handle},
        "about_profile": {"account_based_in": based_in, "location_accurate": accurate},
        "profile_transparency": {}
    }}}}))
}

fn show(view: &[AuthorLink]) {
    for link in view {
        let label = link.badge.as_ref().map(|b| b.label.as_str()).unwrap_or("");
        println!("  {:<28} {}", link.href, label);
    }
}

fn main() -> Result<()> {
    println!("=== xgeo-rs Reconcile Example ===\n");

    let mut engine = GeoEngine::new(MemoryStorage::new(), EngineConfig::default());
    let mut view = vec![
        AuthorLink::new("/maple", "Maple"),
        AuthorLink::new("/fjord/status/7", "Fjord"),
        AuthorLink::new("/i/web/status/9", "reply from @maple"),
    ];

    println!("--- Step 1: Two profiles arrive ---");
    engine.ingest(&profile("1", "maple", "Canada", true), URL, None);
    engine.ingest(&profile("2", "fjord", "Europe", true), URL, None);
    engine.notify_view_changed();
    if let Some(report) = engine.render(&mut view) {
        println!("{report:?}");
    }
    show(&view);
    println!();

    println!("--- Step 2: Nothing new, no pass runs ---");
    println!("pass ran: {}", engine.render(&mut view).is_some());
    println!();

    println!("--- Step 3: Maple's location is no longer accurate ---");
    engine.ingest(&profile("1", "maple", "Canada", false), URL, None);
    if let Some(report) = engine.render(&mut view) {
        println!("{report:?}");
    }
    show(&view);
    println!();

    println!("--- Step 4: Clear the store ---");
    let removed = engine.clear()?;
    println!("cleared {removed} entries");
    if let Some(report) = engine.render(&mut view) {
        println!("{report:?}");
    }
    show(&view);

    Ok(())
}
