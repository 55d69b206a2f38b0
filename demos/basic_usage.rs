//! Basic usage example for xgeo-rs
//!
//! This example demonstrates how to:
//! - Gate responses by URL
//! - Extract observations from a captured payload
//! - Merge them into the entry store
//! - Look up a badge by handle

use serde_json::json;
use xgeo_core::registry::{code_to_flag_emoji, name_to_code};
use xgeo_core::{Badge, EngineConfig, GeoEngine, MemoryStorage, Payload, Result};

fn main() -> Result<()> {
    println!("=== xgeo-rs Basic Usage Example ===\n");

    // Example 1: Country registry
    println!("--- Example 1: Names, codes and flags ---");
    for name in ["Canada", "Côte d'Ivoire", "UAE", "Atlantis"] {
        match name_to_code(name) {
            Some(code) => println!("{name} -> {code} {}", code.flag_emoji()),
            None => println!("{name} -> (unknown) {}", code_to_flag_emoji(name)),
        }
    }
    println!();

    let mut engine = GeoEngine::new(MemoryStorage::new(), EngineConfig::default());

    // Example 2: URL gating
    println!("--- Example 2: Which responses are inspected ---");
    let urls = [
        "https://x.com/i/api/graphql/abc/UserAbout",
        "https://x.com/i/api/1.1/jot/client_event",
    ];
    for url in urls {
        println!("{url}: {}", engine.pipeline().should_inspect(url, None));
    }
    println!();

    // Example 3: Ingest a profile response
    println!("--- Example 3: Ingest a profile response ---");
    let payload = Payload::from_value(&json!({"data": {"user": {"result": {
        "rest_id": "1001",
        "core": {"screen_name": "Maple"},
        "about_profile": {"account_based_in": "Canada", "location_accurate": true},
        "affiliates_highlighted_label": {"label": {"countryCode": "US"}}
    }}}}));
    for outcome in engine.ingest(&payload, urls[0], None) {
        let entry = &outcome.entry;
        println!(
            "subject {} (@{}) confidence={} changed={}",
            entry.subject_id,
            entry.handle.as_deref().unwrap_or("-"),
            entry.confidence.as_str(),
            outcome.changed
        );
    }
    println!();

    // Example 4: Badge lookup
    println!("--- Example 4: Badge for @maple ---");
    if let Some(entry) = engine.store().lookup_by_handle("@maple") {
        let badge = Badge::from_entry(entry);
        println!("Label: {}", badge.label);
        println!("Tooltip:\n{}", badge.tooltip());
    }
    println!();

    // Example 5: Stored form
    println!("--- Example 5: Stored entry ---");
    for entry in engine.store().iter() {
        println!("{}", serde_json::to_string_pretty(entry)?);
    }

    Ok(())
}
