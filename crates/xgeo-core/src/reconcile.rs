// crates/xgeo-core/src/reconcile.rs

//! # Render Reconciler
//!
//! Keeps the badges on a live view in line with the [`EntryStore`] while
//! touching as little as possible. Each [`PresentationTarget`] is one
//! username occurrence; the reconciler works out its handle, looks up the
//! entry and compares the wanted [`BadgeState`] with what is already shown:
//!
//! | entry | badge shown       | action            |
//! |-------|-------------------|-------------------|
//! | no    | no                | nothing           |
//! | no    | yes               | remove            |
//! | yes   | same state        | nothing           |
//! | yes   | different state   | remove + attach   |
//! | yes   | no                | attach            |
//!
//! Passes are coalesced by a [`RenderScheduler`]: any number of
//! [`request`](RenderScheduler::request)s between two ticks lead to one pass.

use crate::model::{Confidence, GeoEntry};
use crate::registry::CountryCode;
use crate::storage::EntryStorage;
use crate::store::EntryStore;
use crate::text::normalize_handle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

static DEFAULT_ORIGIN: Lazy<Url> =
    Lazy::new(|| Url::parse("https://x.com/").expect("valid origin url"));

static AT_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]{1,15})").expect("valid regex"));

/// Path segment that never names an account (`/i/...` routes).
const RESERVED_SEGMENT: &str = "i";

const GLOBE: &str = "\u{1F310}";

/// The parts of an entry a badge depends on. Two equal states render the
/// same badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeState {
    pub country_code: Option<CountryCode>,
    pub region_name: Option<String>,
    #[serde(rename = "isVPN")]
    pub is_vpn: bool,
    pub confidence: Confidence,
}

impl From<&GeoEntry> for BadgeState {
    fn from(entry: &GeoEntry) -> Self {
        Self {
            country_code: entry.location.country(),
            region_name: entry.location.region().map(str::to_string),
            is_vpn: entry.is_vpn,
            confidence: entry.confidence,
        }
    }
}

/// Everything the rendering collaborator needs to draw one badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(flatten)]
    pub state: BadgeState,
    /// Short visible text: a flag, "VPN", or a globe and region label.
    pub label: String,
    pub tooltip_lines: Vec<String>,
}

impl Badge {
    pub fn from_entry(entry: &GeoEntry) -> Self {
        let state = BadgeState::from(entry);

        let label = match (state.country_code, state.region_name.as_deref(), state.is_vpn) {
            (Some(code), _, true) => format!("{} VPN", code.flag_emoji()),
            (None, _, true) => "VPN".to_string(),
            (None, Some(region), false) => format!("{GLOBE} {region}"),
            (Some(code), _, false) => code.flag_emoji(),
            (None, None, false) => crate::registry::PLACEHOLDER_FLAG.to_string(),
        };

        let mut tooltip_lines = Vec::new();
        let based_in = match state.country_code {
            Some(code) => Some(code.display_name().to_string()),
            None => entry
                .signals
                .based_in
                .map(|code| code.display_name().to_string())
                .or_else(|| entry.signals.about_based_in.clone())
                .or_else(|| state.region_name.clone()),
        };
        if let Some(name) = based_in {
            tooltip_lines.push(format!("Account based in {name}"));
        }
        let connected_via = entry.signals.connected_via;
        if let Some(code) = connected_via {
            tooltip_lines.push(format!("Connected via {code}"));
        }
        if state.is_vpn {
            tooltip_lines.push("VPN/Proxy detected".to_string());
        }
        if state.confidence == Confidence::Mismatch && connected_via.is_some() {
            tooltip_lines.push("\u{26A0}\u{FE0F} Country mismatch detected".to_string());
        }

        Self {
            state,
            label,
            tooltip_lines,
        }
    }

    pub fn tooltip(&self) -> String {
        self.tooltip_lines.join("\n")
    }
}

/// One username occurrence in the view, with a slot for at most one badge.
pub trait PresentationTarget {
    /// `href` of the link around or inside the username, if any.
    fn link_href(&self) -> Option<&str>;

    /// Visible text of the username node.
    fn text(&self) -> &str;

    /// State of the badge currently shown, if any.
    fn applied_badge(&self) -> Option<&BadgeState>;

    fn attach_badge(&mut self, badge: Badge);

    fn remove_badge(&mut self);
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub attached: usize,
    pub replaced: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl ReconcileReport {
    /// Number of badge writes the pass performed.
    pub fn mutations(&self) -> usize {
        self.attached + self.replaced + self.removed
    }
}

#[derive(Debug, Clone)]
pub struct RenderReconciler {
    origin: Url,
}

impl Default for RenderReconciler {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.clone(),
        }
    }
}

impl RenderReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative links against `origin` instead of `https://x.com/`.
    pub fn with_origin(origin: Url) -> Self {
        Self { origin }
    }

    /// Handle shown by a target: the first path segment of its link, else an
    /// `@handle` in its text. Not normalized.
    pub fn derive_handle<T: PresentationTarget + ?Sized>(&self, target: &T) -> Option<String> {
        target
            .link_href()
            .and_then(|href| self.handle_from_href(href))
            .or_else(|| handle_from_text(target.text()))
    }

    fn handle_from_href(&self, href: &str) -> Option<String> {
        let url = self.origin.join(href).ok()?;
        let first = url.path().trim_start_matches('/').split('/').next()?;
        (!first.is_empty() && first != RESERVED_SEGMENT).then(|| first.to_string())
    }

    pub fn reconcile<S, T>(&self, store: &EntryStore<S>, targets: &mut [T]) -> ReconcileReport
    where
        S: EntryStorage,
        T: PresentationTarget,
    {
        let mut report = ReconcileReport::default();

        for target in targets.iter_mut() {
            let entry = self
                .derive_handle(&*target)
                .and_then(|handle| normalize_handle(&handle))
                .and_then(|handle| store.lookup_by_handle(&handle));
            let shown = target.applied_badge().cloned();

            match (entry, shown) {
                (None, None) => report.unchanged += 1,
                (None, Some(_)) => {
                    target.remove_badge();
                    report.removed += 1;
                }
                (Some(entry), Some(shown)) if shown == BadgeState::from(entry) => {
                    report.unchanged += 1;
                }
                (Some(entry), Some(_)) => {
                    target.remove_badge();
                    target.attach_badge(Badge::from_entry(entry));
                    report.replaced += 1;
                }
                (Some(entry), None) => {
                    target.attach_badge(Badge::from_entry(entry));
                    report.attached += 1;
                }
            }
        }

        report
    }
}

fn handle_from_text(text: &str) -> Option<String> {
    AT_HANDLE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Single-slot coalescing flag for reconciliation passes.
///
/// [`request`](Self::request) raises the flag; the host's next tick calls
/// [`run_pending`](Self::run_pending), which lowers it and runs the pass
/// once, however many requests came in.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: AtomicBool,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this call raised the flag, `false` if a pass was
    /// already pending.
    pub fn request(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Run `pass` if a pass is pending.
    pub fn run_pending<R>(&self, pass: impl FnOnce() -> R) -> Option<R> {
        self.pending
            .swap(false, Ordering::AcqRel)
            .then(pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::{GeoObservation, Location};
    use crate::storage::MemoryStorage;

    #[derive(Debug, Default)]
    struct Slot {
        href: Option<String>,
        text: String,
        badge: Option<Badge>,
        writes: usize,
    }

    impl Slot {
        fn link(href: &str) -> Self {
            Self {
                href: Some(href.to_string()),
                ..Self::default()
            }
        }
    }

    impl PresentationTarget for Slot {
        fn link_href(&self) -> Option<&str> {
            self.href.as_deref()
        }
        fn text(&self) -> &str {
            &self.text
        }
        fn applied_badge(&self) -> Option<&BadgeState> {
            self.badge.as_ref().map(|b| &b.state)
        }
        fn attach_badge(&mut self, badge: Badge) {
            self.badge = Some(badge);
            self.writes += 1;
        }
        fn remove_badge(&mut self) {
            self.badge = None;
            self.writes += 1;
        }
    }

    fn country(c: &str) -> Location {
        Location::Country(CountryCode::parse(c).expect("valid code"))
    }

    fn store_with(observations: Vec<GeoObservation>) -> EntryStore<MemoryStorage> {
        let mut store = EntryStore::new(MemoryStorage::new(), &EngineConfig::default());
        for obs in observations {
            store.merge(obs);
        }
        store
    }

    #[test]
    fn handles_come_from_links_then_text() {
        let r = RenderReconciler::new();
        assert_eq!(r.derive_handle(&Slot::link("/Jack")).as_deref(), Some("Jack"));
        assert_eq!(
            r.derive_handle(&Slot::link("https://x.com/jack/status/1")).as_deref(),
            Some("jack")
        );
        assert_eq!(r.derive_handle(&Slot::link("/i/flow/login")), None);

        let text_only = Slot {
            text: "Jane Doe @jane_doe · 2h".into(),
            ..Slot::default()
        };
        assert_eq!(r.derive_handle(&text_only).as_deref(), Some("jane_doe"));

        let reserved_link = Slot {
            href: Some("/i/lists".into()),
            text: "@fallback".into(),
            ..Slot::default()
        };
        assert_eq!(r.derive_handle(&reserved_link).as_deref(), Some("fallback"));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let store = store_with(vec![
            GeoObservation::new("1", country("CA")).with_handle("maple"),
        ]);
        let mut targets = vec![Slot::link("/maple"), Slot::link("/nobody")];
        let r = RenderReconciler::new();

        let first = r.reconcile(&store, &mut targets);
        assert_eq!(first.attached, 1);
        assert_eq!(first.unchanged, 1);

        let second = r.reconcile(&store, &mut targets);
        assert_eq!(second.mutations(), 0);
        assert_eq!(targets[0].writes, 1);
    }

    #[test]
    fn stale_badges_are_replaced_and_orphans_removed() {
        let mut store = store_with(vec![
            GeoObservation::new("1", country("CA")).with_handle("maple"),
        ]);
        let mut targets = vec![Slot::link("/maple")];
        let r = RenderReconciler::new();
        r.reconcile(&store, &mut targets);

        store.merge(GeoObservation::new("1", country("CA")).with_vpn(true));
        let report = r.reconcile(&store, &mut targets);
        assert_eq!(report.replaced, 1);
        assert!(targets[0].applied_badge().is_some_and(|b| b.is_vpn));

        store.clear_all().expect("clear");
        let report = r.reconcile(&store, &mut targets);
        assert_eq!(report.removed, 1);
        assert!(targets[0].applied_badge().is_none());
    }

    #[test]
    fn badge_labels_and_tooltips() {
        let store = store_with(vec![
            GeoObservation::new("1", country("US")).with_handle("a").with_vpn(true),
            GeoObservation::new("2", Location::Region("Europe".into())).with_handle("b"),
        ]);
        let vpn = Badge::from_entry(store.get("1").expect("entry"));
        assert_eq!(vpn.label, "\u{1F1FA}\u{1F1F8} VPN");
        assert_eq!(
            vpn.tooltip_lines,
            vec!["Account based in United States", "VPN/Proxy detected"]
        );

        let region = Badge::from_entry(store.get("2").expect("entry"));
        assert_eq!(region.label, "\u{1F310} Europe");
        assert_eq!(region.tooltip(), "Account based in Europe");
    }

    #[test]
    fn mismatch_warning_needs_a_connected_country() {
        let mut obs = GeoObservation::new("1", country("US"))
            .with_handle("m")
            .with_confidence(Confidence::Mismatch);
        obs.signals.connected_via = CountryCode::parse("CA");
        let store = store_with(vec![obs]);
        let badge = Badge::from_entry(store.get("1").expect("entry"));
        assert_eq!(badge.tooltip_lines.len(), 3);
        assert_eq!(badge.tooltip_lines[1], "Connected via CA");
    }

    #[test]
    fn scheduler_coalesces_requests() {
        let scheduler = RenderScheduler::new();
        assert!(scheduler.request());
        assert!(!scheduler.request());
        assert!(!scheduler.request());

        let mut passes = 0;
        assert_eq!(scheduler.run_pending(|| passes += 1), Some(()));
        assert_eq!(scheduler.run_pending(|| passes += 1), None);
        assert_eq!(passes, 1);
        assert!(!scheduler.is_pending());
    }
}
