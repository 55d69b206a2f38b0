//! xgeo-wasm: WebAssembly bindings for xgeo-core
//!
//! The browser extension keeps the parts that need a browser: intercepting
//! responses, `chrome.storage`, and drawing badges. Everything in between
//! runs here, behind one [`GeoSession`].
//!
//! What it provides
//! ----------------
//! - `restore(items)`: seed the cache from a `chrome.storage.local.get(null)` dump
//! - `ingest(body, url, request)`: run a response through the engine; returns
//!   the `{ key, value }` pairs the caller should write back to storage
//! - `badge_for_handle(handle)`: badge descriptor (label, tooltip lines,
//!   country, region, VPN flag, confidence) or `null`
//! - `request_render()` / `take_render()`: the coalescing render flag
//! - `clear()`: drop all entries; returns the storage keys to remove
//!
//! Quick start (browser)
//! ---------------------
//! ```javascript
//! import init, { GeoSession } from 'xgeo-wasm';
//!
//! await init();
//! const session = new GeoSession();
//! session.restore(await chrome.storage.local.get(null));
//!
//! for (const { key, value } of session.ingest(text, url, requestBody)) {
//!   chrome.storage.local.set({ [key]: value });
//! }
//! requestAnimationFrame(() => {
//!   if (session.take_render()) redrawBadges(session);
//! });
//! ```
//!
//! Notes
//! -----
//! - Values cross the boundary as plain JSON-compatible objects, never `Map`s.
//! - Invalid config JSON is the only constructor error.

use serde::Serialize;
use serde_json::Value;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use xgeo_core::{
    Badge, EngineConfig, GeoEngine, GeoEntry, MemoryStorage, MergeOutcome, XGeoError,
};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    log("xgeo-wasm ready");
}

fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn js_error(err: XGeoError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One `chrome.storage.local.set` the caller owes.
#[derive(Serialize)]
struct PersistRequest {
    key: String,
    value: GeoEntry,
}

/// The engine plus its in-memory cache, owned by one page.
#[wasm_bindgen]
pub struct GeoSession {
    engine: GeoEngine<MemoryStorage>,
}

impl GeoSession {
    fn persist_requests(&self, outcomes: Vec<MergeOutcome>) -> Result<JsValue, JsValue> {
        let requests: Vec<PersistRequest> = outcomes
            .into_iter()
            .map(|outcome| PersistRequest {
                key: self.engine.config().storage_key(&outcome.entry.subject_id),
                value: outcome.entry,
            })
            .collect();
        to_js(&requests)
    }
}

#[wasm_bindgen]
impl GeoSession {
    /// Create a session; `config_json` overrides any [`EngineConfig`] field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GeoSession, JsValue> {
        let config = match config_json {
            Some(text) => EngineConfig::from_json(&text).map_err(js_error)?,
            None => EngineConfig::default(),
        };
        Ok(GeoSession {
            engine: GeoEngine::new(MemoryStorage::new(), config),
        })
    }

    /// Replace the cache with the entries found in a storage dump. Keys
    /// outside the entry prefix and malformed entries are skipped. Returns the
    /// number of entries loaded.
    pub fn restore(&mut self, items: &js_sys::Object) -> Result<usize, JsValue> {
        let mut storage = MemoryStorage::new();
        for pair in js_sys::Object::entries(items).iter() {
            let pair = js_sys::Array::from(&pair);
            let Some(key) = pair.get(0).as_string() else {
                continue;
            };
            if let Ok(value) = serde_wasm_bindgen::from_value::<Value>(pair.get(1)) {
                storage.insert(key, value);
            }
        }

        let config = self.engine.config().clone();
        self.engine = GeoEngine::restore(storage, config).map_err(js_error)?;
        let restored = self.engine.store().len();
        log(&format!("xgeo: restored {restored} entries"));
        Ok(restored)
    }

    pub fn should_inspect(&self, url: &str, request: Option<String>) -> bool {
        self.engine.pipeline().should_inspect(url, request.as_deref())
    }

    /// Process one response body. Returns an array of `{ key, value }`
    /// persist requests, one per merged entry.
    pub fn ingest(&mut self, body: &str, url: &str, request: Option<String>) -> Result<JsValue, JsValue> {
        let outcomes = self.engine.ingest_text(body, url, request.as_deref());
        self.persist_requests(outcomes)
    }

    /// Badge descriptor for a handle, or `null`.
    pub fn badge_for_handle(&self, handle: &str) -> Result<JsValue, JsValue> {
        match self.engine.store().lookup_by_handle(handle) {
            Some(entry) => to_js(&Badge::from_entry(entry)),
            None => Ok(JsValue::NULL),
        }
    }

    /// The stored entry for a handle, or `null`.
    pub fn entry_for_handle(&self, handle: &str) -> Result<JsValue, JsValue> {
        match self.engine.store().lookup_by_handle(handle) {
            Some(entry) => to_js(entry),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.engine.store().len()
    }

    /// The view changed; a redraw is due on the next frame.
    pub fn request_render(&self) {
        self.engine.notify_view_changed();
    }

    /// `true` exactly once per batch of render requests.
    pub fn take_render(&self) -> bool {
        self.engine.scheduler().run_pending(|| ()).is_some()
    }

    /// Drop every entry. Returns the storage keys the caller should remove.
    pub fn clear(&mut self) -> Result<JsValue, JsValue> {
        let mut keys: Vec<String> = self
            .engine
            .store()
            .iter()
            .map(|entry| self.engine.config().storage_key(&entry.subject_id))
            .collect();
        keys.sort();
        let removed = self.engine.clear().map_err(js_error)?;
        log(&format!("xgeo: cleared {removed} entries"));
        to_js(&keys)
    }
}
