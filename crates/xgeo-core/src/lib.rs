// crates/xgeo-core/src/lib.rs

//! Location and VPN inference over untyped social-media API responses.
//!
//! Payloads go in through [`SignalPipeline`], come out as
//! [`GeoObservation`]s, are merged into [`GeoEntry`]s by [`EntryStore`] and
//! shown through [`RenderReconciler`]. [`GeoEngine`] wires all of it together.

pub mod config;
pub mod correlator;
pub mod engine;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod registry; // Static country tables
pub mod resolver;
pub mod scanner;
pub mod schema; // Field names of the response shape
pub mod storage;
pub mod store;
pub mod text;
pub mod tree;
pub mod vpn;

// Re-exports
pub use crate::error::{Result, XGeoError};
pub use config::EngineConfig;
pub use engine::GeoEngine;
pub use model::{Confidence, Evidence, GeoEntry, GeoObservation, Location, SignalType, Signals};
pub use pipeline::SignalPipeline;
pub use reconcile::{Badge, BadgeState, PresentationTarget, ReconcileReport, RenderReconciler, RenderScheduler};
pub use registry::CountryCode;
pub use resolver::{LocationResolver, Resolution, ResolutionRule};
pub use scanner::{SubjectRecord, TreeScanner};
pub use storage::{EntryStorage, MemoryStorage};
#[cfg(feature = "json")]
pub use storage::FileStorage;
pub use store::{EntryStore, MergeOutcome};
pub use tree::{Node, NodeId, NodeRef, Payload};
