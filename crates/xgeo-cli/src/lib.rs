//! xgeo-cli
//! ========
//!
//! Command-line interface for the `xgeo-core` location and VPN inference
//! engine.
//!
//! This crate primarily provides a binary (`xgeo-cli`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview. See the README for full usage examples.
//!
//! Quick start
//! -----------
//!
//! ```text
//! cargo install xgeo-cli
//! xgeo-cli --help
//! xgeo-cli scan captured/about.json
//! xgeo-cli --store entries.json ingest captured/*.json
//! xgeo-cli lookup @someone
//! ```
//!
//! For programmatic access, use the [`xgeo-core`] crate directly.
//!
//! Links
//! -----
//! - Repository: <https://github.com/holg/xgeo-rs>
//! - Core crate: <https://docs.rs/xgeo-core>
//!
#![cfg_attr(docsrs, feature(doc_cfg))]
