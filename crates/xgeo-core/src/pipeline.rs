// crates/xgeo-core/src/pipeline.rs

//! # Signal Extraction Pipeline
//!
//! One call per intercepted response:
//!
//! 1. **Gate** on the source URL / request body ([`SignalPipeline::should_inspect`]).
//! 2. **Shortcut**: an "Account based in …" sentence anywhere in the payload,
//!    paired with any identity in the payload, yields a single observation.
//! 3. Otherwise **scan** for subject records, drop those without a based-in
//!    text, then resolve, correlate and classify each one.
//!
//! Nothing here fails. A payload that does not fit the expected shape simply
//! produces no observations.

use crate::config::EngineConfig;
use crate::correlator::correlate;
use crate::model::{Confidence, Evidence, GeoObservation, Location, SignalType};
use crate::resolver::{BasedInField, LocationResolver};
use crate::scanner::{SubjectRecord, TreeScanner};
use crate::schema::HANDLE_PATHS;
use crate::tree::{NodeRef, Payload};
use crate::vpn;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SignalPipeline {
    target_operations: Vec<String>,
    endpoint_markers: Vec<String>,
    scanner: TreeScanner,
    resolver: LocationResolver,
}

impl SignalPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            target_operations: config.target_operations.clone(),
            endpoint_markers: config.endpoint_markers.clone(),
            scanner: TreeScanner::new(config),
            resolver: LocationResolver::new(config),
        }
    }

    /// True when the response is worth scanning: the URL or request body
    /// names a relevant operation, or the URL is the generic query endpoint.
    pub fn should_inspect(&self, url: &str, request: Option<&str>) -> bool {
        let names_operation = |text: &str| self.target_operations.iter().any(|op| text.contains(op.as_str()));
        names_operation(url)
            || request.is_some_and(names_operation)
            || self.endpoint_markers.iter().any(|m| url.contains(m.as_str()))
    }

    /// Gate, then extract.
    pub fn process(&self, payload: &Payload, url: &str, request: Option<&str>) -> Vec<GeoObservation> {
        if !self.should_inspect(url, request) {
            debug!(url, "skipping irrelevant response");
            return Vec::new();
        }
        self.extract(payload)
    }

    /// Like [`process`](Self::process), for a raw response body.
    pub fn process_text(&self, body: &str, url: &str, request: Option<&str>) -> Vec<GeoObservation> {
        if !self.should_inspect(url, request) {
            debug!(url, "skipping irrelevant response");
            return Vec::new();
        }
        match Payload::parse(body) {
            Ok(payload) => self.extract(&payload),
            Err(err) => {
                debug!(url, error = %err, "response body is not JSON");
                Vec::new()
            }
        }
    }

    /// Every observation the payload supports, without the URL gate.
    pub fn extract(&self, payload: &Payload) -> Vec<GeoObservation> {
        let root = payload.root();

        if let Some(observation) = self.shortcut(root) {
            return vec![observation];
        }

        let records = self.scanner.scan(root);
        let total = records.len();
        let observations: Vec<_> = records.iter().filter_map(|r| self.observe(r)).collect();
        debug!(records = total, observations = observations.len(), "payload scanned");
        observations
    }

    fn shortcut(&self, root: NodeRef<'_>) -> Option<GeoObservation> {
        let code = self.scanner.find_based_in_phrase(root)?;
        let Some((subject_id, holder)) = self.scanner.find_identity_holder(root) else {
            debug!(country = %code, "based-in phrase without an identity");
            return None;
        };

        let record = SubjectRecord::from_node(subject_id, root);
        let mut observation = GeoObservation::new(record.subject_id.clone(), Location::Country(code))
            .with_confidence(Confidence::Partial)
            .with_vpn(vpn::classify(&record));
        // The handle sits beside the identity that won, not at the top.
        observation.handle = handle_of(holder).or_else(|| handle_of(root));
        observation.signals.based_in = Some(code);
        observation.meta = evidence(&record);
        Some(observation)
    }

    /// One record to at most one observation.
    pub fn observe(&self, record: &SubjectRecord<'_>) -> Option<GeoObservation> {
        if BasedInField::of(record).text().is_none() {
            debug!(subject = %record.subject_id, "no based-in text yet, record dropped");
            return None;
        }

        let Some(location) = self.resolver.resolve(record).location else {
            debug!(subject = %record.subject_id, "record resolved to no location");
            return None;
        };
        let correlation = correlate(record, Some(&location));

        Some(GeoObservation {
            subject_id: record.subject_id.clone(),
            handle: handle_of(record.source_node),
            location,
            signal_type: deduce_signal_type(record),
            confidence: correlation.confidence,
            signals: correlation.signals,
            is_vpn: Some(vpn::classify(record)),
            meta: evidence(record),
        })
    }
}

/// Which sub-structure the evidence came from:
/// transparency, then affiliates, then verification.
pub fn deduce_signal_type(record: &SubjectRecord<'_>) -> SignalType {
    if record.profile_transparency.is_some() {
        SignalType::ProfileTransparency
    } else if record.affiliates_label.is_some() {
        SignalType::AffiliatesLabel
    } else if record.verification_info.is_some() {
        SignalType::VerificationInfo
    } else {
        SignalType::Unknown
    }
}

fn handle_of(node: NodeRef<'_>) -> Option<String> {
    HANDLE_PATHS
        .iter()
        .filter_map(|path| node.str_at(path))
        .find(|h| !h.is_empty())
        .map(str::to_string)
}

fn evidence(record: &SubjectRecord<'_>) -> Evidence {
    Evidence {
        verification_info: record.verification_info.map(|n| n.to_value()),
        profile_transparency: record.profile_transparency.map(|n| n.to_value()),
        affiliates_label: record.affiliates_label.map(|n| n.to_value()),
        about_profile: record.profile().map(|n| n.to_value()),
    }
}
