//! Runs the extraction strategies in order and produces a single identity.

use crate::extractors::{default_extractors, DetectionContext, Extraction, Extractor};
use goforcab_common::models::UserId;
use serde::Serialize;
use tracing::{debug, warn};

/// What the detector saw during one pass, forwarded to the host as a
/// `debug` message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    pub auth_client_available: bool,
    pub storage_keys: Vec<String>,
    pub matched_strategy: Option<String>,
    pub errors: Vec<String>,
    pub user_id: String,
}

/// Outcome of one detection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub user_id: UserId,
    pub snapshot: DiagnosticSnapshot,
}

pub struct IdentityDetector {
    extractors: Vec<Box<dyn Extractor>>,
}

impl IdentityDetector {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Detector with the standard strategy order
    pub fn with_storage_patterns(storage_key_patterns: Vec<String>) -> Self {
        Self::new(default_extractors(storage_key_patterns))
    }

    /// Run every strategy until one finds a user; fall back to guest.
    ///
    /// A strategy that errors is recorded in the snapshot and treated as not
    /// found.
    pub fn detect(&self, ctx: &DetectionContext<'_>) -> Detection {
        let mut snapshot = DiagnosticSnapshot {
            auth_client_available: ctx.surface.auth_client_available(),
            storage_keys: ctx
                .surface
                .storage_entries()
                .map(|entries| entries.into_iter().map(|(key, _)| key).collect())
                .unwrap_or_default(),
            ..DiagnosticSnapshot::default()
        };

        let mut user_id = UserId::guest();
        for extractor in &self.extractors {
            match extractor.extract(ctx) {
                Ok(Extraction::Found(uid)) if !uid.trim().is_empty() => {
                    debug!("Identity found by {}", extractor.name());
                    snapshot.matched_strategy = Some(extractor.name().to_string());
                    user_id = UserId::new(uid);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Identity strategy {} failed: {}", extractor.name(), e);
                    snapshot.errors.push(format!("{}: {}", extractor.name(), e));
                }
            }
        }

        snapshot.user_id = user_id.to_string();
        Detection { user_id, snapshot }
    }
}

/// Lets a value through only when it differs from the last one let through
#[derive(Debug, Default)]
pub struct ChangeGate {
    last: Option<UserId>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, candidate: UserId) -> Option<UserId> {
        if self.last.as_ref() == Some(&candidate) {
            return None;
        }
        self.last = Some(candidate.clone());
        Some(candidate)
    }

    pub fn last(&self) -> Option<&UserId> {
        self.last.as_ref()
    }
}
