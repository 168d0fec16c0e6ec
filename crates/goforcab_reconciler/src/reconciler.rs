//! Device token reconciliation.
//!
//! Keeps exactly one remote record per push token and keeps its `user_id`
//! in step with the identity the web surface reports. Store failures are
//! logged and dropped; the next identity change tries again.

use crate::session::{ReconcilerState, SessionState};
use goforcab_common::models::{DeviceTokenRecord, Platform, UserId};
use goforcab_db::{DeviceTokenFields, DeviceTokenRepository, WriteOptions};
use tracing::{debug, error, info, warn};

/// Why an upsert was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertTrigger {
    /// First upsert after the push token arrives
    Initial,
    /// The reported identity changed
    IdentityChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Already reconciled and not an identity change
    Skipped,
    /// Record found with the same user; nothing written
    Unchanged { record_id: String },
    /// Record found and re-associated with the new user
    Updated { record_id: String },
    Created { record_id: String },
    /// The store failed; logged, not retried
    Failed,
}

impl UpsertOutcome {
    pub fn wrote(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::Created { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTokenOutcome {
    /// A token is already held for this process
    AlreadyHeld,
    Empty,
    Upserted(UpsertOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    /// The sentinel or an empty id; never overrides the current identity
    Ignored,
    /// Same as the current identity
    Duplicate,
    /// Recorded, but no push token is held yet
    Deferred,
    Upserted(UpsertOutcome),
}

pub struct Reconciler<R> {
    store: R,
    platform: Platform,
    session: SessionState,
}

impl<R: DeviceTokenRepository> Reconciler<R> {
    pub fn new(store: R, platform: Platform) -> Self {
        Self {
            store,
            platform,
            session: SessionState::new(),
        }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn state(&self) -> ReconcilerState {
        self.session.state()
    }

    /// A push token became available.
    ///
    /// Only the first token of the process is used; it is upserted right away
    /// with whatever identity is known at this instant.
    pub async fn on_push_token(&mut self, push_token: &str) -> PushTokenOutcome {
        if push_token.trim().is_empty() {
            warn!("Ignoring empty push token");
            return PushTokenOutcome::Empty;
        }
        if !self.session.take_push_token(push_token) {
            warn!("Push token already held for this session, ignoring new token");
            return PushTokenOutcome::AlreadyHeld;
        }

        let user_id = self.session.current_user_id().clone();
        PushTokenOutcome::Upserted(
            self.upsert(push_token, &user_id, UpsertTrigger::Initial)
                .await,
        )
    }

    /// The identity bridge reported a user.
    pub async fn on_identity_reported(&mut self, user_id: impl Into<UserId>) -> IdentityOutcome {
        let user_id = user_id.into();
        if user_id.is_guest() || user_id.as_str().trim().is_empty() {
            debug!("Ignoring sentinel identity report");
            return IdentityOutcome::Ignored;
        }
        if &user_id == self.session.current_user_id() {
            return IdentityOutcome::Duplicate;
        }

        info!("User identity changed to {}", user_id);
        self.session.set_user_id(user_id.clone());

        let Some(push_token) = self.session.current_push_token().map(str::to_string) else {
            debug!("No push token yet, deferring upsert for {}", user_id);
            return IdentityOutcome::Deferred;
        };

        IdentityOutcome::Upserted(
            self.upsert(&push_token, &user_id, UpsertTrigger::IdentityChange)
                .await,
        )
    }

    /// Make the record for `push_token` point at `user_id`.
    ///
    /// Finds the record by push token; writes nothing if it already belongs
    /// to `user_id`, merges the new `user_id` otherwise, and creates a new
    /// record when none exists.
    pub async fn upsert(
        &mut self,
        push_token: &str,
        user_id: &UserId,
        trigger: UpsertTrigger,
    ) -> UpsertOutcome {
        if self.session.is_reconciled() && trigger != UpsertTrigger::IdentityChange {
            debug!("Device token already reconciled, skipping {:?} upsert", trigger);
            return UpsertOutcome::Skipped;
        }

        match self.write(push_token, user_id).await {
            Ok(outcome) => {
                self.session.mark_reconciled();
                outcome
            }
            Err(e) => {
                error!("Failed to reconcile device token for user {}: {}", user_id, e);
                UpsertOutcome::Failed
            }
        }
    }

    async fn write(&self, push_token: &str, user_id: &UserId) -> Result<UpsertOutcome, R::Error> {
        let existing = self.store.find_by_push_token(push_token).await?;
        if existing.len() > 1 {
            warn!(
                "{} records share one push token, updating the first",
                existing.len()
            );
        }

        match existing.into_iter().next() {
            Some(record) if record.user_id == user_id.as_str() => {
                debug!("Record {} already belongs to {}", record.record_id, user_id);
                Ok(UpsertOutcome::Unchanged {
                    record_id: record.record_id,
                })
            }
            Some(record) => {
                self.store
                    .create_or_merge(
                        &record.record_id,
                        DeviceTokenFields::user_only(user_id.as_str()),
                        WriteOptions::merge(),
                    )
                    .await?;
                info!(
                    "Record {} moved from {} to {}",
                    record.record_id, record.user_id, user_id
                );
                Ok(UpsertOutcome::Updated {
                    record_id: record.record_id,
                })
            }
            None => {
                let record_id = DeviceTokenRecord::generate_id();
                self.store
                    .create_or_merge(
                        &record_id,
                        DeviceTokenFields::new_record(push_token, user_id.as_str(), self.platform),
                        WriteOptions::replace(),
                    )
                    .await?;
                info!("Created record {} for {}", record_id, user_id);
                Ok(UpsertOutcome::Created { record_id })
            }
        }
    }
}
