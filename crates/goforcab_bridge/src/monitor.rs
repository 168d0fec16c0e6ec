//! The identity bridge loop.
//!
//! Re-runs detection on a fixed interval, right away when auth-related
//! storage or the auth client's state changes, and after a settle delay when
//! the user submits a form or clicks something that looks like a login
//! action. Only changed identities are posted to the host.

use crate::detector::{ChangeGate, IdentityDetector};
use crate::extractors::DetectionContext;
use crate::message::BridgeMessage;
use crate::surface::{is_auth_storage_key, is_login_action, SurfaceEvent, WebSurface};
use goforcab_config::BridgeConfig;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

enum Trigger {
    Now,
    Settle,
    Ignore,
}

pub struct IdentityBridge<S> {
    surface: S,
    detector: IdentityDetector,
    gate: ChangeGate,
    auth_state: Option<String>,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl<S: WebSurface> IdentityBridge<S> {
    pub fn new(surface: S, config: &BridgeConfig) -> Self {
        Self::with_detector(
            surface,
            IdentityDetector::with_storage_patterns(config.storage_key_patterns.clone()),
            config,
        )
    }

    pub fn with_detector(surface: S, detector: IdentityDetector, config: &BridgeConfig) -> Self {
        Self {
            surface,
            detector,
            gate: ChangeGate::new(),
            auth_state: None,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }

    /// Run one detection pass.
    ///
    /// Always yields a `debug` message, followed by a `userId` message when the
    /// identity differs from the last one posted.
    pub fn check(&mut self) -> Vec<BridgeMessage> {
        let detection = self.detector.detect(&DetectionContext {
            surface: &self.surface,
            auth_state: self.auth_state.as_deref(),
        });

        let mut messages = vec![BridgeMessage::Debug(
            serde_json::to_value(&detection.snapshot).unwrap_or_default(),
        )];
        if let Some(user_id) = self.gate.offer(detection.user_id) {
            info!("Identity changed to {}", user_id);
            messages.push(BridgeMessage::UserId(user_id.to_string()));
        }
        messages
    }

    fn classify(&mut self, event: SurfaceEvent) -> Trigger {
        match event {
            SurfaceEvent::StorageChanged { key } if is_auth_storage_key(&key) => {
                debug!("Auth-related storage key {} changed", key);
                Trigger::Now
            }
            SurfaceEvent::StorageChanged { .. } => Trigger::Ignore,
            SurfaceEvent::AuthStateChanged { user_id } => {
                self.auth_state = user_id.filter(|uid| !uid.is_empty());
                Trigger::Now
            }
            SurfaceEvent::FormSubmitted => Trigger::Settle,
            SurfaceEvent::Clicked { text } if is_login_action(&text) => Trigger::Settle,
            SurfaceEvent::Clicked { .. } => Trigger::Ignore,
        }
    }

    /// Drive the bridge until the page goes away or the host stops listening.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<SurfaceEvent>,
        listener: mpsc::Sender<BridgeMessage>,
    ) {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut settle_at: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                event = events.recv() => match event {
                    Some(event) => match self.classify(event) {
                        Trigger::Now => {}
                        Trigger::Settle => {
                            settle_at = Some(Instant::now() + self.settle_delay);
                            continue;
                        }
                        Trigger::Ignore => continue,
                    },
                    None => {
                        debug!("Surface event channel closed, stopping identity bridge");
                        break;
                    }
                },
                _ = time::sleep_until(settle_at.unwrap_or_else(Instant::now)), if settle_at.is_some() => {
                    settle_at = None;
                }
            }

            for message in self.check() {
                if listener.send(message).await.is_err() {
                    debug!("Host listener dropped, stopping identity bridge");
                    return;
                }
            }
        }
    }
}
