//! The host side of the web surface channel.
//!
//! The page posts one JSON message per line. `userId` messages drive the
//! reconciler, `debug` messages are logged, and navigation requests go
//! through the [`NavigationPolicy`].

use goforcab_bridge::{parse_message, BridgeMessage};
use goforcab_common::GoforcabError;
use goforcab_db::DeviceTokenRepository;
use goforcab_reconciler::{IdentityOutcome, Reconciler};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Decides whether the surface may load a URL. Every request is logged and
/// allowed.
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    home: String,
}

impl NavigationPolicy {
    pub fn new(home: impl Into<String>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn should_load(&self, url: &str) -> bool {
        info!("Navigation requested: {}", url);
        true
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data")]
enum HostRequest {
    #[serde(rename = "navigate")]
    Navigate(String),
}

/// What the host did with one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Blank,
    Identity(IdentityOutcome),
    Debug,
    Navigation { allowed: bool },
    Malformed,
}

pub struct Host<R> {
    reconciler: Reconciler<R>,
    navigation: NavigationPolicy,
}

impl<R: DeviceTokenRepository> Host<R> {
    pub fn new(reconciler: Reconciler<R>, navigation: NavigationPolicy) -> Self {
        Self {
            reconciler,
            navigation,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<R> {
        &mut self.reconciler
    }

    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Blank;
        }

        match parse_message(line) {
            Ok(BridgeMessage::UserId(user_id)) => {
                LineOutcome::Identity(self.reconciler.on_identity_reported(user_id).await)
            }
            Ok(BridgeMessage::Debug(snapshot)) => {
                debug!(%snapshot, "Bridge diagnostics");
                LineOutcome::Debug
            }
            Err(e) => match serde_json::from_str::<HostRequest>(line) {
                Ok(HostRequest::Navigate(url)) => LineOutcome::Navigation {
                    allowed: self.navigation.should_load(&url),
                },
                Err(_) => {
                    warn!("Ignoring message from web surface: {}", e);
                    LineOutcome::Malformed
                }
            },
        }
    }

    /// Consume input lines until the input closes or Ctrl-C arrives
    pub async fn run<I>(&mut self, input: I) -> Result<(), GoforcabError>
    where
        I: AsyncBufRead + Unpin,
    {
        info!("Hosting {}", self.navigation.home());
        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        self.handle_line(&line).await;
                    }
                    None => {
                        info!("Web surface channel closed");
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C, shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}
