//! Identity extraction strategies.
//!
//! Each strategy inspects the surface one way and either finds a user id or
//! doesn't. The detector runs them in order and stops at the first hit.

use crate::surface::{SurfaceError, WebSurface};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Result of one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(String),
    NotFound,
}

/// What a strategy may look at during one detection pass
pub struct DetectionContext<'a> {
    pub surface: &'a dyn WebSurface,
    /// Last value pushed by the auth client's state-changed event
    pub auth_state: Option<&'a str>,
}

/// One way of finding the signed-in user
pub trait Extractor: Send + Sync {
    /// Short name shown in diagnostic snapshots
    fn name(&self) -> &'static str;

    fn extract(&self, ctx: &DetectionContext<'_>) -> Result<Extraction, SurfaceError>;
}

/// Asks the in-page auth client for its current user.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthClientExtractor;

impl Extractor for AuthClientExtractor {
    fn name(&self) -> &'static str {
        "auth_client"
    }

    fn extract(&self, ctx: &DetectionContext<'_>) -> Result<Extraction, SurfaceError> {
        if !ctx.surface.auth_client_available() {
            return Ok(Extraction::NotFound);
        }
        Ok(match ctx.surface.current_user_id()? {
            Some(uid) => Extraction::Found(uid),
            None => Extraction::NotFound,
        })
    }
}

/// Scans local storage for a provider session payload.
///
/// Keys containing one of `key_patterns` are parsed as JSON and searched for
/// `uid`, `user.uid`, `userId` or `user_id`.
#[derive(Debug, Clone)]
pub struct LocalStorageExtractor {
    key_patterns: Vec<String>,
}

impl LocalStorageExtractor {
    pub fn new(key_patterns: Vec<String>) -> Self {
        Self { key_patterns }
    }

    fn matches(&self, key: &str) -> bool {
        self.key_patterns.iter().any(|pattern| key.contains(pattern.as_str()))
    }
}

impl Extractor for LocalStorageExtractor {
    fn name(&self) -> &'static str {
        "local_storage"
    }

    fn extract(&self, ctx: &DetectionContext<'_>) -> Result<Extraction, SurfaceError> {
        for (key, raw) in ctx.surface.storage_entries()? {
            if !self.matches(&key) {
                continue;
            }
            match session_user_id(raw.as_str()) {
                Ok(Some(uid)) => return Ok(Extraction::Found(uid)),
                Ok(None) => debug!("Session payload under {} has no user id", key),
                Err(reason) => debug!("Skipping unparseable session payload under {}: {}", key, reason),
            }
        }
        Ok(Extraction::NotFound)
    }
}

#[derive(Debug, Error)]
pub enum SessionPayloadError {
    #[error("session payload is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),
}

/// Pull a user id out of a stored session payload
pub fn session_user_id(raw: &str) -> Result<Option<String>, SessionPayloadError> {
    let payload: Value = serde_json::from_str(raw)?;

    let candidates = [
        payload.get("uid"),
        payload.get("user").and_then(|user| user.get("uid")),
        payload.get("userId"),
        payload.get("user_id"),
    ];

    let uid = candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|uid| !uid.is_empty())
        .map(str::to_string);
    Ok(uid)
}

/// Uses the value last announced by the auth client's state-changed event.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthStateExtractor;

impl Extractor for AuthStateExtractor {
    fn name(&self) -> &'static str {
        "auth_state_event"
    }

    fn extract(&self, ctx: &DetectionContext<'_>) -> Result<Extraction, SurfaceError> {
        Ok(match ctx.auth_state {
            Some(uid) => Extraction::Found(uid.to_string()),
            None => Extraction::NotFound,
        })
    }
}

/// The standard strategy order: auth client, local storage, auth-state event
pub fn default_extractors(storage_key_patterns: Vec<String>) -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(AuthClientExtractor),
        Box::new(LocalStorageExtractor::new(storage_key_patterns)),
        Box::new(AuthStateExtractor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Page {
        auth_client: Option<Result<Option<String>, SurfaceError>>,
        storage: Vec<(String, String)>,
    }

    impl WebSurface for Page {
        fn auth_client_available(&self) -> bool {
            self.auth_client.is_some()
        }

        fn current_user_id(&self) -> Result<Option<String>, SurfaceError> {
            self.auth_client.clone().unwrap_or(Ok(None))
        }

        fn storage_entries(&self) -> Result<Vec<(String, String)>, SurfaceError> {
            Ok(self.storage.clone())
        }
    }

    fn ctx<'a>(page: &'a Page, auth_state: Option<&'a str>) -> DetectionContext<'a> {
        DetectionContext {
            surface: page,
            auth_state,
        }
    }

    #[test]
    fn test_auth_client_extractor() {
        let page = Page {
            auth_client: Some(Ok(Some("u1".to_string()))),
            storage: vec![],
        };
        assert_eq!(
            AuthClientExtractor.extract(&ctx(&page, None)).unwrap(),
            Extraction::Found("u1".to_string())
        );

        let no_client = Page {
            auth_client: None,
            storage: vec![],
        };
        assert_eq!(
            AuthClientExtractor.extract(&ctx(&no_client, None)).unwrap(),
            Extraction::NotFound
        );
    }

    #[test]
    fn test_auth_client_error_propagates_to_detector() {
        let page = Page {
            auth_client: Some(Err(SurfaceError::AuthClient("boom".to_string()))),
            storage: vec![],
        };
        assert!(AuthClientExtractor.extract(&ctx(&page, None)).is_err());
    }

    #[test]
    fn test_local_storage_extractor_reads_firebase_session() {
        let page = Page {
            auth_client: None,
            storage: vec![
                ("theme".to_string(), "dark".to_string()),
                (
                    "firebase:authUser:AIza:[DEFAULT]".to_string(),
                    r#"{"uid":"u42","phoneNumber":"+911234567890"}"#.to_string(),
                ),
            ],
        };
        let extractor = LocalStorageExtractor::new(vec!["firebase:authUser:".to_string()]);
        assert_eq!(
            extractor.extract(&ctx(&page, None)).unwrap(),
            Extraction::Found("u42".to_string())
        );
    }

    #[test]
    fn test_local_storage_extractor_skips_garbage() {
        let page = Page {
            auth_client: None,
            storage: vec![
                ("firebase:authUser:a".to_string(), "not json".to_string()),
                ("firebase:authUser:b".to_string(), r#"{"user":{"uid":"u7"}}"#.to_string()),
            ],
        };
        let extractor = LocalStorageExtractor::new(vec!["firebase:authUser:".to_string()]);
        assert_eq!(
            extractor.extract(&ctx(&page, None)).unwrap(),
            Extraction::Found("u7".to_string())
        );
    }

    #[test]
    fn test_session_user_id_candidates() {
        assert_eq!(session_user_id(r#"{"uid":"a"}"#).unwrap(), Some("a".to_string()));
        assert_eq!(session_user_id(r#"{"userId":"b"}"#).unwrap(), Some("b".to_string()));
        assert_eq!(session_user_id(r#"{"user_id":"c"}"#).unwrap(), Some("c".to_string()));
        assert_eq!(session_user_id(r#"{"uid":""}"#).unwrap(), None);
        assert_eq!(session_user_id(r#"{"stsTokenManager":{}}"#).unwrap(), None);
        assert!(matches!(
            session_user_id("{"),
            Err(SessionPayloadError::NotJson(_))
        ));
    }

    #[test]
    fn test_auth_state_extractor() {
        let page = Page {
            auth_client: None,
            storage: vec![],
        };
        assert_eq!(
            AuthStateExtractor.extract(&ctx(&page, Some("u9"))).unwrap(),
            Extraction::Found("u9".to_string())
        );
        assert_eq!(
            AuthStateExtractor.extract(&ctx(&page, None)).unwrap(),
            Extraction::NotFound
        );
    }
}
