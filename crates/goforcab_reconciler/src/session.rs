// --- File: crates/goforcab_reconciler/src/session.rs ---

// Per-process session state. Lives exactly as long as one run of the shell.

use goforcab_common::models::UserId;

/// Where the device stands with respect to its remote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    /// No push token yet (or notifications are off for this session)
    NoToken,
    /// A token is held but no upsert has succeeded
    TokenObtained,
    /// At least one upsert succeeded; never regresses
    Reconciled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    current_user_id: UserId,
    current_push_token: Option<String>,
    token_reconciled: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user_id(&self) -> &UserId {
        &self.current_user_id
    }

    pub fn current_push_token(&self) -> Option<&str> {
        self.current_push_token.as_deref()
    }

    pub fn is_reconciled(&self) -> bool {
        self.token_reconciled
    }

    pub fn state(&self) -> ReconcilerState {
        match (&self.current_push_token, self.token_reconciled) {
            (_, true) => ReconcilerState::Reconciled,
            (Some(_), false) => ReconcilerState::TokenObtained,
            (None, false) => ReconcilerState::NoToken,
        }
    }

    pub(crate) fn set_user_id(&mut self, user_id: UserId) {
        self.current_user_id = user_id;
    }

    /// Store the token unless one is already held; returns whether it was taken
    pub(crate) fn take_push_token(&mut self, push_token: &str) -> bool {
        if self.current_push_token.is_some() {
            return false;
        }
        self.current_push_token = Some(push_token.to_string());
        true
    }

    pub(crate) fn mark_reconciled(&mut self) {
        self.token_reconciled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session() {
        let session = SessionState::new();
        assert!(session.current_user_id().is_guest());
        assert_eq!(session.current_push_token(), None);
        assert_eq!(session.state(), ReconcilerState::NoToken);
    }

    #[test]
    fn test_state_transitions() {
        let mut session = SessionState::new();
        assert!(session.take_push_token("tok"));
        assert_eq!(session.state(), ReconcilerState::TokenObtained);

        assert!(!session.take_push_token("other"));
        assert_eq!(session.current_push_token(), Some("tok"));

        session.mark_reconciled();
        assert_eq!(session.state(), ReconcilerState::Reconciled);
    }
}
