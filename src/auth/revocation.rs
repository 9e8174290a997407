use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Tokens that were explicitly logged out before they expired.
///
/// Shared across workers through `web::Data`. Entries are dropped once the
/// token would have expired anyway.
#[derive(Debug, Default)]
pub struct RevokedTokens {
    tokens: Mutex<HashMap<String, usize>>,
}

impl RevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `token` as revoked until `exp` (seconds since the epoch).
    pub fn revoke(&self, token: &str, exp: usize) {
        let now = Utc::now().timestamp() as usize;
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens.retain(|_, expires| *expires > now);
        if exp > now {
            tokens.insert(token.to_string(), exp);
        }
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
