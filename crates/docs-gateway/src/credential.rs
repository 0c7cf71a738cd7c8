use chrono::{DateTime, Utc};

use crate::error::{GatewayError, Result};

/// An OAuth bearer token obtained outside this crate.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fail with `Unauthorized` if the token is empty or expired at `now`.
    pub fn check_at(&self, now: DateTime<Utc>) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(GatewayError::Unauthorized);
        }
        match self.expires_at {
            Some(expires_at) if expires_at <= now => Err(GatewayError::Unauthorized),
            _ => Ok(()),
        }
    }

    pub fn check(&self) -> Result<()> {
        self.check_at(Utc::now())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
