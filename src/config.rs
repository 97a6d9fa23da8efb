use crate::error::{MarketError, Result};
use std::time::Duration;

/// How long a transaction waits for the ledger lock before giving up.
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Runtime configuration injected at process startup.
///
/// The admin token guards the reporting surface and is never compiled in;
/// with no `GIGPAY_ADMIN_TOKEN` in the environment the admin surface stays
/// disabled.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub admin_token: Option<String>,
    pub lock_wait: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let admin_token = std::env::var("GIGPAY_ADMIN_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());
        let lock_wait = std::env::var("GIGPAY_LOCK_WAIT_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOCK_WAIT);
        Self {
            admin_token,
            lock_wait,
        }
    }

    pub fn verify_admin(&self, presented: &str) -> Result<()> {
        match &self.admin_token {
            Some(expected) if expected == presented => Ok(()),
            _ => Err(MarketError::Unauthenticated),
        }
    }
}
