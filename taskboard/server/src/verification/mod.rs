//! Email verification codes.
//!
//! A six digit code is issued for an email address, handed to a
//! [`CodeSender`] for delivery, and can be redeemed once within
//! [`CODE_TTL_MINUTES`]. Codes live in a [`VerificationCodeStore`] owned by
//! the router state, so each server (and each test) gets its own.

use crate::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

pub mod api;

pub const CODE_TTL_MINUTES: i64 = 5;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([-+.']\w+)*@\w+([-.]\w+)*\.\w+([-.]\w+)*$").expect("email pattern is valid")
});

/// Returns `true` when `email` looks like an email address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Email format is invalid. Please check the email and try again.")]
    InvalidEmail,
    #[error("Invalid or expired verification code")]
    InvalidCode,
    #[error("Failed to send verification code")]
    Delivery(#[source] anyhow::Error),
}

/// Delivers an issued code to its owner.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_code(&self, email: &str, code: &str) -> anyhow::Result<()>;
}

/// [`CodeSender`] that writes codes to the log. Useful in development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_code(&self, email: &str, code: &str) -> anyhow::Result<()> {
        tracing::info!(email, code, "Verification code issued");
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Pending verification codes keyed by email, with expiry.
pub struct VerificationCodeStore {
    codes: Mutex<HashMap<String, PendingCode>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl VerificationCodeStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::minutes(CODE_TTL_MINUTES))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    /// Generates a fresh code for `email`, replacing any pending one.
    ///
    /// Expired codes of every address are dropped first, so the store only
    /// holds codes that can still be redeemed.
    pub fn issue(&self, email: &str) -> Result<String, VerificationError> {
        if !is_valid_email(email) {
            return Err(VerificationError::InvalidEmail);
        }
        let purged = self.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "Dropped expired verification codes");
        }
        let code = generate_code();
        self.save(email, &code);
        Ok(code)
    }

    /// Stores `code` for `email` until the TTL runs out.
    pub fn save(&self, email: &str, code: &str) {
        let expires_at = self.clock.now() + self.ttl;
        self.lock().insert(
            email.to_string(),
            PendingCode {
                code: code.to_string(),
                expires_at,
            },
        );
    }

    /// Redeems `code` for `email`. A code can be redeemed only once.
    pub fn verify(&self, email: &str, code: &str) -> Result<(), VerificationError> {
        let now = self.clock.now();
        let mut codes = self.lock();
        let lookup = codes
            .get(email)
            .map(|pending| (pending.expires_at < now, pending.code == code));
        match lookup {
            Some((true, _)) => {
                codes.remove(email);
                Err(VerificationError::InvalidCode)
            }
            Some((false, true)) => {
                codes.remove(email);
                Ok(())
            }
            _ => Err(VerificationError::InvalidCode),
        }
    }

    /// Drops every expired code, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut codes = self.lock();
        let before = codes.len();
        codes.retain(|_, pending| pending.expires_at >= now);
        before - codes.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingCode>> {
        self.codes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Shared state for verification handlers.
#[derive(Clone)]
pub struct VerificationState {
    pub store: Arc<VerificationCodeStore>,
    pub sender: Arc<dyn CodeSender>,
}

impl VerificationState {
    /// Issues a code for `email` and hands it to the sender.
    #[tracing::instrument(skip(self))]
    pub async fn send_code(&self, email: &str) -> Result<(), VerificationError> {
        let code = self.store.issue(email)?;
        self.sender
            .send_code(email, &code)
            .await
            .map_err(VerificationError::Delivery)
    }
}
