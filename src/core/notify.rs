//! Notifier client
//!
//! Sign-up hands the new identity and its verification token to a notifier.
//! Delivery (templating, SMTP) is external; `LogNotifier` only records that a
//! notice was due.

use async_trait::async_trait;

use crate::core::directory::Identity;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notice channel for verification links
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification(&self, identity: &Identity, token: &str)
    -> Result<(), NotifyError>;
}

/// Notifier that logs the event and drops the token
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification(
        &self,
        identity: &Identity,
        _token: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %identity.id,
            email = %identity.email,
            "Verification notice queued"
        );
        Ok(())
    }
}
