//! Authentication service
//!
//! Sign-up, sign-in, refresh-token rotation, email verification and logout.
//! Coordinates the user directory, the session store, the token codec and the
//! password hasher.
//!
//! The session store holds one refresh token per email. Every successful
//! sign-in or refresh overwrites it, so only the most recently issued refresh
//! token is ever redeemable.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::core::auth::error::AuthError;
use crate::core::auth::jwt::{AccessClaims, JwtService, TokenPair};
use crate::core::auth::password::PasswordHasher;
use crate::core::directory::{Identity, NewUser, Role, UserDirectory};
use crate::core::notify::Notifier;
use crate::core::session::{SessionStore, SessionStoreError};

/// bcrypt ignores everything past this many bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Email + plaintext password, alive only for one sign-up or sign-in call
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    jwt_service: JwtService,
    hasher: PasswordHasher,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        jwt_service: JwtService,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            directory,
            sessions,
            notifier,
            jwt_service,
            hasher,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Trim and lower-case an email so it can serve as directory and store key
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Validate email format
    fn validate_email(email: &str) -> Result<(), AuthError> {
        let Some((local, domain)) = email.split_once('@') else {
            return Err(AuthError::InvalidEmail);
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AuthError::InvalidEmail);
        }

        if email.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidEmail);
        }

        // Domain needs at least one dot and no empty labels
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(AuthError::InvalidEmail);
        }

        Ok(())
    }

    /// Validate password length
    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.is_empty() || password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::InvalidPassword);
        }
        Ok(())
    }

    fn session_ttl(&self) -> Result<Duration, AuthError> {
        let secs = u64::try_from(self.jwt_service.refresh_token_ttl_secs())
            .map_err(|_| SessionStoreError::InvalidTtl)?;
        Ok(Duration::from_secs(secs))
    }

    /// Register a new, unverified user. Issues no session tokens.
    pub async fn sign_up(&self, credentials: Credentials) -> Result<Identity, AuthError> {
        let email = Self::normalize_email(&credentials.email);
        Self::validate_email(&email)?;
        Self::validate_password(&credentials.password)?;

        let password_hash = self.hasher.hash(&credentials.password)?;

        let identity = self
            .directory
            .create_user(NewUser {
                email,
                password_hash,
                role: Role::User,
            })
            .await
            .inspect_err(|e| {
                tracing::debug!("Sign-up rejected: {}", e);
            })?;

        // Verification links are signed with the access-token secret
        let (verification_token, _) = self.jwt_service.generate_access_token(&identity)?;
        if let Err(e) = self
            .notifier
            .send_verification(&identity, &verification_token)
            .await
        {
            tracing::warn!(user_id = %identity.id, "Verification notice not sent: {}", e);
        }

        tracing::info!(user_id = %identity.id, email = %identity.email, "User registered");

        Ok(identity)
    }

    /// Check email and password against the directory.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn validate_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Identity, AuthError> {
        let email = Self::normalize_email(&credentials.email);
        Self::validate_email(&email)?;

        let Some(record) = self.directory.find_by_email(&email).await? else {
            self.hasher.verify_dummy(&credentials.password);
            tracing::debug!(email = %email, "Credential check failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(&credentials.password, &record.password_hash)
        {
            tracing::debug!(email = %email, "Credential check failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(record.identity)
    }

    /// Sign in and start a new session, replacing any previous one
    pub async fn sign_in(&self, credentials: Credentials) -> Result<TokenPair, AuthError> {
        let identity = self.validate_credentials(&credentials).await?;
        let tokens = self.issue_session(&identity).await?;

        tracing::info!(user_id = %identity.id, "User signed in");

        Ok(tokens)
    }

    /// Mint a token pair and make its refresh token the only valid one
    pub async fn issue_session(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let tokens = self.jwt_service.generate_token_pair(identity)?;

        self.sessions
            .put(&identity.email, &tokens.refresh_token, self.session_ttl()?)
            .await
            .inspect_err(|e| tracing::error!("Session store write failed: {}", e))?;

        Ok(tokens)
    }

    /// Rotate a refresh token into a fresh pair.
    ///
    /// The store lookup runs on the unverified claims; the signature is only
    /// checked once the presented token matches the stored one.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let hint = self.jwt_service.decode_unverified(presented).map_err(|e| {
            tracing::debug!("Refresh rejected: {}", e);
            AuthError::MalformedToken
        })?;

        let stored = self
            .sessions
            .get(&hint.email)
            .await
            .inspect_err(|e| tracing::error!("Session store read failed: {}", e))?;

        if stored.as_deref() != Some(presented) {
            tracing::debug!(email = %hint.email, "Refresh rejected: stale or revoked token");
            return Err(AuthError::StaleToken);
        }

        let claims = self
            .jwt_service
            .validate_refresh_token(presented)
            .inspect_err(|e| tracing::debug!("Refresh rejected: {}", e))?;

        let Some(identity) = self.directory.find_by_id(claims.id).await? else {
            tracing::debug!(user_id = %claims.id, "Refresh rejected: identity no longer exists");
            self.sessions.delete(&claims.email).await?;
            return Err(AuthError::StaleToken);
        };

        let tokens = self.issue_session(&identity).await?;

        tracing::info!(user_id = %identity.id, "Refresh token rotated");

        Ok(tokens)
    }

    /// Mark the token's identity as verified.
    ///
    /// A link only works once: an already-verified identity is `UserNotFound`.
    pub async fn verify_email(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self
            .jwt_service
            .validate_access_token(token)
            .inspect_err(|e| tracing::debug!("Verification rejected: {}", e))?;

        let identity = self
            .directory
            .find_by_id(claims.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if identity.verified {
            tracing::debug!(user_id = %identity.id, "Verification rejected: already verified");
            return Err(AuthError::UserNotFound);
        }

        let identity = self.directory.set_verified(identity.id, true).await?;

        tracing::info!(user_id = %identity.id, "Email verified");

        Ok(identity)
    }

    /// Verify a bearer access token. Never touches the session store.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        Ok(self.jwt_service.validate_access_token(token)?)
    }

    /// End one identity's session; returns whether one was active
    pub async fn logout(&self, email: &str) -> Result<bool, AuthError> {
        let removed = self
            .sessions
            .delete(&Self::normalize_email(email))
            .await?;

        tracing::info!(email = %email, removed, "User logged out");

        Ok(removed)
    }

    /// Revoke every session of every identity
    pub async fn logout_all(&self) -> Result<(), AuthError> {
        self.sessions
            .clear_all()
            .await
            .inspect_err(|e| tracing::error!("Session store clear failed: {}", e))?;

        tracing::info!("All sessions revoked");

        Ok(())
    }
}
