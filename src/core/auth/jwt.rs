//! JWT utilities for token generation and validation
//!
//! Access and refresh tokens are HS256 JWTs signed with two independent
//! secrets. Access tokens carry the role and are verified by signature and
//! expiry alone. Refresh tokens additionally have to match the session store.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::core::config::{DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS};
use crate::core::directory::{Identity, Role};

const DEFAULT_ISSUER: &str = "sessiongate";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens
    pub access_secret: String,
    /// Secret key for signing refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
    /// Token issuer
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Set access token lifetime
    pub fn access_token_ttl(mut self, secs: i64) -> Self {
        self.access_token_ttl_secs = secs;
        self
    }

    /// Set refresh token lifetime
    pub fn refresh_token_ttl(mut self, secs: i64) -> Self {
        self.refresh_token_ttl_secs = secs;
        self
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token type")]
    InvalidTokenType,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::InvalidToken
            }
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims of an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Claims of a refresh token (no role: it is re-read on rotation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID
    pub id: Uuid,
    pub email: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

/// Identity hint read from a token without checking its signature.
///
/// Only good for choosing which session record to look at; never proof of
/// who sent the token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHint {
    pub id: Uuid,
    pub email: String,
}

trait TypedClaims {
    fn token_type(&self) -> TokenType;
}

impl TypedClaims for AccessClaims {
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

impl TypedClaims for RefreshClaims {
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

/// Token pair (access + refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Access token (short-lived)
    pub access_token: String,
    /// Refresh token (long-lived)
    pub refresh_token: String,
    /// Access token expiration (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh token expiration (Unix timestamp)
    pub refresh_expires_at: i64,
    /// Token type (always "Bearer")
    pub token_type: String,
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        Self {
            access_encoding_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            config,
        }
    }

    /// Generate an access token carrying id, email and role
    pub fn generate_access_token(&self, identity: &Identity) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_ttl_secs);

        let claims = AccessClaims {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            token_type: TokenType::Access,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.access_encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Generate a refresh token carrying id and email
    pub fn generate_refresh_token(&self, identity: &Identity) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.refresh_token_ttl_secs);

        let claims = RefreshClaims {
            id: identity.id,
            email: identity.email.clone(),
            token_type: TokenType::Refresh,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.refresh_encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, identity: &Identity) -> Result<TokenPair, JwtError> {
        let (access_token, access_expires_at) = self.generate_access_token(identity)?;
        let (refresh_token, refresh_expires_at) = self.generate_refresh_token(identity)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
            token_type: "Bearer".to_string(),
        })
    }

    /// Read `{id, email}` from a token without verifying signature or expiry
    pub fn decode_unverified(&self, token: &str) -> Result<TokenHint, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<TokenHint>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| JwtError::DecodingError(e.to_string()))?;

        Ok(token_data.claims)
    }

    /// Verify an access token's signature, expiry, issuer and type
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.validate(token, &self.access_decoding_key, TokenType::Access)
    }

    /// Verify a refresh token's signature, expiry, issuer and type
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.validate(token, &self.refresh_decoding_key, TokenType::Refresh)
    }

    fn validate<C>(&self, token: &str, key: &DecodingKey, expected: TokenType) -> Result<C, JwtError>
    where
        C: DeserializeOwned + TypedClaims,
    {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        // Set leeway to 0 for strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<C>(token, key, &validation)?;

        if token_data.claims.token_type() != expected {
            return Err(JwtError::InvalidTokenType);
        }

        Ok(token_data.claims)
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_token_ttl_secs(&self) -> i64 {
        self.config.refresh_token_ttl_secs
    }
}
