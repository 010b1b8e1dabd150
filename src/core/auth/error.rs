//! Authentication error taxonomy
//!
//! Every `AuthError` belongs to exactly one [`ErrorKind`]. Store and directory
//! outages stay `Infrastructure` all the way up so they are never mistaken for
//! a rejected credential.

use crate::core::auth::jwt::JwtError;
use crate::core::auth::password::PasswordError;
use crate::core::directory::DirectoryError;
use crate::core::session::SessionStoreError;

/// Coarse classification used for status codes and log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Infrastructure,
    Internal,
}

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password must be between 1 and 72 bytes")]
    InvalidPassword,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Stale or revoked token")]
    StaleToken,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Service temporarily unavailable: {0}")]
    Infrastructure(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidEmail | AuthError::InvalidPassword => ErrorKind::Validation,
            AuthError::InvalidCredentials | AuthError::StaleToken | AuthError::MissingToken => {
                ErrorKind::Unauthorized
            }
            AuthError::MalformedToken | AuthError::InvalidToken | AuthError::InsufficientRole => {
                ErrorKind::Forbidden
            }
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailAlreadyExists => ErrorKind::Conflict,
            AuthError::Infrastructure(_) => ErrorKind::Infrastructure,
            AuthError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for API bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "INVALID_EMAIL",
            AuthError::InvalidPassword => "INVALID_PASSWORD",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::StaleToken => "STALE_TOKEN",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InsufficientRole => "INSUFFICIENT_ROLE",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::EmailAlreadyExists => "EMAIL_EXISTS",
            AuthError::Infrastructure(_) => "SERVICE_UNAVAILABLE",
            AuthError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired
            | JwtError::InvalidToken
            | JwtError::InvalidTokenType
            | JwtError::DecodingError(_) => AuthError::InvalidToken,
            JwtError::EncodingError(_) => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::Unavailable(_) => AuthError::Infrastructure(err.to_string()),
            SessionStoreError::InvalidTtl => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            DirectoryError::NotFound => AuthError::UserNotFound,
            DirectoryError::Unavailable(_) => AuthError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            format!("{}", AuthError::InvalidCredentials),
            "Invalid credentials"
        );
        assert_eq!(format!("{}", AuthError::UserNotFound), "User not found");
        assert_eq!(
            format!("{}", AuthError::EmailAlreadyExists),
            "Email already registered"
        );
        assert_eq!(
            format!("{}", AuthError::StaleToken),
            "Stale or revoked token"
        );
        assert_eq!(format!("{}", AuthError::MalformedToken), "Malformed token");
    }

    #[test]
    fn test_every_variant_has_one_kind() {
        let cases = [
            (AuthError::InvalidEmail, ErrorKind::Validation),
            (AuthError::InvalidPassword, ErrorKind::Validation),
            (AuthError::InvalidCredentials, ErrorKind::Unauthorized),
            (AuthError::StaleToken, ErrorKind::Unauthorized),
            (AuthError::MissingToken, ErrorKind::Unauthorized),
            (AuthError::MalformedToken, ErrorKind::Forbidden),
            (AuthError::InvalidToken, ErrorKind::Forbidden),
            (AuthError::InsufficientRole, ErrorKind::Forbidden),
            (AuthError::UserNotFound, ErrorKind::NotFound),
            (AuthError::EmailAlreadyExists, ErrorKind::Conflict),
            (
                AuthError::Infrastructure("down".into()),
                ErrorKind::Infrastructure,
            ),
            (AuthError::InternalError("bug".into()), ErrorKind::Internal),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_from_jwt_error() {
        let err: AuthError = JwtError::Expired.into();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err: AuthError = JwtError::InvalidTokenType.into();
        assert!(matches!(err, AuthError::InvalidToken));

        let err: AuthError = JwtError::EncodingError("key".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_outages_are_infrastructure() {
        let err: AuthError = SessionStoreError::Unavailable("refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);

        let err: AuthError = DirectoryError::Unavailable("timeout".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn test_from_directory_error() {
        let err: AuthError = DirectoryError::EmailAlreadyExists.into();
        assert!(matches!(err, AuthError::EmailAlreadyExists));

        let err: AuthError = DirectoryError::NotFound.into();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            AuthError::InvalidEmail.code(),
            AuthError::InvalidPassword.code(),
            AuthError::InvalidCredentials.code(),
            AuthError::StaleToken.code(),
            AuthError::MissingToken.code(),
            AuthError::MalformedToken.code(),
            AuthError::InvalidToken.code(),
            AuthError::InsufficientRole.code(),
            AuthError::UserNotFound.code(),
            AuthError::EmailAlreadyExists.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
