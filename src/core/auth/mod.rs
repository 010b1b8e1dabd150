//! Authentication module
//!
//! This module provides:
//! - bcrypt password hashing
//! - access and refresh token signing and validation
//! - the sign-up / sign-in / refresh / verify / logout protocol
//! - per-route authentication and role checks
//! - REST API endpoints for auth operations

pub mod api;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use error::{AuthError, ErrorKind};
pub use guard::{AccessGuard, AuthRequest, AuthStrategy, Authenticated, RoutePolicy};
pub use jwt::{
    AccessClaims, JwtConfig, JwtError, JwtService, RefreshClaims, TokenHint, TokenPair, TokenType,
};
pub use password::{PasswordError, PasswordHasher};
pub use service::{AuthService, Credentials, RefreshRequest};
