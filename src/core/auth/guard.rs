//! Request-scoped authentication and role checks
//!
//! Each route declares a [`RoutePolicy`]: which strategy authenticates the
//! caller and which roles may proceed. The strategy comes from the policy,
//! never from inspecting what the caller sent.

use uuid::Uuid;

use crate::core::auth::error::AuthError;
use crate::core::auth::jwt::AccessClaims;
use crate::core::auth::service::{AuthService, Credentials};
use crate::core::directory::{Identity, Role};

/// How a route authenticates its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Email and password in the request, checked against the directory
    Credential,
    /// Access token in the `Authorization` header, checked by signature only
    Bearer,
}

/// Authentication material pulled out of a request
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    pub credentials: Option<Credentials>,
    pub bearer_token: Option<String>,
}

impl AuthRequest {
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            bearer_token: None,
        }
    }

    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            credentials: None,
            bearer_token: Some(token.into()),
        }
    }
}

/// Caller identity attached to the request after authentication
#[derive(Debug, Clone)]
pub enum Authenticated {
    Credentials(Identity),
    Bearer(AccessClaims),
}

impl Authenticated {
    pub fn id(&self) -> Uuid {
        match self {
            Authenticated::Credentials(identity) => identity.id,
            Authenticated::Bearer(claims) => claims.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Authenticated::Credentials(identity) => &identity.email,
            Authenticated::Bearer(claims) => &claims.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Authenticated::Credentials(identity) => identity.role,
            Authenticated::Bearer(claims) => claims.role,
        }
    }
}

/// Declarative access rule for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    pub strategy: AuthStrategy,
    /// Roles allowed through (empty = any authenticated caller)
    pub required_roles: Vec<Role>,
}

impl RoutePolicy {
    pub fn credential() -> Self {
        Self {
            strategy: AuthStrategy::Credential,
            required_roles: Vec::new(),
        }
    }

    pub fn bearer() -> Self {
        Self {
            strategy: AuthStrategy::Bearer,
            required_roles: Vec::new(),
        }
    }

    /// Restrict the route to the given roles
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles = roles.into_iter().collect();
        self
    }

    /// Bearer-authenticated, admin only
    pub fn admin() -> Self {
        Self::bearer().with_roles([Role::Admin])
    }
}

#[derive(Clone)]
pub struct AccessGuard {
    auth_service: AuthService,
}

impl AccessGuard {
    pub fn new(auth_service: AuthService) -> Self {
        Self { auth_service }
    }

    /// Authenticate with the given strategy
    pub async fn authenticate(
        &self,
        strategy: AuthStrategy,
        request: &AuthRequest,
    ) -> Result<Authenticated, AuthError> {
        match strategy {
            AuthStrategy::Credential => {
                let credentials = request
                    .credentials
                    .as_ref()
                    .ok_or(AuthError::InvalidCredentials)?;
                let identity = self.auth_service.validate_credentials(credentials).await?;
                Ok(Authenticated::Credentials(identity))
            }
            AuthStrategy::Bearer => {
                let token = request
                    .bearer_token
                    .as_deref()
                    .ok_or(AuthError::MissingToken)?;
                let claims = self.auth_service.verify_access_token(token)?;
                Ok(Authenticated::Bearer(claims))
            }
        }
    }

    /// Permit only callers whose role is in `required_roles`
    pub fn authorize(
        &self,
        authenticated: &Authenticated,
        required_roles: &[Role],
    ) -> Result<(), AuthError> {
        if required_roles.is_empty() || required_roles.contains(&authenticated.role()) {
            return Ok(());
        }

        tracing::debug!(
            user_id = %authenticated.id(),
            role = %authenticated.role(),
            "Access denied: insufficient role"
        );
        Err(AuthError::InsufficientRole)
    }

    /// Authenticate and authorize according to a route policy
    pub async fn check(
        &self,
        policy: &RoutePolicy,
        request: &AuthRequest,
    ) -> Result<Authenticated, AuthError> {
        let authenticated = self.authenticate(policy.strategy, request).await?;
        self.authorize(&authenticated, &policy.required_roles)?;
        Ok(authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::error::ErrorKind;
    use crate::core::auth::jwt::{JwtConfig, JwtService};
    use crate::core::auth::service::tests::{Harness, harness};
    use crate::core::directory::{NewUser, UserDirectory};

    async fn admin(h: &Harness) -> Identity {
        let password_hash = bcrypt::hash("root-pw", 4).unwrap();
        h.directory
            .create_user(NewUser {
                email: "root@x.com".to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await
            .unwrap()
    }

    // ========================================================================
    // Policy Tests
    // ========================================================================

    #[test]
    fn test_route_policy_constructors() {
        assert_eq!(RoutePolicy::credential().strategy, AuthStrategy::Credential);
        assert!(RoutePolicy::bearer().required_roles.is_empty());

        let admin = RoutePolicy::admin();
        assert_eq!(admin.strategy, AuthStrategy::Bearer);
        assert_eq!(admin.required_roles, vec![Role::Admin]);
    }

    // ========================================================================
    // Credential Strategy Tests
    // ========================================================================

    #[tokio::test]
    async fn test_credential_strategy_attaches_identity() {
        let h = harness();
        h.service
            .sign_up(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let guard = AccessGuard::new(h.service.clone());

        let request = AuthRequest::with_credentials(Credentials::new("a@x.com", "pw1"));
        let authenticated = guard
            .authenticate(AuthStrategy::Credential, &request)
            .await
            .unwrap();

        assert!(matches!(authenticated, Authenticated::Credentials(_)));
        assert_eq!(authenticated.email(), "a@x.com");
        assert_eq!(authenticated.role(), Role::User);
    }

    #[tokio::test]
    async fn test_credential_strategy_rejects_bad_password() {
        let h = harness();
        h.service
            .sign_up(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let guard = AccessGuard::new(h.service.clone());

        let request = AuthRequest::with_credentials(Credentials::new("a@x.com", "nope"));
        let err = guard
            .authenticate(AuthStrategy::Credential, &request)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_strategy_follows_policy_not_payload() {
        let h = harness();
        h.service
            .sign_up(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let pair = h
            .service
            .sign_in(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let guard = AccessGuard::new(h.service.clone());

        // A valid bearer token does not satisfy a credential route
        let request = AuthRequest::with_bearer(pair.access_token);
        let err = guard
            .check(&RoutePolicy::credential(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // ========================================================================
    // Bearer Strategy Tests
    // ========================================================================

    #[tokio::test]
    async fn test_bearer_strategy_does_not_consult_session_store() {
        let h = harness();
        h.service
            .sign_up(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let pair = h
            .service
            .sign_in(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        h.service.logout_all().await.unwrap();
        let guard = AccessGuard::new(h.service.clone());

        // Access tokens stay valid until they expire
        let authenticated = guard
            .check(&RoutePolicy::bearer(), &AuthRequest::with_bearer(pair.access_token))
            .await
            .unwrap();

        assert!(matches!(authenticated, Authenticated::Bearer(_)));
        assert_eq!(authenticated.email(), "a@x.com");
    }

    #[tokio::test]
    async fn test_bearer_strategy_missing_token() {
        let guard = AccessGuard::new(harness().service);

        let err = guard
            .authenticate(AuthStrategy::Bearer, &AuthRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_bearer_strategy_rejects_foreign_token() {
        let h = harness();
        let identity = admin(&h).await;
        let foreign = JwtService::new(JwtConfig::new("other_access", "other_refresh"));
        let (token, _) = foreign.generate_access_token(&identity).unwrap();
        let guard = AccessGuard::new(h.service.clone());

        let err = guard
            .check(&RoutePolicy::admin(), &AuthRequest::with_bearer(token))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    // ========================================================================
    // Authorization Tests
    // ========================================================================

    #[tokio::test]
    async fn test_admin_policy_admits_admin() {
        let h = harness();
        let identity = admin(&h).await;
        let (token, _) = h
            .service
            .jwt_service()
            .generate_access_token(&identity)
            .unwrap();
        let guard = AccessGuard::new(h.service.clone());

        let authenticated = guard
            .check(&RoutePolicy::admin(), &AuthRequest::with_bearer(token))
            .await
            .unwrap();

        assert_eq!(authenticated.role(), Role::Admin);
        assert_eq!(authenticated.id(), identity.id);
    }

    #[tokio::test]
    async fn test_admin_policy_rejects_user() {
        let h = harness();
        h.service
            .sign_up(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let pair = h
            .service
            .sign_in(Credentials::new("a@x.com", "pw1"))
            .await
            .unwrap();
        let guard = AccessGuard::new(h.service.clone());

        let err = guard
            .check(&RoutePolicy::admin(), &AuthRequest::with_bearer(pair.access_token))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InsufficientRole));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_authorize_empty_roles_admits_anyone() {
        let h = harness();
        let identity = admin(&h).await;
        let guard = AccessGuard::new(h.service.clone());

        let authenticated = Authenticated::Credentials(identity);
        assert!(guard.authorize(&authenticated, &[]).is_ok());
        assert!(guard.authorize(&authenticated, &[Role::User, Role::Admin]).is_ok());
        assert!(guard.authorize(&authenticated, &[Role::User]).is_err());
    }
}
