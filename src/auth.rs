//! Role gate
//!
//! Session management belongs to the managed auth provider; this module only
//! verifies the bearer credential it issued and resolves the caller's role
//! from the profiles table. Every mutating order/product/purchase endpoint
//! goes through `Gate::require_role`.

use crate::domain::profile::Role;
use crate::error::AppError;
use crate::store::Store;
use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Debug)]
pub struct TokenClaims {
    pub subject: Uuid,
    pub email: Option<String>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<TokenClaims, AppError>;
}

#[derive(Deserialize)]
struct JwtClaims {
    sub: String,
    email: Option<String>,
    #[allow(dead_code)]
    exp: usize,
}

/// HS256 verification against the auth provider's shared signing secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, AppError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("invalid token: {e}")))?;
        let subject = data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthorized("invalid token subject".into()))?;
        Ok(TokenClaims { subject, email: data.claims.email })
    }
}

pub struct Gate {
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn Store>,
}

impl Gate {
    pub fn new(verifier: Arc<dyn TokenVerifier>, store: Arc<dyn Store>) -> Self {
        Self { verifier, store }
    }

    fn bearer(headers: &HeaderMap) -> Result<&str, AppError> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))
    }

    /// Resolves the caller's full profile row, or 401.
    pub async fn resolve_profile(&self, headers: &HeaderMap) -> Result<crate::domain::profile::Profile, AppError> {
        let claims = self.verifier.verify(Self::bearer(headers)?).await?;
        self.store
            .profile(claims.subject)
            .await?
            .ok_or_else(|| AppError::Unauthorized("no profile for token subject".into()))
    }

    /// Resolves the caller's identity, or 401.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AppError> {
        let profile = self.resolve_profile(headers).await?;
        Ok(AuthUser { id: profile.id, email: profile.email, role: profile.role })
    }

    /// Resolves the caller and checks the role, or 401/403.
    pub async fn require_role(&self, headers: &HeaderMap, allowed: &[Role]) -> Result<AuthUser, AppError> {
        let user = self.authenticate(headers).await?;
        if !allowed.contains(&user.role) {
            return Err(AppError::Forbidden(format!(
                "role {} may not perform this operation",
                user.role.as_str()
            )));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Profile;
    use crate::store::MemStore;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        email: Option<String>,
        exp: usize,
    }

    fn token(secret: &str, sub: &str) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            email: Some("admin@example.com".into()),
            exp: 4_102_444_800, // far future
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn profile(id: Uuid, role: Role) -> Profile {
        Profile {
            id,
            email: "admin@example.com".into(),
            display_name: "Admin".into(),
            role,
            tax_id: None,
            tax_regime: None,
            business_name: None,
            created_at: Utc::now(),
        }
    }

    async fn gate_with(role: Role) -> (Gate, Uuid) {
        let store = Arc::new(MemStore::new());
        let user_id = Uuid::new_v4();
        store.seed_profile(profile(user_id, role)).await;
        let gate = Gate::new(Arc::new(JwtVerifier::new("secret")), store);
        (gate, user_id)
    }

    fn headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn resolves_role_from_profile() {
        let (gate, user_id) = gate_with(Role::Admin).await;
        let user = gate
            .require_role(&headers(&token("secret", &user_id.to_string())), &[Role::Admin])
            .await
            .unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let (gate, user_id) = gate_with(Role::Customer).await;
        let err = gate
            .require_role(&headers(&token("secret", &user_id.to_string())), &[Role::Admin, Role::Reseller])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn bad_signature_is_unauthorized() {
        let (gate, user_id) = gate_with(Role::Admin).await;
        let err = gate
            .require_role(&headers(&token("other-secret", &user_id.to_string())), &[Role::Admin])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (gate, _) = gate_with(Role::Admin).await;
        let err = gate.require_role(&HeaderMap::new(), &[Role::Admin]).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn token_without_profile_is_unauthorized() {
        let (gate, _) = gate_with(Role::Admin).await;
        let stranger = Uuid::new_v4();
        let err = gate
            .require_role(&headers(&token("secret", &stranger.to_string())), &[Role::Admin])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
