pub(crate) use crate::auth::dto::{Claims, JwtKeys};
use crate::auth::dto::RegisterRequest;
use crate::config::JwtConfig;
use crate::errors::ApiError;
use crate::state::AppState;
use crate::store::CredentialStore;
use crate::users::repo_types::{Designation, NewUser, User};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_mobile(mobile: &str) -> bool {
    lazy_static! {
        static ref MOBILE_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
    }
    MOBILE_RE.is_match(mobile)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new user. Validates the profile, hashes the password and
/// persists the record. The store's unique constraint is the final arbiter
/// when two registrations race past the pre-insert check.
pub async fn register_user(
    store: &dyn CredentialStore,
    mut req: RegisterRequest,
) -> Result<User, ApiError> {
    req.email = normalize_email(&req.email);

    let required = [
        &req.full_name,
        &req.email,
        &req.password,
        &req.mobile,
        &req.country,
        &req.state,
        &req.company_name,
        &req.designation,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::Validation(
            "Full Name, Email, Password, Mobile, Country, State, Company Name, and Designation are required.".into(),
        ));
    }

    if req.full_name.trim().chars().count() < 2 {
        return Err(ApiError::Validation(
            "Full name must be at least 2 characters long.".into(),
        ));
    }

    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(ApiError::Validation("Invalid email format.".into()));
    }

    if req.password.chars().count() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long.".into(),
        ));
    }

    if !is_valid_mobile(&req.mobile) {
        return Err(ApiError::Validation(
            "Mobile number must be 10 digits.".into(),
        ));
    }

    let designation: Designation = req
        .designation
        .parse()
        .map_err(|v| ApiError::Validation(format!("{v} is not a valid designation.")))?;

    if store.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&req.password)?;

    let user = store
        .insert(NewUser {
            full_name: req.full_name.trim().to_string(),
            email: req.email,
            password_hash,
            mobile: req.mobile,
            country: req.country,
            state: req.state,
            company_name: req.company_name,
            designation,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Authenticate a sign-in attempt and issue a session token. A missing user
/// and a wrong password are indistinguishable to the caller.
pub async fn authenticate_user(
    store: &dyn CredentialStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<(User, String), ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Email and Password are required.".into(),
        ));
    }

    let email = normalize_email(email);

    let user = match store.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "signin unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "signin invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user signed in");
    Ok((user, token))
}

pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        Ok(AuthUser(claims.sub))
    }
}


#[cfg(test)]
mod jwt_tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "who@example.com").expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "who@example.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn verify_rejects_garbage_token() {
        let keys = make_keys();
        assert!(keys.verify("not.a.jwt").is_err());
    }
}

#[cfg(test)]
mod service_tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn signup(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            full_name: "Jane Doe".into(),
            email: email.into(),
            password: password.into(),
            mobile: "9876543210".into(),
            country: "India".into(),
            state: "Karnataka".into(),
            company_name: "Acme".into(),
            designation: "Software Developer".into(),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate_roundtrip() {
        let store = MemoryStore::new();
        let keys = JwtKeys::from_ref(&AppState::fake());

        let user = register_user(&store, signup("jane@example.com", "hunter2hunter2"))
            .await
            .expect("register");
        assert_eq!(user.email, "jane@example.com");
        assert_ne!(user.password_hash, "hunter2hunter2");

        let (authed, token) =
            authenticate_user(&store, &keys, "jane@example.com", "hunter2hunter2")
                .await
                .expect("authenticate");
        assert_eq!(authed.id, user.id);

        let claims = keys.verify(&token).expect("token verifies");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "jane@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        register_user(&store, signup("dup@example.com", "longenough"))
            .await
            .expect("first registration");
        let err = register_user(&store, signup("DUP@Example.COM", "longenough"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let store = MemoryStore::new();
        let keys = JwtKeys::from_ref(&AppState::fake());
        register_user(&store, signup("jane@example.com", "hunter2hunter2"))
            .await
            .expect("register");

        let wrong_password = authenticate_user(&store, &keys, "jane@example.com", "bad-password")
            .await
            .unwrap_err();
        let unknown_email = authenticate_user(&store, &keys, "nobody@example.com", "whatever1")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn registration_validates_profile_fields() {
        let store = MemoryStore::new();

        let short_password = register_user(&store, signup("a@example.com", "short"))
            .await
            .unwrap_err();
        assert!(matches!(short_password, ApiError::Validation(_)));

        let mut bad_email = signup("not-an-email", "longenough");
        bad_email.email = "not-an-email".into();
        assert!(matches!(
            register_user(&store, bad_email).await.unwrap_err(),
            ApiError::Validation(_)
        ));

        let mut bad_mobile = signup("b@example.com", "longenough");
        bad_mobile.mobile = "12345".into();
        assert!(matches!(
            register_user(&store, bad_mobile).await.unwrap_err(),
            ApiError::Validation(_)
        ));

        let mut bad_designation = signup("c@example.com", "longenough");
        bad_designation.designation = "CTO".into();
        assert!(matches!(
            register_user(&store, bad_designation).await.unwrap_err(),
            ApiError::Validation(_)
        ));

        let mut missing_field = signup("d@example.com", "longenough");
        missing_field.country = "  ".into();
        assert!(matches!(
            register_user(&store, missing_field).await.unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn authenticate_requires_both_fields() {
        let store = MemoryStore::new();
        let keys = JwtKeys::from_ref(&AppState::fake());
        let err = authenticate_user(&store, &keys, "jane@example.com", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
