use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Designation, User};

/// JWT claims issued on successful sign-in. Binds the user id and email.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // normalized email at issuance time
    pub exp: usize,    // expiration time
    pub iat: usize,    // issued at
    pub iss: String,   // issuer
    pub aud: String,   // audience
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Request body for signup. Enum-valued fields arrive as strings and are
/// validated against the closed sets in the service, so a bad value yields
/// the domain validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub country: String,
    pub state: String,
    pub company_name: String,
    pub designation: String,
}

/// Request body for signin.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after signin.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Public part of the user returned to the client. Never carries the
/// password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub country: String,
    pub state: String,
    pub company_name: String,
    pub designation: Designation,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            mobile: user.mobile,
            country: user.country,
            state: user.state,
            company_name: user.company_name,
            designation: user.designation,
            created_at: user.created_at,
        }
    }
}
