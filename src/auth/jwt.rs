use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use model::entities::user::{self, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtSettings;

/// Clock skew tolerated when checking `exp`, in seconds
pub const LEEWAY_SECONDS: u64 = 30;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    Creation(String),
    #[error("Token validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_token(settings: &JwtSettings, user: &user::Model) -> Result<IssuedToken, JwtError> {
    let now = Utc::now();
    let expires_at = now + Duration::minutes(settings.access_token_minutes);
    let claims = Claims {
        sub: user.id.to_string(),
        name: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        iss: settings.issuer.clone(),
        aud: settings.audience.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| JwtError::Creation(e.to_string()))?;

    Ok(IssuedToken { token, expires_at })
}

/// Checks signature, issuer, audience and expiry.
pub fn decode_token(settings: &JwtSettings, token: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[settings.issuer.as_str()]);
    validation.set_audience(&[settings.audience.as_str()]);
    validation.leeway = LEEWAY_SECONDS;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| JwtError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "unit-test-secret-unit-test-secret".to_string(),
            issuer: "rentwise".to_string(),
            audience: "rentwise-clients".to_string(),
            access_token_minutes: 60,
        }
    }

    fn user() -> user::Model {
        user::Model {
            id: 7,
            username: "manager".to_string(),
            email: "manager@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Manager,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_issue_and_decode() {
        let issued = issue_token(&settings(), &user()).unwrap();
        let claims = decode_token(&settings(), &issued.token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.name, "manager");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_wrong_audience_or_secret_is_rejected() {
        let issued = issue_token(&settings(), &user()).unwrap();

        let mut other_audience = settings();
        other_audience.audience = "someone-else".to_string();
        assert!(decode_token(&other_audience, &issued.token).is_err());

        let mut other_secret = settings();
        other_secret.secret = "a-completely-different-secret-value".to_string();
        assert!(decode_token(&other_secret, &issued.token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected_after_leeway() {
        let mut expired = settings();
        expired.access_token_minutes = -5;
        let issued = issue_token(&expired, &user()).unwrap();

        assert!(decode_token(&settings(), &issued.token).is_err());
    }
}
