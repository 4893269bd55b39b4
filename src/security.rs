use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Claims carried by an access token. `sub` is the username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, username: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
        self.sign_claims(&Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    fn sign_claims(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Check signature and expiry. Any failure is reported as `Unauthenticated`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|err| {
            tracing::warn!(error = %err, "rejected access token");
            AppError::credentials()
        })?;
        if data.claims.sub.is_empty() {
            return Err(AppError::credentials());
        }
        Ok(data.claims)
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Returns `false` for a wrong password and for an unparsable stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_verifies_and_carries_username() {
        let keys = JwtKeys::new("test-secret", Duration::minutes(30));
        let token = keys.sign("alice").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtKeys::new("secret-a", Duration::minutes(30)).sign("alice").unwrap();
        let err = JwtKeys::new("secret-b", Duration::minutes(30)).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("test-secret", Duration::minutes(30));
        let past = Utc::now() - Duration::hours(2);
        let token = keys
            .sign_claims(&Claims {
                sub: "alice".into(),
                iat: past.timestamp(),
                exp: (past + Duration::minutes(30)).timestamp(),
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn malformed_and_tampered_tokens_are_rejected() {
        let keys = JwtKeys::new("test-secret", Duration::minutes(30));
        assert!(keys.verify("not-a-token").is_err());

        let token = keys.sign("alice").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = keys.sign("mallory").unwrap();
        let forged: Vec<&str> = forged_payload.split('.').collect();
        parts[1] = forged[1];
        assert!(keys.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }
}
