//! Session authentication: PBKDF2 password hashes and HS256 session tokens.
//!
//! Stored password hashes use the `PBKDF2:SHA-256:<iterations>:<salt>:<hash>`
//! format (base64 salt and hash). Sessions are stateless JWTs carried in the
//! HttpOnly `admin_token` cookie, or an `Authorization: Bearer` header for
//! non-browser clients.
//!
//! The WebSocket path never rejects on auth: an absent or invalid token
//! resolves to [`Role::Guest`]. Only the admin REST routes hard-fail.

use crate::config::AuthConfig;
use crate::error::AppError;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rollcall_core::Role;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "admin_token";

const HASH_PREFIX: &str = "PBKDF2";
const HASH_ALGORITHM: &str = "SHA-256";
const SALT_LEN: usize = 16;
const DERIVED_LEN: usize = 32;

/// Authentication failures. Deliberately coarse: callers never learn which
/// part of a credential was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username unknown or password mismatch.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A stored hash is not in the expected format.
    #[error("malformed stored password hash")]
    MalformedHash,

    /// The presented session token failed validation.
    #[error("invalid session token")]
    InvalidToken,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin account id.
    pub sub: String,
    /// Login name, echoed back to the frontend.
    pub username: String,
    /// Privilege level baked in at login time.
    pub role: Role,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Hash a password for storage.
#[must_use]
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut derived = [0u8; DERIVED_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);
    format!(
        "{HASH_PREFIX}:{HASH_ALGORITHM}:{iterations}:{}:{}",
        BASE64.encode(salt),
        BASE64.encode(derived)
    )
}

/// Verify a candidate password against a stored hash, in constant time with
/// respect to the hash contents.
///
/// # Errors
///
/// Returns [`AuthError::MalformedHash`] if the stored value is not in the
/// `PBKDF2:SHA-256:iter:salt:hash` format.
pub fn verify_password(stored: &str, candidate: &str) -> Result<bool, AuthError> {
    let parts: Vec<&str> = stored.split(':').collect();
    let &[prefix, algorithm, iterations, salt, hash] = parts.as_slice() else {
        return Err(AuthError::MalformedHash);
    };
    if prefix != HASH_PREFIX || algorithm != HASH_ALGORITHM {
        return Err(AuthError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| AuthError::MalformedHash)?;
    let salt = BASE64.decode(salt).map_err(|_| AuthError::MalformedHash)?;
    let expected = BASE64.decode(hash).map_err(|_| AuthError::MalformedHash)?;

    let mut derived = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(candidate.as_bytes(), &salt, iterations, &mut derived);
    Ok(derived.ct_eq(&expected).into())
}

/// Issue a session token for a logged-in admin.
///
/// # Errors
///
/// Returns [`AuthError::InvalidToken`] if signing fails.
pub fn issue_token(
    config: &AuthConfig,
    account_id: i64,
    username: &str,
    role: Role,
) -> Result<String, AuthError> {
    let exp = chrono::Utc::now().timestamp() + config.session_ttl_hours * 3600;
    let claims = Claims {
        sub: account_id.to_string(),
        username: username.to_string(),
        role,
        exp,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validate a session token and return its claims.
///
/// # Errors
///
/// Returns [`AuthError::InvalidToken`] for a bad signature, wrong algorithm,
/// or expired token.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, AuthError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Extract a session token from the `admin_token` cookie or a bearer header.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for cookie in cookies.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == SESSION_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

/// Resolve the caller's role, degrading to guest on any auth problem.
#[must_use]
pub fn resolve_role(config: &AuthConfig, headers: &HeaderMap) -> Role {
    session_token(headers)
        .and_then(|token| verify_token(config, &token).ok())
        .map_or(Role::Guest, |claims| claims.role)
}

/// Require a privileged session; the admin REST routes call this first.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] without detail if the token is
/// missing, invalid, or carries a non-privileged role.
pub fn require_admin(config: &AuthConfig, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = session_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(config, &token).map_err(|_| AppError::Unauthorized)?;
    if claims.role.is_privileged() {
        Ok(claims)
    } else {
        Err(AppError::Unauthorized)
    }
}

/// `Set-Cookie` value installing a session.
#[must_use]
pub fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=None; Secure",
        ttl_hours * 3600
    )
}

/// `Set-Cookie` value clearing the session.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=None; Secure")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            session_ttl_hours: 12,
        }
    }

    #[test]
    fn password_round_trip() {
        let stored = hash_password("correct horse", 1000);
        assert!(stored.starts_with("PBKDF2:SHA-256:1000:"));
        assert!(verify_password(&stored, "correct horse").unwrap());
        assert!(!verify_password(&stored, "battery staple").unwrap());
    }

    #[test]
    fn malformed_hashes_are_rejected_not_false() {
        assert!(matches!(
            verify_password("plainly-not-a-hash", "pw"),
            Err(AuthError::MalformedHash)
        ));
        assert!(matches!(
            verify_password("SCRYPT:SHA-256:1000:c2FsdA==:aGFzaA==", "pw"),
            Err(AuthError::MalformedHash)
        ));
        assert!(matches!(
            verify_password("PBKDF2:SHA-256:lots:c2FsdA==:aGFzaA==", "pw"),
            Err(AuthError::MalformedHash)
        ));
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let config = test_config();
        let token = issue_token(&config, 7, "ops", Role::Super).unwrap();
        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "ops");
        assert_eq!(claims.role, Role::Super);
    }

    #[test]
    fn tampered_and_expired_tokens_fail() {
        let config = test_config();
        assert!(verify_token(&config, "garbage.token.here").is_err());

        let other = AuthConfig {
            jwt_secret: "different-secret".to_string(),
            session_ttl_hours: 12,
        };
        let token = issue_token(&other, 7, "ops", Role::Admin).unwrap();
        assert!(verify_token(&config, &token).is_err());

        let expired = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            session_ttl_hours: -2,
        };
        let token = issue_token(&expired, 7, "ops", Role::Admin).unwrap();
        assert!(verify_token(&config, &token).is_err());
    }

    #[test]
    fn token_extraction_prefers_cookie_then_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));

        headers.insert(
            header::COOKIE,
            "theme=dark; admin_token=from-cookie; lang=id".parse().unwrap(),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn role_resolution_degrades_to_guest() {
        let config = test_config();
        let mut headers = HeaderMap::new();
        assert_eq!(resolve_role(&config, &headers), Role::Guest);

        headers.insert(header::COOKIE, "admin_token=not-a-jwt".parse().unwrap());
        assert_eq!(resolve_role(&config, &headers), Role::Guest);

        let token = issue_token(&config, 1, "ops", Role::Admin).unwrap();
        headers.insert(
            header::COOKIE,
            format!("admin_token={token}").parse().unwrap(),
        );
        assert_eq!(resolve_role(&config, &headers), Role::Admin);
    }

    #[test]
    fn require_admin_refuses_guests() {
        let config = test_config();
        let headers = HeaderMap::new();
        assert!(require_admin(&config, &headers).is_err());

        let mut headers = HeaderMap::new();
        let token = issue_token(&config, 1, "ops", Role::Guest).unwrap();
        headers.insert(
            header::COOKIE,
            format!("admin_token={token}").parse().unwrap(),
        );
        assert!(require_admin(&config, &headers).is_err());
    }
}
