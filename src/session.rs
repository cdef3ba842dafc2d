use crate::config;

use base64::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD, decode_config, encode_config};
use jwt_simple::algorithms::MACLike;
use jwt_simple::prelude::{
    Claims, Duration as JwtDuration, HS256Key, NoCustomClaims, VerificationOptions,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use std::collections::HashSet;

pub(crate) const SESSION_COOKIE: &str = "subshop_session";
pub(crate) const ADMIN_COOKIE: &str = "subshop_admin";

const CUSTOMER_AUDIENCE: &str = "customer";
const ADMIN_AUDIENCE: &str = "admin";

/// Signs the two session cookies: the customer cookie carries the user id as
/// subject and survives reloads for the configured TTL; the admin cookie is
/// browser-session scoped (no Max-Age), mirroring the ephemeral admin flag.
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    key: HS256Key,
    issuer: String,
    token_ttl: time::Duration,
    cookie_secure: bool,
}

#[derive(Debug)]
pub enum SessionError {
    InvalidKey,
    InvalidToken,
    MissingExpiry,
    MissingSubject,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidKey => f.write_str("invalid session key"),
            SessionError::InvalidToken => f.write_str("invalid session token"),
            SessionError::MissingExpiry => f.write_str("session token missing expiry"),
            SessionError::MissingSubject => f.write_str("session token missing subject"),
        }
    }
}

impl SessionState {
    pub(crate) fn from_config(config: &config::AppConfig) -> Result<Self, SessionError> {
        let key_bytes = decode_key(&config.session.key)?;
        let key = HS256Key::from_bytes(&key_bytes);

        Ok(Self {
            key,
            issuer: config.app_name.clone(),
            token_ttl: config.session.token_ttl,
            cookie_secure: config.session.cookie_secure,
        })
    }

    pub(crate) fn issue_user_token(&self, user_id: &str) -> Result<String, SessionError> {
        self.issue_token(user_id, CUSTOMER_AUDIENCE)
    }

    pub(crate) fn issue_admin_token(&self) -> Result<String, SessionError> {
        self.issue_token("admin", ADMIN_AUDIENCE)
    }

    fn issue_token(&self, subject: &str, audience: &str) -> Result<String, SessionError> {
        let ttl_seconds = self.token_ttl.whole_seconds();
        if ttl_seconds <= 0 {
            return Err(SessionError::InvalidToken);
        }
        let claims = Claims::create(JwtDuration::from_secs(ttl_seconds as u64))
            .with_subject(subject)
            .with_issuer(&self.issuer)
            .with_audience(audience);
        self.key
            .authenticate(claims)
            .map_err(|_| SessionError::InvalidToken)
    }

    /// Returns the user id the token was issued for.
    pub(crate) fn verify_user_token(&self, token: &str) -> Result<String, SessionError> {
        self.verify_token(token, CUSTOMER_AUDIENCE)
    }

    pub(crate) fn verify_admin_token(&self, token: &str) -> Result<(), SessionError> {
        self.verify_token(token, ADMIN_AUDIENCE).map(|_| ())
    }

    fn verify_token(&self, token: &str, audience: &str) -> Result<String, SessionError> {
        let mut options = VerificationOptions::default();
        let mut issuers = HashSet::new();
        issuers.insert(self.issuer.clone());
        options.allowed_issuers = Some(issuers);
        let mut audiences = HashSet::new();
        audiences.insert(audience.to_string());
        options.allowed_audiences = Some(audiences);

        let claims = self
            .key
            .verify_token::<NoCustomClaims>(token, Some(options))
            .map_err(|_| SessionError::InvalidToken)?;

        if claims.expires_at.is_none() {
            return Err(SessionError::MissingExpiry);
        }

        let subject = claims.subject.ok_or(SessionError::MissingSubject)?;
        if subject.trim().is_empty() {
            return Err(SessionError::MissingSubject);
        }

        Ok(subject)
    }

    pub(crate) fn user_cookie(&self, token: &str) -> String {
        let max_age = self.token_ttl.whole_seconds().max(0);
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    // No Max-Age: the admin flag does not outlive the browser session.
    pub(crate) fn admin_cookie(&self, token: &str) -> String {
        let mut cookie = format!("{ADMIN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub(crate) fn clear_user_cookie(&self) -> String {
        self.clear_cookie(SESSION_COOKIE)
    }

    pub(crate) fn clear_admin_cookie(&self) -> String {
        self.clear_cookie(ADMIN_COOKIE)
    }

    fn clear_cookie(&self, name: &str) -> String {
        let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

fn decode_key(raw: &str) -> Result<Vec<u8>, SessionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidKey);
    }

    let decoded = decode_config(trimmed, URL_SAFE_NO_PAD)
        .or_else(|_| decode_config(trimmed, STANDARD))
        .or_else(|_| decode_config(trimmed, STANDARD_NO_PAD))
        .map_err(|_| SessionError::InvalidKey)?;

    if decoded.is_empty() {
        return Err(SessionError::InvalidKey);
    }

    Ok(decoded)
}

pub fn generate_session_key() -> Result<String, SessionError> {
    let mut rng = OsRng;
    generate_session_key_with_rng(&mut rng)
}

pub(crate) fn generate_session_key_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<String, SessionError> {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    let encoded = encode_config(bytes, URL_SAFE_NO_PAD);
    if encoded.is_empty() {
        return Err(SessionError::InvalidKey);
    }
    Ok(encoded)
}
