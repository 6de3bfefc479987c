//! Signed session cookie carrying the logged-in identity.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};
use time::Duration;
use tracing::debug;

use crate::application::auth::SessionUser;

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct SessionConfig {
    key: Key,
    secure: bool,
    max_age: Duration,
}

impl SessionConfig {
    /// The signing key is derived from `secret`, so any length works.
    pub fn new(secret: &str, secure: bool, max_age: Duration) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(&digest[..]),
            secure,
            max_age,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn issue(
        &self,
        jar: SignedCookieJar,
        user: &SessionUser,
    ) -> Result<SignedCookieJar, serde_json::Error> {
        let value = serde_json::to_string(user)?;
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(self.max_age)
            .secure(self.secure);
        Ok(jar.add(cookie))
    }

    pub fn clear(&self, jar: SignedCookieJar) -> SignedCookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    /// Missing, tampered or malformed cookies all read as no session.
    pub fn current_user(&self, jar: &SignedCookieJar) -> Option<SessionUser> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match serde_json::from_str(cookie.value()) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(
                    target = "postdesk::http::session",
                    error = %err,
                    "discarding unreadable session cookie"
                );
                None
            }
        }
    }

    pub fn from_headers(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let jar = SignedCookieJar::from_headers(headers, self.key.clone());
        self.current_user(&jar)
    }
}
