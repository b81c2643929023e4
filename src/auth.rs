//! Session authentication: password hashing, the session cookie, and the
//! `CurrentDriver` extractor every protected handler composes with.

use anyhow::anyhow;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use model::entities::driver;
use sea_orm::EntityTrait;
use tracing::{debug, warn};

use crate::schemas::{AppState, Session};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "taxipark_session";

/// Where unauthenticated requests are redirected to.
pub const LOGIN_PATH: &str = "/login";

/// Hash a plain-text password into an argon2 PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a plain-text password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Cookie line that installs a session token.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Cookie line that expires the session cookie on the client.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Pull the session token out of the `Cookie` header, if any.
fn session_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Rejection for unauthenticated requests: a redirect to the login route,
/// never a success status.
#[derive(Debug)]
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// The authenticated driver behind the current request.
///
/// This is the single access-control gate: handlers take a `CurrentDriver`
/// argument and get the cookie parsing, session lookup, and driver load for
/// free. Missing or stale sessions reject with [`AuthRedirect`].
#[derive(Debug)]
pub struct CurrentDriver {
    pub driver: driver::Model,
    pub session_token: String,
    pub session: Session,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentDriver {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            debug!(uri = %parts.uri, "No session cookie on request");
            return Err(AuthRedirect);
        };

        let Some(session) = state.sessions.get(&token).await else {
            debug!(uri = %parts.uri, "Session token not found in store");
            return Err(AuthRedirect);
        };

        let driver = match driver::Entity::find_by_id(session.driver_id)
            .one(&state.db)
            .await
        {
            Ok(Some(driver)) => driver,
            Ok(None) => {
                // The account was deleted while the session was live.
                warn!(driver_id = session.driver_id, "Session references a missing driver");
                state.sessions.invalidate(&token).await;
                return Err(AuthRedirect);
            }
            Err(db_error) => {
                warn!("Failed to load driver for session: {}", db_error);
                return Err(AuthRedirect);
            }
        };

        debug!(uri = %parts.uri, username = %driver.username, "Authenticated request");
        Ok(CurrentDriver {
            driver,
            session_token: token,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cur3 p4ssw0rd").unwrap();
        assert!(verify_password("s3cur3 p4ssw0rd", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("token");
        assert!(cookie.starts_with("taxipark_session=token"));
        assert!(cookie.contains("HttpOnly"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
