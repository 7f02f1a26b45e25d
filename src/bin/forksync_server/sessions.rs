//! Cookie sessions and the CSRF check for mutating routes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use forksync::remote::{CSRF_HEADER, SESSION_COOKIE, csrf_token_from_cookies};

use super::*;

pub(super) const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
pub(super) const MAX_SESSIONS: usize = 1024;

/// Live sessions keyed by the hash of their secret. Entries expire after the TTL; when
/// full, the session closest to expiry is evicted.
#[derive(Debug)]
pub(super) struct SessionStore {
    ttl: Duration,
    max: usize,
    expires: HashMap<String, Instant>,
}

impl SessionStore {
    pub(super) fn new(ttl: Duration, max: usize) -> Self {
        Self {
            ttl,
            max: max.max(1),
            expires: HashMap::new(),
        }
    }

    pub(super) fn ttl(&self) -> Duration {
        self.ttl
    }

    pub(super) fn len(&self) -> usize {
        self.expires.len()
    }

    pub(super) fn insert(&mut self, hash: String, now: Instant) {
        self.prune(now);
        while self.expires.len() >= self.max {
            let Some(oldest) = self
                .expires
                .iter()
                .min_by_key(|(_, exp)| **exp)
                .map(|(h, _)| h.clone())
            else {
                break;
            };
            self.expires.remove(&oldest);
        }
        self.expires.insert(hash, now + self.ttl);
    }

    pub(super) fn is_live(&self, hash: &str, now: Instant) -> bool {
        self.expires.get(hash).is_some_and(|exp| *exp > now)
    }

    pub(super) fn remove(&mut self, hash: &str) -> bool {
        self.expires.remove(hash).is_some()
    }

    pub(super) fn prune(&mut self, now: Instant) {
        self.expires.retain(|_, exp| *exp > now);
    }
}

pub(super) fn hash_token(secret: &str) -> String {
    blake3::hash(secret.as_bytes()).to_hex().to_string()
}

pub(super) fn generate_session_secret() -> Result<String> {
    // 32 bytes of entropy, hex-encoded.
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("getrandom: {:?}", e))?;
    let mut out = String::with_capacity(64);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

pub(super) fn session_secret(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(csrf_token_from_cookies)
}

/// The anti-forgery header must repeat the session cookie.
pub(super) fn csrf_ok(headers: &HeaderMap) -> bool {
    let Some(secret) = session_secret(headers) else {
        return false;
    };
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| token == secret)
}

#[derive(Debug, serde::Deserialize)]
pub(super) struct LoginQuery {
    #[serde(default)]
    token: Option<String>,
}

pub(super) async fn login(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LoginQuery>,
) -> Response {
    let Some(token) = q.token else {
        return unauthorized("login token required");
    };
    if hash_token(&token) != state.login_token_hash {
        tracing::warn!("login rejected");
        return unauthorized("invalid login token");
    }

    let secret = match generate_session_secret() {
        Ok(s) => s,
        Err(err) => return internal_error(err),
    };
    let max_age = {
        let mut sessions = state.sessions.write().await;
        sessions.insert(hash_token(&secret), Instant::now());
        tracing::info!(live = sessions.len(), "session started");
        sessions.ttl().as_secs()
    };

    let cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE, secret, max_age
    );
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&state.app_url),
    )
        .into_response()
}

pub(super) async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(secret) = session_secret(&headers) {
        state.sessions.write().await.remove(&hash_token(&secret));
        tracing::info!("session ended");
    }
    let cookie = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&state.app_url),
    )
        .into_response()
}

pub(super) async fn require_session(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(secret) = session_secret(req.headers()) else {
        return unauthorized("unauthorized");
    };
    let known = state
        .sessions
        .read()
        .await
        .is_live(&hash_token(&secret), Instant::now());
    if !known {
        return unauthorized("unauthorized");
    }
    next.run(req).await
}

#[cfg(test)]
#[path = "../../tests/bin/forksync_server/sessions_tests.rs"]
mod tests;
