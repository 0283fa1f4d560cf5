/// Session-backed token storage and inbound token resolution
///
/// A successful login (or a request carrying the X-Enctoken header)
/// seeds an in-memory session keyed by an opaque cookie, so callers
/// only have to present the raw token once.
use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;

pub const SESSION_COOKIE: &str = "kb_session";
pub const ENCTOKEN_HEADER: &str = "x-enctoken";

/// Token attached to the request once resolution succeeds
#[derive(Debug, Clone)]
pub struct ResolvedToken(pub String);

#[derive(Debug, Clone)]
struct Session {
    enctoken: String,
    created_at: DateTime<Utc>,
}

/// In-memory session store keyed by opaque session ids
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Store a token in a session and hand the session id back.
    ///
    /// Expired entries are swept on every insert, and a live session
    /// already holding the same token is reused rather than
    /// duplicated. Callers that send the X-Enctoken header on every
    /// request therefore pin exactly one entry.
    pub async fn insert(&self, enctoken: String) -> String {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| now - session.created_at < self.ttl);

        if let Some(session_id) = sessions
            .iter()
            .find(|(_, session)| session.enctoken == enctoken)
            .map(|(session_id, _)| session_id.clone())
        {
            return session_id;
        }

        let session_id = Uuid::new_v4().to_string();
        sessions.insert(
            session_id.clone(),
            Session {
                enctoken,
                created_at: now,
            },
        );
        session_id
    }

    /// Look up the token for a session id; stale entries are evicted
    pub async fn enctoken_for(&self, session_id: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return None,
                Some(session) if Utc::now() - session.created_at < self.ttl => {
                    return Some(session.enctoken.clone());
                }
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(session_id);
        debug!("Dropped expired session {}", session_id);
        None
    }
}

/// Build the Set-Cookie value for a freshly issued session
pub fn session_cookie(session_id: &str, ttl_hours: i64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        session_id,
        ttl_hours * 3600
    )
}

/// Pull a named cookie out of the request headers
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Middleware guarding every Kite-facing route.
///
/// Resolution order: session cookie first, then the X-Enctoken header.
/// A header-borne token seeds a new session, and the Set-Cookie for it
/// rides out on the response so the caller can drop the header next
/// time. Requests with neither are answered 401 without reaching the
/// handler.
pub async fn resolve_enctoken(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut issued_cookie: Option<String> = None;

    let session_token = match cookie_value(request.headers(), SESSION_COOKIE) {
        Some(session_id) => state.sessions.enctoken_for(&session_id).await,
        None => None,
    };

    let enctoken = match session_token {
        Some(token) => Some(token),
        None => {
            let header_token = request
                .headers()
                .get(ENCTOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(String::from);
            if let Some(token) = &header_token {
                let session_id = state.sessions.insert(token.clone()).await;
                issued_cookie = Some(session_cookie(&session_id, state.config.session_ttl_hours));
                debug!("Seeded session from {} header", ENCTOKEN_HEADER);
            }
            header_token
        }
    };

    let Some(enctoken) = enctoken else {
        return ApiError::MissingToken.into_response();
    };

    request.extensions_mut().insert(ResolvedToken(enctoken));
    let mut response = next.run(request).await;

    if let Some(cookie) = issued_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = SessionStore::new(24);
        let session_id = store.insert("tok-abc123".to_string()).await;
        assert_eq!(
            store.enctoken_for(&session_id).await.as_deref(),
            Some("tok-abc123")
        );
    }

    #[tokio::test]
    async fn test_unknown_session_id() {
        let store = SessionStore::new(24);
        assert!(store.enctoken_for("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_evicted() {
        let store = SessionStore::new(0);
        let session_id = store.insert("tok-abc123".to_string()).await;
        assert!(store.enctoken_for(&session_id).await.is_none());
        assert_eq!(store.sessions.read().await.len(), 0);
    }

    #[tokio::test]
    async fn test_insert_reuses_live_session_for_same_token() {
        let store = SessionStore::new(24);
        let first = store.insert("tok-abc123".to_string()).await;
        let second = store.insert("tok-abc123".to_string()).await;
        assert_eq!(first, second);
        assert_eq!(store.sessions.read().await.len(), 1);

        let other = store.insert("tok-xyz789".to_string()).await;
        assert_ne!(first, other);
        assert_eq!(store.sessions.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_sweeps_expired_sessions() {
        let store = SessionStore::new(0);
        store.insert("tok-1".to_string()).await;
        store.insert("tok-2".to_string()).await;
        store.insert("tok-3".to_string()).await;
        // Each insert found the previous entry already stale
        assert_eq!(store.sessions.read().await.len(), 1);
    }

    #[test]
    fn test_cookie_value_picks_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; kb_session=abc-123; lang=en"),
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc-123")
        );
        assert_eq!(cookie_value(&headers, "lang").as_deref(), Some("en"));
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn test_cookie_value_scans_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("kb_session=abc-123"));
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc-123")
        );
    }

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("abc-123", 24);
        assert_eq!(
            cookie,
            "kb_session=abc-123; Max-Age=86400; Path=/; HttpOnly; SameSite=Lax"
        );
    }
}
