//! Anonymous cookie sessions.
//!
//! Each browser gets a random `session_id` cookie on its first request to a report endpoint.
//! The patient id is derived from it with [`PatientId::from_session`], so the server never
//! stores anything that identifies a person.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use saathi_types::PatientId;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;
const MAX_SESSION_ID_LEN: usize = 128;

/// The caller's session, available to handlers as `Extension<Session>`.
#[derive(Clone, Debug)]
pub struct Session {
    pub session_id: String,
    pub patient_id: PatientId,
    pub is_new: bool,
}

impl Session {
    fn issue() -> Self {
        Self::from_id(Uuid::new_v4().to_string(), true)
    }

    fn from_id(session_id: String, is_new: bool) -> Self {
        Self {
            patient_id: PatientId::from_session(&session_id),
            session_id,
            is_new,
        }
    }
}

fn is_valid_session_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SESSION_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Finds the session cookie among all `Cookie` headers.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| is_valid_session_id(value))
}

pub fn session_cookie(session_id: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Max-Age={}; Path=/",
        SESSION_COOKIE, session_id, SESSION_MAX_AGE_SECS
    )
}

/// Resolves or issues the session, exposes it to handlers and sets the cookie for new sessions.
pub async fn session_layer(mut request: Request, next: Next) -> Response {
    let session = match session_from_headers(request.headers()) {
        Some(id) => Session::from_id(id, false),
        None => {
            let session = Session::issue();
            tracing::debug!("issued new session for patient {}", session.patient_id);
            session
        }
    };
    let set_cookie = session.is_new.then(|| session_cookie(&session.session_id));
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("could not encode session cookie: {:?}", e),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for cookie in cookies {
            map.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        map
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let map = headers(&["theme=dark; session_id=abc-123 ; lang=en"]);
        assert_eq!(session_from_headers(&map).as_deref(), Some("abc-123"));

        let map = headers(&["theme=dark", "session_id=second-header"]);
        assert_eq!(session_from_headers(&map).as_deref(), Some("second-header"));
    }

    #[test]
    fn rejects_missing_or_malformed_sessions() {
        assert!(session_from_headers(&headers(&[])).is_none());
        assert!(session_from_headers(&headers(&["session_id="])).is_none());
        assert!(session_from_headers(&headers(&["session_id=<script>"])).is_none());
        let long = format!("session_id={}", "a".repeat(MAX_SESSION_ID_LEN + 1));
        assert!(session_from_headers(&headers(&[&long])).is_none());
    }

    #[test]
    fn cookie_attributes() {
        assert_eq!(
            session_cookie("abc"),
            "session_id=abc; HttpOnly; SameSite=Lax; Max-Age=31536000; Path=/"
        );
    }

    #[test]
    fn same_session_same_patient() {
        let a = Session::from_id("abc".into(), false);
        let b = Session::from_id("abc".into(), false);
        assert_eq!(a.patient_id, b.patient_id);
        assert_ne!(Session::issue().session_id, Session::issue().session_id);
    }
}
