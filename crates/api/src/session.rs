//! The `be_access` session cookie.
//!
//! The cookie only transports the upstream bearer token; the BFF keeps no
//! session store of its own.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

pub const SESSION_COOKIE: &str = "be_access";

/// Cookie lifetime, matching the upstream access-token lifetime.
pub const SESSION_MAX_AGE_SECS: u64 = 900;

/// Token from the `be_access` cookie, falling back to a Bearer header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_token(headers).or_else(|| bearer_token(headers))
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Whether `token` can be stored verbatim as a cookie value.
pub fn is_cookie_safe(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b',' | b';' | b'\\'))
}

/// `Set-Cookie` value that starts a session.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that ends a session.
pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_wins_over_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; be_access=tok-1"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-2"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("tok-1"));
    }

    #[test]
    fn bearer_header_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("be_access="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-2"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("tok-2"));
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("abc.def", true);
        assert!(cookie.starts_with("be_access=abc.def;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!session_cookie("abc", false).contains("Secure"));
        assert!(clear_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn unsafe_tokens_are_detected() {
        assert!(is_cookie_safe("eyJhbGci.eyJzdWIi.sig-_"));
        assert!(!is_cookie_safe("a;b"));
        assert!(!is_cookie_safe("a b"));
        assert!(!is_cookie_safe(""));
    }
}
