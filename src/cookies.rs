//! Cookie names, builders, and parsing shared by the middleware layers and
//! the auth handlers.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::{AuthError, Result};
use crate::security::jwt::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const CSRF_COOKIE: &str = "quill-csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Anti-forgery tokens outlive access tokens so a long-idle page can still
/// submit, but they do rotate within a working day.
pub const CSRF_TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

fn secure_suffix(secure: bool) -> &'static str {
    if secure {
        "; Secure"
    } else {
        ""
    }
}

pub fn access_cookie(token: &str, secure: bool) -> String {
    format!(
        "{ACCESS_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={ACCESS_TOKEN_TTL_SECS}{}",
        secure_suffix(secure)
    )
}

pub fn refresh_cookie(token: &str, secure: bool) -> String {
    format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={REFRESH_TOKEN_TTL_SECS}{}",
        secure_suffix(secure)
    )
}

/// The anti-forgery cookie is deliberately not HttpOnly: the double-submit
/// scheme requires the frontend to read it back into a request header.
pub fn csrf_cookie(token: &str, secure: bool) -> String {
    format!(
        "{CSRF_COOKIE}={token}; Path=/; SameSite=Lax; Max-Age={CSRF_TOKEN_TTL_SECS}{}",
        secure_suffix(secure)
    )
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    format!(
        "{name}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0{}",
        secure_suffix(secure)
    )
}

pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let trimmed = part.trim();
        let Some((name, value)) = trimmed.split_once('=') else {
            continue;
        };
        if name == cookie_name {
            return Some(value.to_string());
        }
    }
    None
}

pub fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AuthError::Internal(format!("invalid header value: {e}")))
}

/// Byte-for-byte comparison that does not short-circuit on the first
/// mismatch.
pub fn constant_time_equal(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff = 0u8;
    for i in 0..a_bytes.len() {
        diff |= a_bytes[i] ^ b_bytes[i];
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_attributes() {
        let c = access_cookie("tok", true);
        assert!(c.starts_with("access_token=tok;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=900"));
        assert!(c.contains("SameSite=Lax"));
        assert!(c.ends_with("Secure"));

        let c = refresh_cookie("tok", false);
        assert!(c.contains("Max-Age=604800"));
        assert!(!c.contains("Secure"));

        let c = csrf_cookie("tok", true);
        assert!(!c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=28800"));

        let c = clear_cookie(ACCESS_COOKIE, true);
        assert!(c.starts_with("access_token=;"));
        assert!(c.contains("Max-Age=0"));
    }

    #[test]
    fn cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; access_token=abc.def.ghi; b=2"),
        );
        assert_eq!(
            get_cookie_value(&headers, "access_token").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
        assert_eq!(get_cookie_value(&HeaderMap::new(), "a"), None);
    }

    #[test]
    fn comparison_requires_exact_match() {
        assert!(constant_time_equal("token", "token"));
        assert!(!constant_time_equal("token", "token2"));
        assert!(!constant_time_equal("token", "Token"));
        assert!(!constant_time_equal("", "x"));
        assert!(constant_time_equal("", ""));
    }
}
