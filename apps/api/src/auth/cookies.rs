use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::TimeDelta;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE_NAME: &str = "aegis_session";

/// Returns the session token from any `Cookie` header, if present and non-empty.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

/// Builds the `Set-Cookie` header that stores a freshly issued token.
pub fn session_cookie_header(
    token: String,
    ttl: TimeDelta,
    secure: bool,
) -> (HeaderName, String) {
    let cookie = Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::seconds(ttl.num_seconds()))
        .build();

    (SET_COOKIE, cookie.to_string())
}

/// Builds the `Set-Cookie` header that removes the session cookie.
pub fn clear_session_cookie_header(secure: bool) -> (HeaderName, String) {
    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::ZERO)
        .build();

    (SET_COOKIE, cookie.to_string())
}

/// Appends a header pair to a response header map, skipping invalid values.
pub(crate) fn append_header(headers: &mut HeaderMap, (name, value): (HeaderName, String)) {
    if let Ok(value) = HeaderValue::from_str(value.as_str()) {
        headers.append(name, value);
    }
}
