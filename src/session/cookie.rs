use chrono::Duration;
use rocket::http::{Cookie, SameSite};

/// `<name>=<token>; HttpOnly; Path=/; Max-Age=<ttl>`
pub(super) fn session_cookie(name: &str, token: &str, ttl: Duration) -> Cookie<'static> {
    Cookie::build((name.to_string(), token.to_string()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(rocket::time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Rocket turns this into the same cookie with an empty value and `Max-Age=0`.
pub(super) fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_string()).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_contract_attributes() {
        let cookie = session_cookie("sessionId", "abc123", Duration::hours(24));
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("sessionId=abc123"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=86400"));
    }
}
