// src/middleware.rs

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "admin_session";

/// Identyfikator sesji panelu przypięty do żądania.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

/// Każda przeglądarka dostaje własną sesję szkiców, identyfikowaną ciasteczkiem.
pub async fn ensure_admin_session(jar: CookieJar, mut req: Request, next: Next) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

    let session_id = existing.unwrap_or_else(Uuid::new_v4);
    req.extensions_mut().insert(SessionId(session_id));

    let mut response = next.run(req).await;

    if existing.is_none() {
        let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(1))
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Nie można ustawić ciasteczka sesji: {}", e),
        }
    }
    response
}
