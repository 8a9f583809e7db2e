// src/response.rs

use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lol_html::{HtmlRewriter, Settings, element, html_content::ContentType};
use maud::Markup;
use serde_json::json;
use strum_macros::Display;
use tokio::fs;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Nagłówek `HX-Trigger` z powiadomieniem `showMessage` dla frontendu.
pub fn toast_headers(kind: ToastKind, message: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let toast_payload = json!({
        "showMessage": {
            "message": message,
            "type": kind.to_string()
        }
    });
    // Wartości nagłówków muszą być ASCII
    let encoded = ascii_json(&toast_payload.to_string());
    if let Ok(val) = HeaderValue::from_str(&encoded) {
        headers.insert("HX-Trigger", val);
    }
    headers
}

fn ascii_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Wstawia fragment do `#content` szablonu `index.html`.
async fn serve_full_page(static_dir: &Path, content_markup: Markup) -> Result<Response, AppError> {
    let shell_path = static_dir.join("index.html");
    let shell_content = match fs::read(&shell_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(
                "Nie można wczytać pliku szablonu {}: {}",
                shell_path.display(),
                e
            );
            return Err(AppError::InternalServerError(
                "Błąd wczytywania szablonu strony".to_string(),
            ));
        }
    };

    let content_string = content_markup.into_string();
    let mut response_body = Vec::new();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("#content", |el| {
                el.set_inner_content(&content_string, ContentType::Html);
                // Bez tego HTMX nadpisałby treść po załadowaniu strony
                el.remove_attribute("hx-trigger");
                el.remove_attribute("hx-get");
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| response_body.extend_from_slice(c),
    );

    let rewrite_failed = |e: lol_html::errors::RewritingError| {
        tracing::error!("Błąd przetwarzania szablonu HTML: {}", e);
        AppError::InternalServerError("Błąd renderowania strony".to_string())
    };
    rewriter.write(&shell_content).map_err(rewrite_failed)?;
    rewriter.end().map_err(rewrite_failed)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(response_body))
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Dla żądań HTMX zwraca sam fragment, dla pełnych odświeżeń (F5) całą stronę.
pub async fn build_response(
    static_dir: &Path,
    headers: &HeaderMap,
    page_content: Markup,
) -> Result<Response, AppError> {
    if is_htmx(headers) {
        Ok(page_content.into_response())
    } else {
        serve_full_page(static_dir, page_content).await
    }
}

/// Fragment HTML z powiadomieniem.
pub fn with_toast(kind: ToastKind, message: &str, markup: Markup) -> Response {
    (toast_headers(kind, message), markup).into_response()
}

pub fn add_toast(response: &mut Response, kind: ToastKind, message: &str) {
    response.headers_mut().extend(toast_headers(kind, message));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(headers: &HeaderMap) -> serde_json::Value {
        let raw = headers.get("HX-Trigger").unwrap().to_str().unwrap();
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn toast_header_carries_message_and_type() {
        let headers = toast_headers(ToastKind::Success, "Category saved");
        assert_eq!(
            trigger(&headers),
            json!({"showMessage": {"message": "Category saved", "type": "success"}})
        );
    }

    #[test]
    fn non_ascii_messages_are_escaped_not_dropped() {
        let headers = toast_headers(ToastKind::Error, "Błąd: zażółć 🚀");
        assert_eq!(
            trigger(&headers)["showMessage"]["message"],
            "Błąd: zażółć 🚀"
        );
    }

    #[test]
    fn htmx_requests_are_detected() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
