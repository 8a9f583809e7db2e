// src/extractor.rs

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::middleware::SessionId;
use crate::session::DraftSession;
use crate::state::AppState;

/// Szkice formularzy bieżącej przeglądarki.
pub struct AdminSession(pub Arc<DraftSession>);

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let SessionId(id) = parts.extensions.get::<SessionId>().copied().ok_or_else(|| {
            tracing::error!("Brak identyfikatora sesji, middleware nie został uruchomiony");
            AppError::InternalServerError("missing session id".to_string())
        })?;
        Ok(AdminSession(state.sessions.open(id).await))
    }
}
