// src/errors.rs

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use serde_json::json;
use thiserror::Error;

use crate::api::ApiError;
use crate::draft::{DraftError, FieldErrors};
use crate::response::{ToastKind, toast_headers};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Nie udało się pobrać listy {entity}")]
    FetchFailure {
        entity: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Nie udało się zapisać: {entity}")]
    SubmitFailure {
        entity: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Nie udało się usunąć: {entity}")]
    DeleteFailure {
        entity: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Wysyłanie obrazu nie powiodło się")]
    UploadFailure(#[source] ApiError),

    #[error("Błędy walidacji")]
    Validation(FieldErrors),

    #[error("Zapis jest już w toku")]
    SubmissionInProgress,

    #[error("Potwierdzenie usunięcia wygasło lub zostało już użyte")]
    DeletionNotFound,

    #[error("Nieprawidłowa operacja na formularzu: {0}")]
    Draft(#[from] DraftError),

    #[error("Nie znaleziono zasobu")]
    NotFound,

    #[error("Niepoprawne żądanie: {0}")]
    BadRequest(String),

    #[error("Wewnętrzny błąd serwera")]
    InternalServerError(String),
}

impl AppError {
    /// Komunikat pokazywany użytkownikowi w powiadomieniu.
    pub fn user_message(&self) -> String {
        match self {
            AppError::FetchFailure { entity, .. } => format!("Failed to load {}", entity),
            AppError::SubmitFailure { entity, .. } => format!("Failed to save {}", entity),
            AppError::DeleteFailure { entity, .. } => format!("Failed to delete {}", entity),
            AppError::UploadFailure(_) => "Image upload failed".to_string(),
            AppError::Validation(errors) => {
                format!("Please fix {} invalid field(s)", errors.len())
            }
            AppError::SubmissionInProgress => "A save is already in progress".to_string(),
            AppError::DeletionNotFound => "This delete confirmation has expired".to_string(),
            AppError::Draft(err) => err.to_string(),
            AppError::NotFound => "Not found".to_string(),
            AppError::BadRequest(message) => message.clone(),
            AppError::InternalServerError(_) => "Internal server error".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::FetchFailure { .. }
            | AppError::SubmitFailure { .. }
            | AppError::DeleteFailure { .. }
            | AppError::UploadFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SubmissionInProgress => StatusCode::CONFLICT,
            AppError::DeletionNotFound | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Draft(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::FetchFailure { source, .. }
            | AppError::SubmitFailure { source, .. }
            | AppError::DeleteFailure { source, .. }
            | AppError::UploadFailure(source) => {
                tracing::error!("{}: {}", self, source);
            }
            AppError::InternalServerError(details) => {
                tracing::error!("Wewnętrzny błąd serwera: {}", details);
            }
            other => tracing::warn!("Żądanie odrzucone: {}", other),
        }

        let status = self.status();
        let message = self.user_message();
        let headers = toast_headers(ToastKind::Error, &message);
        let body = match self {
            AppError::Validation(errors) => json!({ "error": message, "fields": errors }),
            _ => json!({ "error": message }),
        };
        (status, headers, Json(body)).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::error!("Błąd przetwarzania Multipart: {:?}", err);
        AppError::BadRequest(format!("Invalid form data: {}", err))
    }
}
