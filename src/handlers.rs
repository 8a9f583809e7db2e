// src/handlers.rs

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    response::Response,
};
use maud::Markup;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::ApiError;
use crate::catalog::{CatalogEntity, Mutation};
use crate::draft::{DraftError, DraftForm, ProductForm, SlotPath, UploadOutcome};
use crate::errors::AppError;
use crate::extractor::AdminSession;
use crate::htmx_handlers::{render_category_panel, render_product_panel};
use crate::models::ImageFile;
use crate::response::{ToastKind, with_toast};
use crate::session::DraftSession;
use crate::state::AppState;

type FormFields = Form<Vec<(String, String)>>;

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn mutation_toast<E: CatalogEntity>(
    noun: &str,
    verb: &str,
    outcome: &Mutation<E>,
) -> (ToastKind, String) {
    // API nie zawsze odsyła zapisany rekord
    let subject = match &outcome.record {
        Some(record) => format!("{} '{}'", noun, record.display_name()),
        None => noun.to_string(),
    };
    if outcome.list_stale {
        (
            ToastKind::Warning,
            format!("{} {}, but the list could not be refreshed", subject, verb),
        )
    } else {
        (ToastKind::Success, format!("{} {}", subject, verb))
    }
}

fn upload_toast(outcome: UploadOutcome<ApiError>) -> (ToastKind, String) {
    match outcome {
        UploadOutcome::Applied(url) => {
            tracing::info!("Obraz wgrany: {}", url);
            (ToastKind::Success, "Image uploaded".to_string())
        }
        UploadOutcome::Failed(source) => {
            tracing::error!("Wysyłanie obrazu nie powiodło się: {}", source);
            (ToastKind::Error, AppError::UploadFailure(source).user_message())
        }
        UploadOutcome::Stale => (
            ToastKind::Info,
            "This upload was replaced by a newer one".to_string(),
        ),
    }
}

/// Odczytuje formularz multipart: pola tekstowe oraz jeden niepusty plik z pola `image`.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(Vec<(String, String)>, ImageFile), AppError> {
    let mut text_fields: Vec<(String, String)> = Vec::new();
    let mut image: Option<ImageFile> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!("Odebrano pole multipart bez nazwy, pomijam");
                continue;
            }
        };
        if field_name == "image" {
            let file_name = field
                .file_name()
                .filter(|name| !name.is_empty())
                .unwrap_or("image")
                .to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                tracing::debug!("Puste pole pliku '{}', pomijam", file_name);
                continue;
            }
            tracing::debug!("Odebrano plik {} ({} bajtów)", file_name, bytes.len());
            image = Some(ImageFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await?;
            text_fields.push((field_name, value));
        }
    }

    let image = image.ok_or_else(|| {
        AppError::BadRequest("Please choose a non-empty image file".to_string())
    })?;
    Ok((text_fields, image))
}

// --- Kategorie ---

pub async fn submit_category_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Form(fields): FormFields,
) -> Result<Response, AppError> {
    match app_state.categories.submit(&session.category, &fields).await {
        Ok(outcome) => {
            let verb = if outcome.created { "created" } else { "updated" };
            let (kind, message) = mutation_toast("Category", verb, &outcome);
            let markup = render_category_panel(&app_state, &session, None).await;
            Ok(with_toast(kind, &message, markup))
        }
        Err(AppError::Validation(errors)) => {
            tracing::warn!(
                "Formularz kategorii zawiera {} błędów: {}",
                errors.len(),
                errors.paths().join(", ")
            );
            let markup = render_category_panel(&app_state, &session, Some(&errors)).await;
            let message = AppError::Validation(errors).user_message();
            Ok(with_toast(ToastKind::Error, &message, markup))
        }
        Err(err) => Err(err),
    }
}

pub async fn reset_category_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
) -> Result<Markup, AppError> {
    session.category.lock().await.reset()?;
    Ok(render_category_panel(&app_state, &session, None).await)
}

pub async fn upload_category_image_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (fields, file) = read_upload(multipart).await?;

    let request = {
        let mut form = session.category.lock().await;
        let draft = form.edit()?;
        draft.apply_fields(&fields);
        draft.begin_upload()
    };

    // Bez blokady formularza na czas wysyłania
    let result = app_state.api.upload_image(file).await;

    let outcome = session
        .category
        .lock()
        .await
        .settle()
        .complete_upload(request, result);
    let (kind, message) = upload_toast(outcome);
    let markup = render_category_panel(&app_state, &session, None).await;
    Ok(with_toast(kind, &message, markup))
}

pub async fn confirm_category_delete_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(token): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = app_state.categories.confirm_delete(token).await?;
    let (kind, message) = mutation_toast("Category", "deleted", &outcome);
    let markup = render_category_panel(&app_state, &session, None).await;
    Ok(with_toast(kind, &message, markup))
}

// --- Produkty ---

pub async fn submit_product_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Form(fields): FormFields,
) -> Result<Response, AppError> {
    // Wybrana kategoria ma trafić do API w tej samej postaci, w jakiej przyszła z listy
    let categories = app_state.categories.snapshot().await;
    {
        let mut guard = session.product.lock().await;
        let form = guard.edit()?;
        form.apply_fields(&fields);
        form.draft.resolve_category(&categories);
    }

    match app_state.products.submit(&session.product, &fields).await {
        Ok(outcome) => {
            let verb = if outcome.created { "created" } else { "updated" };
            let (kind, message) = mutation_toast("Product", verb, &outcome);
            let markup = render_product_panel(&app_state, &session, None).await;
            Ok(with_toast(kind, &message, markup))
        }
        Err(AppError::Validation(errors)) => {
            tracing::warn!(
                "Formularz produktu zawiera {} błędów: {}",
                errors.len(),
                errors.paths().join(", ")
            );
            let markup = render_product_panel(&app_state, &session, Some(&errors)).await;
            let message = AppError::Validation(errors).user_message();
            Ok(with_toast(ToastKind::Error, &message, markup))
        }
        Err(err) => Err(err),
    }
}

pub async fn reset_product_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
) -> Result<Markup, AppError> {
    session.product.lock().await.reset()?;
    Ok(render_product_panel(&app_state, &session, None).await)
}

/// Nanosi przesłane wartości formularza, a potem zmianę struktury produktu.
async fn mutate_product<F>(
    app_state: &AppState,
    session: &DraftSession,
    fields: &[(String, String)],
    change: F,
) -> Result<Markup, AppError>
where
    F: FnOnce(&mut ProductForm) -> Result<(), DraftError>,
{
    {
        let mut guard = session.product.lock().await;
        let form = guard.edit()?;
        form.apply_fields(fields);
        change(form)?;
    }
    Ok(render_product_panel(app_state, session, None).await)
}

pub async fn add_variant_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        let v = form.draft.add_variant();
        tracing::debug!("Dodano wariant {}", v);
        Ok(())
    })
    .await
}

pub async fn remove_variant_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(variant): Path<usize>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        form.draft.remove_variant(variant).map(drop)
    })
    .await
}

pub async fn add_color_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(variant): Path<usize>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        form.draft.add_color(variant).map(drop)
    })
    .await
}

pub async fn remove_color_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path((variant, color)): Path<(usize, usize)>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        form.draft.remove_color(variant, color).map(drop)
    })
    .await
}

pub async fn add_size_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(variant): Path<usize>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        form.draft.add_size(variant).map(drop)
    })
    .await
}

pub async fn remove_size_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path((variant, size)): Path<(usize, usize)>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        form.draft.remove_size(variant, size).map(drop)
    })
    .await
}

pub async fn add_image_slot_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path((variant, color)): Path<(usize, usize)>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    mutate_product(&app_state, &session, &fields, |form| {
        form.draft.add_image_slot(variant, color).map(drop)
    })
    .await
}

pub async fn remove_image_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path((variant, color, image)): Path<(usize, usize, usize)>,
    Form(fields): FormFields,
) -> Result<Markup, AppError> {
    let path = SlotPath {
        variant,
        color,
        image,
    };
    mutate_product(&app_state, &session, &fields, |form| {
        form.remove_image(path).map(drop)
    })
    .await
}

pub async fn upload_product_image_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path((variant, color, image)): Path<(usize, usize, usize)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let path = SlotPath {
        variant,
        color,
        image,
    };
    let (fields, file) = read_upload(multipart).await?;

    let ticket = {
        let mut guard = session.product.lock().await;
        let form = guard.edit()?;
        form.apply_fields(&fields);
        form.begin_upload(path)?
    };

    let result = app_state.api.upload_image(file).await;

    let outcome = session
        .product
        .lock()
        .await
        .settle()
        .complete_upload(&ticket, result);
    let (kind, message) = upload_toast(outcome);
    let markup = render_product_panel(&app_state, &session, None).await;
    Ok(with_toast(kind, &message, markup))
}

pub async fn confirm_product_delete_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(token): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = app_state.products.confirm_delete(token).await?;
    let (kind, message) = mutation_toast("Product", "deleted", &outcome);
    let markup = render_product_panel(&app_state, &session, None).await;
    Ok(with_toast(kind, &message, markup))
}
