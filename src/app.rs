// src/app.rs

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::htmx_handlers::*;
use crate::middleware::ensure_admin_session;
use crate::state::AppState;

const PRODUCT_DRAFT: &str = "/admin/products/draft";

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/categories", get(categories_page_htmx_handler))
        .route(
            "/admin/categories/draft/submit",
            post(submit_category_handler),
        )
        .route("/admin/categories/draft/reset", post(reset_category_handler))
        .route(
            "/admin/categories/draft/upload",
            post(upload_category_image_handler),
        )
        .route(
            "/admin/categories/{id}/edit",
            get(edit_category_htmx_handler),
        )
        .route(
            "/admin/categories/{id}/delete",
            get(request_category_delete_htmx_handler),
        )
        .route(
            "/admin/categories/deletions/{token}",
            post(confirm_category_delete_handler),
        )
        .route(
            "/admin/categories/deletions/{token}/cancel",
            post(cancel_category_delete_htmx_handler),
        )
        .route("/admin/products", get(products_page_htmx_handler))
        .route(&format!("{}/submit", PRODUCT_DRAFT), post(submit_product_handler))
        .route(&format!("{}/reset", PRODUCT_DRAFT), post(reset_product_handler))
        .route(&format!("{}/variants", PRODUCT_DRAFT), post(add_variant_handler))
        .route(
            &format!("{}/variants/{{variant}}/remove", PRODUCT_DRAFT),
            post(remove_variant_handler),
        )
        .route(
            &format!("{}/variants/{{variant}}/colors", PRODUCT_DRAFT),
            post(add_color_handler),
        )
        .route(
            &format!("{}/variants/{{variant}}/colors/{{color}}/remove", PRODUCT_DRAFT),
            post(remove_color_handler),
        )
        .route(
            &format!("{}/variants/{{variant}}/sizes", PRODUCT_DRAFT),
            post(add_size_handler),
        )
        .route(
            &format!("{}/variants/{{variant}}/sizes/{{size}}/remove", PRODUCT_DRAFT),
            post(remove_size_handler),
        )
        .route(
            &format!("{}/variants/{{variant}}/colors/{{color}}/images", PRODUCT_DRAFT),
            post(add_image_slot_handler),
        )
        .route(
            &format!(
                "{}/variants/{{variant}}/colors/{{color}}/images/{{image}}/remove",
                PRODUCT_DRAFT
            ),
            post(remove_image_handler),
        )
        .route(
            &format!(
                "{}/variants/{{variant}}/colors/{{color}}/images/{{image}}/upload",
                PRODUCT_DRAFT
            ),
            post(upload_product_image_handler),
        )
        .route("/admin/products/{id}/edit", get(edit_product_htmx_handler))
        .route(
            "/admin/products/{id}/delete",
            get(request_product_delete_htmx_handler),
        )
        .route(
            "/admin/products/deletions/{token}",
            post(confirm_product_delete_handler),
        )
        .route(
            "/admin/products/deletions/{token}/cancel",
            post(cancel_product_delete_htmx_handler),
        )
}

/// Składa router panelu. Sesja szkiców jest przypinana do każdego żądania `/admin`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(dashboard_htmx_handler))
        .route("/health", get(health_handler))
        .merge(admin_routes().route_layer(middleware::from_fn(ensure_admin_session)))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
