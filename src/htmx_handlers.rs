// src/htmx_handlers.rs

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use maud::{Markup, html};
use uuid::Uuid;

use crate::catalog::DeleteConfirmation;
use crate::draft::{
    CategoryDraft, ColorDraft, FieldErrors, ImageScope, ImageSlot, ProductForm, SizeDraft,
    SlotPath, VariantDraft,
    fields::{ColorField, FieldPath, ProductField, SizeField, VariantField},
};
use crate::errors::AppError;
use crate::extractor::AdminSession;
use crate::models::{Category, Product};
use crate::response::{ToastKind, add_toast, build_response, with_toast};
use crate::session::{DraftSession, FormPhase, FormSession};
use crate::state::AppState;

// --- Fragmenty wspólne ---

fn field_error(errors: Option<&FieldErrors>, path: &str) -> Markup {
    html! {
        @if let Some(message) = errors.and_then(|e| e.message_for(path)) {
            p class="mt-1 text-xs text-red-600" { (message) }
        }
    }
}

fn text_input(label: &str, name: &str, value: &str, errors: Option<&FieldErrors>) -> Markup {
    let invalid = errors.and_then(|e| e.message_for(name)).is_some();
    html! {
        label class="block text-sm" {
            span class="text-gray-700" { (label) }
            input type="text" name=(name) value=(value)
                class=(if invalid { "mt-1 w-full rounded border border-red-500 px-2 py-1" } else { "mt-1 w-full rounded border px-2 py-1" });
        }
        (field_error(errors, name))
    }
}

/// Przycisk akcji na szkicu: wysyła cały formularz, żeby serwer miał aktualne wartości.
fn draft_button(url: &str, label: &str, form_id: &str, danger: bool) -> Markup {
    html! {
        button type="button"
            "hx-post"=(url)
            "hx-include"=(format!("#{}", form_id))
            "hx-target"="#content"
            "hx-swap"="innerHTML"
            class=(if danger { "text-xs text-red-600 hover:underline" } else { "text-xs text-blue-600 hover:underline" }) {
            (label)
        }
    }
}

fn phase_badge(phase: FormPhase) -> Markup {
    html! {
        span class="ml-2 rounded bg-gray-100 px-2 py-0.5 text-xs text-gray-600" "data-phase"=(phase.to_string()) {
            @match phase {
                FormPhase::Empty => { "New" }
                FormPhase::Editing => { "Editing" }
                FormPhase::Submitting => { "Saving…" }
            }
        }
    }
}

pub fn empty_dialog() -> Markup {
    html! { div #dialog {} }
}

pub fn delete_dialog(kind: &str, confirmation: &DeleteConfirmation) -> Markup {
    html! {
        div #dialog role="dialog" class="fixed inset-0 flex items-center justify-center bg-black/40" {
            div class="rounded bg-white p-6 shadow-lg" {
                p class="mb-4" {
                    "Are you sure you want to delete "
                    strong { (confirmation.label) }
                    "?"
                }
                div class="flex justify-end gap-2" {
                    button type="button"
                        "hx-post"=(format!("/admin/{}/deletions/{}/cancel", kind, confirmation.token))
                        "hx-target"="#dialog"
                        "hx-swap"="outerHTML"
                        class="rounded border px-3 py-1" { "Cancel" }
                    button type="button"
                        "hx-post"=(format!("/admin/{}/deletions/{}", kind, confirmation.token))
                        "hx-target"="#content"
                        "hx-swap"="innerHTML"
                        class="rounded bg-red-600 px-3 py-1 text-white" { "Delete" }
                }
            }
        }
    }
}

pub fn render_dashboard() -> Markup {
    html! {
        div class="grid gap-6 md:grid-cols-2" {
            @for (title, url, text) in [
                ("Categories", "/admin/categories", "Create, edit and delete product categories."),
                ("Products", "/admin/products", "Manage products with their variants, colors, sizes and images."),
            ] {
                a href=(url) "hx-get"=(url) "hx-target"="#content" "hx-push-url"=(url)
                    class="block rounded border p-6 shadow-sm hover:shadow-md" {
                    h2 class="text-lg font-semibold" { (title) }
                    p class="text-sm text-gray-600" { (text) }
                }
            }
        }
    }
}

// --- Kategorie ---

fn category_form(session: &FormSession<CategoryDraft>, errors: Option<&FieldErrors>) -> Markup {
    let draft = session.form();
    html! {
        form #category-form
            "hx-post"="/admin/categories/draft/submit"
            "hx-target"="#content"
            "hx-swap"="innerHTML"
            class="space-y-3 rounded border p-4" {
            h3 class="font-semibold" {
                @if draft.id.is_some() { "Edit category" } @else { "New category" }
                (phase_badge(session.phase()))
            }
            (text_input("Category Name", "CategoryName", &draft.category_name, errors))
            div {
                span class="text-sm text-gray-700" { "Image" }
                @match (&draft.image, draft.preview_url()) {
                    (ImageSlot::Pending(_), _) => {
                        p class="text-xs text-gray-500" { "Uploading…" }
                    }
                    (_, Some(url)) => {
                        img src=(url) alt="Category image" class="h-20 w-20 object-cover";
                    }
                    _ => {
                        p class="text-xs text-gray-500" { "No image" }
                    }
                }
                input type="file" name="image" accept="image/*"
                    "hx-post"="/admin/categories/draft/upload"
                    "hx-encoding"="multipart/form-data"
                    "hx-trigger"="change"
                    "hx-target"="#content"
                    "hx-swap"="innerHTML";
                (field_error(errors, "CategoryImage"))
            }
            div class="flex gap-2" {
                button type="submit" class="rounded bg-blue-600 px-3 py-1 text-white"
                    disabled[session.phase() == FormPhase::Submitting] {
                    @if draft.id.is_some() { "Update" } @else { "Create" }
                }
                (draft_button("/admin/categories/draft/reset", "Reset", "category-form", false))
            }
        }
    }
}

fn category_table(items: &[Category]) -> Markup {
    html! {
        @if items.is_empty() {
            p class="text-sm text-gray-500" { "No categories yet." }
        } @else {
            table class="w-full text-sm" {
                thead { tr { th { "Image" } th { "Name" } th { "ID" } th {} } }
                tbody {
                    @for category in items {
                        tr {
                            td {
                                @if !category.image.is_empty() {
                                    img src=(category.image) alt=(category.name) class="h-10 w-10 object-cover";
                                }
                            }
                            td { (category.name) }
                            td class="text-gray-500" { (category.id) }
                            td class="space-x-2 text-right" {
                                button type="button"
                                    "hx-get"=(format!("/admin/categories/{}/edit", category.id))
                                    "hx-target"="#content"
                                    class="text-blue-600 hover:underline" { "Edit" }
                                button type="button"
                                    "hx-get"=(format!("/admin/categories/{}/delete", category.id))
                                    "hx-target"="#dialog"
                                    "hx-swap"="outerHTML"
                                    class="text-red-600 hover:underline" { "Delete" }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn category_panel(
    session: &FormSession<CategoryDraft>,
    items: &[Category],
    errors: Option<&FieldErrors>,
) -> Markup {
    html! {
        section #category-panel class="space-y-6" {
            h2 class="text-xl font-semibold" { "Categories" }
            (category_form(session, errors))
            div #category-list { (category_table(items)) }
            (empty_dialog())
        }
    }
}

// --- Produkty ---

fn image_slot(v: usize, c: usize, i: usize, slot: &ImageSlot, errors: Option<&FieldErrors>) -> Markup {
    let path = SlotPath {
        variant: v,
        color: c,
        image: i,
    };
    let base = format!("/admin/products/draft/variants/{}/colors/{}/images/{}", v, c, i);
    html! {
        div class="flex items-center gap-2" "data-slot"=(path.to_string()) {
            @match slot {
                ImageSlot::Uploaded(url) => {
                    img src=(url) alt="" class="h-12 w-12 object-cover";
                }
                ImageSlot::Pending(_) => {
                    span class="text-xs text-gray-500" { "Uploading…" }
                }
                ImageSlot::Empty => {
                    span class="text-xs text-gray-400" { "Empty" }
                }
            }
            input type="file" name="image" accept="image/*"
                "hx-post"=(format!("{}/upload", base))
                "hx-include"="#product-form"
                "hx-encoding"="multipart/form-data"
                "hx-trigger"="change"
                "hx-target"="#content"
                "hx-swap"="innerHTML";
            (draft_button(&format!("{}/remove", base), "Remove image", "product-form", true))
        }
        (field_error(errors, &path.to_string()))
    }
}

fn color_block(
    v: usize,
    c: usize,
    color: &ColorDraft,
    scope: ImageScope,
    errors: Option<&FieldErrors>,
) -> Markup {
    let name = |field| FieldPath::Color { variant: v, color: c, field }.to_string();
    let base = format!("/admin/products/draft/variants/{}/colors/{}", v, c);
    html! {
        fieldset class="space-y-2 rounded border border-dashed p-3" {
            legend class="text-sm font-medium" { "Color " (c + 1) }
            (text_input("Color Name", &name(ColorField::ColorName), &color.color_name, errors))
            (text_input("Edge", &name(ColorField::Edge), &color.edge, errors))
            div class="space-y-1" {
                span class="text-sm text-gray-700" { "Images" }
                @if scope == ImageScope::SharedFlat {
                    span class="ml-1 text-xs text-amber-700" { "(shared by all colors)" }
                }
                @for (i, slot) in color.images.iter().enumerate() {
                    (image_slot(v, c, i, slot, errors))
                }
                (draft_button(&format!("{}/images", base), "+ Add image", "product-form", false))
            }
            (draft_button(&format!("{}/remove", base), "Remove color", "product-form", true))
        }
    }
}

fn size_block(v: usize, s: usize, size: &SizeDraft, errors: Option<&FieldErrors>) -> Markup {
    let name = |field| FieldPath::Size { variant: v, size: s, field }.to_string();
    html! {
        div class="grid grid-cols-4 items-end gap-2" {
            (text_input("Length", &name(SizeField::Length), &size.length, errors))
            (text_input("Width", &name(SizeField::Width), &size.width, errors))
            (text_input("Thickness", &name(SizeField::Thickness), &size.thickness, errors))
            (draft_button(&format!("/admin/products/draft/variants/{}/sizes/{}/remove", v, s), "Remove size", "product-form", true))
        }
    }
}

fn variant_block(
    v: usize,
    variant: &VariantDraft,
    scope: ImageScope,
    errors: Option<&FieldErrors>,
) -> Markup {
    let name = |field| FieldPath::Variant { variant: v, field }.to_string();
    let base = format!("/admin/products/draft/variants/{}", v);
    html! {
        fieldset class="space-y-3 rounded border p-3" {
            legend class="font-medium" { "Variant " (v + 1) }
            (text_input("Variant ID", &name(VariantField::VariantId), &variant.variant_id, errors))
            (text_input("Finish", &name(VariantField::Finish), &variant.finish, errors))
            @for (c, color) in variant.colors.iter().enumerate() {
                (color_block(v, c, color, scope, errors))
            }
            (draft_button(&format!("{}/colors", base), "+ Add color", "product-form", false))
            div class="space-y-2" {
                span class="text-sm text-gray-700" { "Sizes" }
                @for (s, size) in variant.sizes.iter().enumerate() {
                    (size_block(v, s, size, errors))
                }
                (draft_button(&format!("{}/sizes", base), "+ Add size", "product-form", false))
            }
            (draft_button(&format!("{}/remove", base), "Remove variant", "product-form", true))
        }
    }
}

fn product_form(
    session: &FormSession<ProductForm>,
    categories: &[Category],
    errors: Option<&FieldErrors>,
) -> Markup {
    let form = session.form();
    let draft = &form.draft;
    let scope = form.uploads().scope();
    let field = |f: ProductField| FieldPath::Product(f).to_string();
    let category_field = field(ProductField::CategoryId);
    html! {
        form #product-form
            "hx-post"="/admin/products/draft/submit"
            "hx-target"="#content"
            "hx-swap"="innerHTML"
            class="space-y-3 rounded border p-4" {
            h3 class="font-semibold" {
                @if draft.id.is_some() { "Edit product" } @else { "New product" }
                (phase_badge(session.phase()))
            }
            @if scope == ImageScope::SharedFlat {
                p class="rounded bg-amber-50 p-2 text-xs text-amber-800" {
                    "Compatibility mode: every color is saved with the same image list."
                }
            }
            (text_input("Product Name", &field(ProductField::ProductName), &draft.product_name, errors))
            (text_input("Type", &field(ProductField::Type), &draft.product_type, errors))
            (text_input("Material", &field(ProductField::Material), &draft.material, errors))
            label class="block text-sm" {
                span class="text-gray-700" { "Description" }
                textarea name=(field(ProductField::Description)) class="mt-1 w-full rounded border px-2 py-1" {
                    (draft.description)
                }
            }
            label class="block text-sm" {
                span class="text-gray-700" { "Category" }
                select name=(category_field) class="mt-1 w-full rounded border px-2 py-1" {
                    option value="" selected[draft.category_id.is_none()] { "Select a category" }
                    @for category in categories {
                        option value=(category.id)
                            selected[draft.category_id.as_ref().is_some_and(|id| id.same_as(&category.id))] {
                            (category.name)
                        }
                    }
                }
            }
            (field_error(errors, &category_field))
            label class="flex items-center gap-2 text-sm" {
                input type="checkbox" name=(field(ProductField::IsRecommended)) value="on"
                    checked[draft.is_recommended];
                "Recommended"
            }
            div class="space-y-3" {
                @for (v, variant) in draft.variants.iter().enumerate() {
                    (variant_block(v, variant, scope, errors))
                }
                (draft_button("/admin/products/draft/variants", "+ Add variant", "product-form", false))
            }
            div class="flex gap-2" {
                button type="submit" class="rounded bg-blue-600 px-3 py-1 text-white"
                    disabled[session.phase() == FormPhase::Submitting] {
                    @if draft.id.is_some() { "Update" } @else { "Create" }
                }
                (draft_button("/admin/products/draft/reset", "Reset", "product-form", false))
            }
        }
    }
}

fn category_label<'a>(product: &'a Product, categories: &'a [Category]) -> &'a str {
    if let Some(name) = product.category_name.as_deref() {
        return name;
    }
    product
        .category_id
        .as_ref()
        .and_then(|id| categories.iter().find(|c| c.id.same_as(id)))
        .map(|c| c.name.as_str())
        .unwrap_or("")
}

fn product_table(products: &[Product], categories: &[Category]) -> Markup {
    html! {
        @if products.is_empty() {
            p class="text-sm text-gray-500" { "No products yet." }
        } @else {
            table class="w-full text-sm" {
                thead {
                    tr { th { "Name" } th { "Type" } th { "Category" } th { "Variants" } th { "Recommended" } th {} }
                }
                tbody {
                    @for product in products {
                        tr {
                            td { (product.name) }
                            td { (product.product_type) }
                            td { (category_label(product, categories)) }
                            td { (product.variants.len()) }
                            td { @if product.is_recommended { "Yes" } @else { "No" } }
                            td class="space-x-2 text-right" {
                                @if let Some(id) = &product.id {
                                    button type="button"
                                        "hx-get"=(format!("/admin/products/{}/edit", id))
                                        "hx-target"="#content"
                                        class="text-blue-600 hover:underline" { "Edit" }
                                    button type="button"
                                        "hx-get"=(format!("/admin/products/{}/delete", id))
                                        "hx-target"="#dialog"
                                        "hx-swap"="outerHTML"
                                        class="text-red-600 hover:underline" { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn product_panel(
    session: &FormSession<ProductForm>,
    products: &[Product],
    categories: &[Category],
    errors: Option<&FieldErrors>,
) -> Markup {
    html! {
        section #product-panel class="space-y-6" {
            h2 class="text-xl font-semibold" { "Products" }
            (product_form(session, categories, errors))
            div #product-list { (product_table(products, categories)) }
            (empty_dialog())
        }
    }
}

// --- Renderowanie paneli z bieżącego stanu ---

pub async fn render_category_panel(
    state: &AppState,
    session: &DraftSession,
    errors: Option<&FieldErrors>,
) -> Markup {
    let items = state.categories.snapshot().await;
    let form = session.category.lock().await;
    category_panel(&form, &items, errors)
}

pub async fn render_product_panel(
    state: &AppState,
    session: &DraftSession,
    errors: Option<&FieldErrors>,
) -> Markup {
    let products = state.products.snapshot().await;
    let categories = state.categories.snapshot().await;
    let form = session.product.lock().await;
    product_panel(&form, &products, &categories, errors)
}

// --- Handlery GET ---

pub async fn dashboard_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    build_response(&app_state.config.static_dir, &headers, render_dashboard()).await
}

pub async fn categories_page_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let refreshed = app_state.categories.refresh().await;
    let markup = render_category_panel(&app_state, &session, None).await;
    let mut response = build_response(&app_state.config.static_dir, &headers, markup).await?;
    if let Err(err) = refreshed {
        add_toast(&mut response, ToastKind::Error, &err.user_message());
    }
    Ok(response)
}

pub async fn products_page_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // Lista kategorii jest potrzebna do pola wyboru w formularzu
    let (products, categories) = futures::future::join(
        app_state.products.refresh(),
        app_state.categories.refresh(),
    )
    .await;
    let markup = render_product_panel(&app_state, &session, None).await;
    let mut response = build_response(&app_state.config.static_dir, &headers, markup).await?;
    if let Some(err) = products.err().or(categories.err()) {
        add_toast(&mut response, ToastKind::Error, &err.user_message());
    }
    Ok(response)
}

pub async fn edit_category_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    app_state.categories.edit(&session.category, &id).await?;
    let markup = render_category_panel(&app_state, &session, None).await;
    build_response(&app_state.config.static_dir, &headers, markup).await
}

pub async fn edit_product_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    app_state.products.edit(&session.product, &id).await?;
    let markup = render_product_panel(&app_state, &session, None).await;
    build_response(&app_state.config.static_dir, &headers, markup).await
}

pub async fn request_category_delete_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Markup, AppError> {
    let confirmation = app_state.categories.request_delete(&id).await?;
    Ok(delete_dialog("categories", &confirmation))
}

pub async fn request_product_delete_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Markup, AppError> {
    let confirmation = app_state.products.request_delete(&id).await?;
    Ok(delete_dialog("products", &confirmation))
}

pub async fn cancel_category_delete_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
) -> Response {
    app_state.categories.cancel_delete(token).await;
    with_toast(ToastKind::Info, "Deletion cancelled", empty_dialog())
}

pub async fn cancel_product_delete_htmx_handler(
    State(app_state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
) -> Response {
    app_state.products.cancel_delete(token).await;
    with_toast(ToastKind::Info, "Deletion cancelled", empty_dialog())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftForm;
    use crate::models::EntityId;

    fn filled_form(scope: ImageScope) -> FormSession<ProductForm> {
        let mut session = FormSession::new(ProductForm::new(scope));
        let form = session.edit().unwrap();
        let v = form.draft.add_variant();
        let c = form.draft.add_color(v).unwrap();
        form.draft.add_size(v).unwrap();
        form.draft.add_image_slot(v, c).unwrap();
        session
    }

    fn input_names(markup: &str) -> Vec<String> {
        markup
            .split("name=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn rendered_field_names_are_accepted_by_apply_fields() {
        let session = filled_form(ImageScope::PerColor);
        let html = product_panel(&session, &[], &[], None).into_string();
        let names = input_names(&html);
        assert!(names.contains(&"Variants[0].Colors[0].ColorName".to_string()));
        assert!(names.contains(&"Variants[0].Sizes[0].Thickness".to_string()));
        for name in names.iter().filter(|n| n.as_str() != "image") {
            assert!(FieldPath::parse(name).is_some(), "{} not parseable", name);
        }
    }

    #[test]
    fn validation_errors_are_shown_next_to_fields() {
        let session = filled_form(ImageScope::PerColor);
        let errors = session.form().submit().unwrap_err();
        let html = product_panel(&session, &[], &[], Some(&errors)).into_string();
        assert!(html.contains("Please input the Product Name!"));
        assert!(html.contains("Please input the Color Name!"));
    }

    #[test]
    fn shared_scope_shows_compatibility_banner() {
        let shared = product_panel(&filled_form(ImageScope::SharedFlat), &[], &[], None).into_string();
        let per_color = product_panel(&filled_form(ImageScope::PerColor), &[], &[], None).into_string();
        assert!(shared.contains("Compatibility mode"));
        assert!(!per_color.contains("Compatibility mode"));
    }

    #[test]
    fn category_table_links_rows_to_edit_and_delete() {
        let session = FormSession::new(CategoryDraft::default());
        let items = vec![Category {
            id: EntityId::Number(4),
            name: "Tiles".into(),
            image: String::new(),
        }];
        let html = category_panel(&session, &items, None).into_string();
        assert!(html.contains("/admin/categories/4/edit"));
        assert!(html.contains("/admin/categories/4/delete"));
    }

    #[test]
    fn text_category_id_is_selected_and_labelled() {
        let mut session = filled_form(ImageScope::PerColor);
        session.edit().unwrap().draft.category_id = Some(EntityId::Number(12));
        let categories = vec![Category {
            id: EntityId::Text("12".into()),
            name: "Tiles".into(),
            image: String::new(),
        }];
        let html = product_panel(&session, &[], &categories, None).into_string();
        assert!(html.contains(r#"<option value="12" selected>Tiles</option>"#), "{}", html);

        let product = Product {
            category_id: Some(EntityId::Number(12)),
            ..Default::default()
        };
        assert_eq!(category_label(&product, &categories), "Tiles");
    }

    #[test]
    fn delete_dialog_names_the_record() {
        let confirmation = DeleteConfirmation {
            token: Uuid::nil(),
            id: EntityId::Number(1),
            label: "Tiles".into(),
        };
        let html = delete_dialog("categories", &confirmation).into_string();
        assert!(html.contains("<strong>Tiles</strong>"));
        assert!(html.contains(&format!("/admin/categories/deletions/{}", Uuid::nil())));
    }
}
