// src/draft/mod.rs

//! Robocze wersje (szkice) kategorii i produktów edytowanych w panelu.

pub mod category;
pub mod fields;
pub mod product;
pub mod uploads;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::models::EntityId;

pub use category::CategoryDraft;
pub use product::{ColorDraft, ImageSlot, ProductDraft, ProductForm, SizeDraft, VariantDraft};
pub use uploads::{ImageScope, UploadCoordinator, UploadOutcome, UploadTicket};

/// Formularz, który da się otworzyć (pusty lub z rekordu), wypełnić polami z żądania i zatwierdzić.
pub trait DraftForm: Send {
    type Entity;
    type Payload;

    fn initialize(&mut self, existing: Option<&Self::Entity>);
    fn reset(&mut self);
    fn apply_fields(&mut self, fields: &[(String, String)]);
    fn submit(&self) -> Result<Self::Payload, FieldErrors>;
    fn editing_id(&self) -> Option<&EntityId>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("wariant {0} nie istnieje")]
    NoVariant(usize),
    #[error("kolor {color} w wariancie {variant} nie istnieje")]
    NoColor { variant: usize, color: usize },
    #[error("rozmiar {size} w wariancie {variant} nie istnieje")]
    NoSize { variant: usize, size: usize },
    #[error("slot obrazu {0} nie istnieje")]
    NoImage(SlotPath),
}

/// Położenie slotu obrazu w drzewie produktu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPath {
    pub variant: usize,
    pub color: usize,
    pub image: usize,
}

impl fmt::Display for SlotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Variants[{}].Colors[{}].Images[{}]",
            self.variant, self.color, self.image
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Błędy walidacji kluczowane ścieżką pola w formacie nazw z formularza,
/// np. `Variants[0].Colors[1].ColorName`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.message.as_str())
    }

    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.path.as_str()).collect()
    }

    /// Porządek naturalny: `Variants[2]` przed `Variants[10]`.
    pub fn sort(&mut self) {
        self.0.sort_by_key(|e| natural_key(&e.path));
    }
}

fn natural_key(path: &str) -> String {
    let mut key = String::with_capacity(path.len() + 16);
    let mut digits = String::new();
    for ch in path.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if !digits.is_empty() {
            key.push_str(&format!("{:0>8}", digits));
            digits.clear();
        }
        key.push(ch);
    }
    if !digits.is_empty() {
        key.push_str(&format!("{:0>8}", digits));
    }
    key
}

// Nazwy pól Rusta -> nazwy pól w formularzu i w API
fn wire_name(field: &str) -> &str {
    match field {
        "product_name" => "ProductName",
        "category_id" => "CategoryID",
        "variants" => "Variants",
        "variant_id" => "VariantID",
        "colors" => "Colors",
        "color_name" => "ColorName",
        "sizes" => "Sizes",
        "length" => "Length",
        "width" => "Width",
        "thickness" => "Thickness",
        "category_name" => "CategoryName",
        other => other,
    }
}

fn collect_errors(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = wire_name(&**field);
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is required", name));
                    out.push(path.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        collect_errors("", &errors, &mut out);
        out.sort();
        out
    }
}

/// Przycina białe znaki; wymagane pola z samymi spacjami traktujemy jak puste.
pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_sort_numerically() {
        let mut errors = FieldErrors::default();
        errors.push("Variants[10].VariantID", "a");
        errors.push("Variants[2].VariantID", "b");
        errors.push("ProductName", "c");
        errors.sort();
        assert_eq!(
            errors.paths(),
            vec!["ProductName", "Variants[2].VariantID", "Variants[10].VariantID"]
        );
        assert_eq!(errors.message_for("Variants[2].VariantID"), Some("b"));
        assert_eq!(errors.message_for("Variants[3].VariantID"), None);
    }

    #[test]
    fn slot_path_uses_form_field_notation() {
        let path = SlotPath {
            variant: 1,
            color: 0,
            image: 3,
        };
        assert_eq!(path.to_string(), "Variants[1].Colors[0].Images[3]");
    }
}
