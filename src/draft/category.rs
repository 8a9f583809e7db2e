// src/draft/category.rs

use uuid::Uuid;
use validator::Validate;

use super::product::ImageSlot;
use super::uploads::UploadOutcome;
use super::{DraftForm, FieldErrors, trimmed};
use crate::models::{Category, CategoryPayload, EntityId};

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct CategoryDraft {
    pub id: Option<EntityId>,
    #[validate(length(min = 1, message = "Please input the Category Name!"))]
    pub category_name: String,
    pub image: ImageSlot,
    /// Obraz zapisany w API; używany przy aktualizacji, gdy nie wgrano nowego.
    pub stored_image: String,
}

impl CategoryDraft {
    pub fn begin_upload(&mut self) -> Uuid {
        let request = Uuid::new_v4();
        if let ImageSlot::Pending(previous) = &self.image {
            tracing::debug!(
                "Upload {} obrazu kategorii zastępuje żądanie {}",
                request,
                previous
            );
        }
        self.image = ImageSlot::Pending(request);
        request
    }

    pub fn complete_upload<E>(&mut self, request: Uuid, result: Result<String, E>) -> UploadOutcome<E> {
        if self.image != ImageSlot::Pending(request) {
            tracing::debug!("Odrzucam spóźniony wynik uploadu {}", request);
            return UploadOutcome::Stale;
        }
        match result {
            Ok(url) => {
                self.image = ImageSlot::Uploaded(url.clone());
                UploadOutcome::Applied(url)
            }
            Err(err) => {
                self.image = ImageSlot::Empty;
                UploadOutcome::Failed(err)
            }
        }
    }

    /// URL do podglądu: nowo wgrany albo zapisany wcześniej.
    pub fn preview_url(&self) -> Option<&str> {
        self.image
            .url()
            .or_else(|| (!self.stored_image.is_empty()).then_some(self.stored_image.as_str()))
    }
}

impl DraftForm for CategoryDraft {
    type Entity = Category;
    type Payload = CategoryPayload;

    fn initialize(&mut self, existing: Option<&Category>) {
        *self = match existing {
            Some(category) => CategoryDraft {
                id: Some(category.id.clone()),
                category_name: category.name.clone(),
                image: if category.image.is_empty() {
                    ImageSlot::Empty
                } else {
                    ImageSlot::Uploaded(category.image.clone())
                },
                stored_image: category.image.clone(),
            },
            None => CategoryDraft::default(),
        };
    }

    fn reset(&mut self) {
        *self = CategoryDraft::default();
    }

    fn apply_fields(&mut self, fields: &[(String, String)]) {
        for (name, value) in fields {
            if name == "CategoryName" {
                self.category_name = value.clone();
            }
        }
    }

    fn submit(&self) -> Result<CategoryPayload, FieldErrors> {
        let normalized = CategoryDraft {
            category_name: trimmed(&self.category_name),
            ..self.clone()
        };
        let mut errors = match normalized.validate() {
            Ok(()) => FieldErrors::default(),
            Err(e) => FieldErrors::from(e),
        };
        if normalized.image.is_pending() {
            errors.push("CategoryImage", "Image upload still in progress");
        }
        if !errors.is_empty() {
            errors.sort();
            return Err(errors);
        }

        let image = match normalized.image.url() {
            Some(url) => url.to_string(),
            None if normalized.id.is_some() => normalized.stored_image.clone(),
            None => String::new(),
        };
        Ok(CategoryPayload {
            name: normalized.category_name,
            image,
        })
    }

    fn editing_id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}
