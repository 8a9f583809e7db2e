// src/draft/product.rs

use uuid::Uuid;
use validator::Validate;

use super::uploads::{ImageScope, UploadCoordinator, UploadOutcome, UploadTicket};
use super::{DraftError, DraftForm, FieldErrors, SlotPath, trimmed};
use crate::models::{Category, Color, EntityId, Product, Size, Variant};

/// Stan pojedynczego slotu obrazu w kolorze.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageSlot {
    #[default]
    Empty,
    /// Czeka na wynik konkretnego żądania uploadu.
    Pending(Uuid),
    Uploaded(String),
}

impl ImageSlot {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageSlot::Uploaded(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ImageSlot::Pending(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct SizeDraft {
    #[validate(length(min = 1, message = "Please input the Length!"))]
    pub length: String,
    #[validate(length(min = 1, message = "Please input the Width!"))]
    pub width: String,
    #[validate(length(min = 1, message = "Please input the Thickness!"))]
    pub thickness: String,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ColorDraft {
    #[validate(length(min = 1, message = "Please input the Color Name!"))]
    pub color_name: String,
    pub edge: String,
    pub images: Vec<ImageSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct VariantDraft {
    #[validate(length(min = 1, message = "Please input the Variant ID!"))]
    pub variant_id: String,
    pub finish: String,
    #[validate(nested)]
    pub colors: Vec<ColorDraft>,
    #[validate(nested)]
    pub sizes: Vec<SizeDraft>,
}

/// Drzewo edytowanego produktu: warianty -> kolory -> obrazy oraz warianty -> rozmiary.
/// Elementy na każdym poziomie są adresowane wyłącznie pozycją w rodzicu.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ProductDraft {
    pub id: Option<EntityId>,
    #[validate(length(min = 1, message = "Please input the Product Name!"))]
    pub product_name: String,
    pub product_type: String,
    pub material: String,
    pub description: String,
    #[validate(required(message = "Please select a Category!"))]
    pub category_id: Option<EntityId>,
    pub is_recommended: bool,
    #[validate(nested)]
    pub variants: Vec<VariantDraft>,
}

impl ProductDraft {
    /// Głęboka kopia rekordu z API.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            product_name: product.name.clone(),
            product_type: product.product_type.clone(),
            material: product.material.clone(),
            description: product.description.clone(),
            category_id: product.category_id.clone(),
            is_recommended: product.is_recommended,
            variants: product
                .variants
                .iter()
                .map(|variant| VariantDraft {
                    variant_id: variant.variant_id.clone(),
                    finish: variant.finish.clone(),
                    colors: variant
                        .colors
                        .iter()
                        .map(|color| ColorDraft {
                            color_name: color.name.clone(),
                            edge: color.edge.clone(),
                            images: color
                                .images
                                .iter()
                                .map(|url| ImageSlot::Uploaded(url.clone()))
                                .collect(),
                        })
                        .collect(),
                    sizes: variant
                        .sizes
                        .iter()
                        .map(|size| SizeDraft {
                            length: size.length.clone(),
                            width: size.width.clone(),
                            thickness: size.thickness.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Podmienia wybraną kategorię na identyfikator z listy kategorii, zachowując jego typ z API.
    pub fn resolve_category(&mut self, categories: &[Category]) {
        let Some(selected) = self.category_id.as_ref() else {
            return;
        };
        if let Some(category) = categories.iter().find(|c| c.id.same_as(selected)) {
            self.category_id = Some(category.id.clone());
        }
    }

    pub fn variant_mut(&mut self, variant: usize) -> Result<&mut VariantDraft, DraftError> {
        self.variants
            .get_mut(variant)
            .ok_or(DraftError::NoVariant(variant))
    }

    pub fn color_mut(&mut self, variant: usize, color: usize) -> Result<&mut ColorDraft, DraftError> {
        self.variant_mut(variant)?
            .colors
            .get_mut(color)
            .ok_or(DraftError::NoColor { variant, color })
    }

    pub fn size_mut(&mut self, variant: usize, size: usize) -> Result<&mut SizeDraft, DraftError> {
        self.variant_mut(variant)?
            .sizes
            .get_mut(size)
            .ok_or(DraftError::NoSize { variant, size })
    }

    pub fn slot_mut(&mut self, path: SlotPath) -> Result<&mut ImageSlot, DraftError> {
        self.color_mut(path.variant, path.color)?
            .images
            .get_mut(path.image)
            .ok_or(DraftError::NoImage(path))
    }

    pub fn add_variant(&mut self) -> usize {
        self.variants.push(VariantDraft::default());
        self.variants.len() - 1
    }

    pub fn remove_variant(&mut self, variant: usize) -> Result<VariantDraft, DraftError> {
        if variant >= self.variants.len() {
            return Err(DraftError::NoVariant(variant));
        }
        Ok(self.variants.remove(variant))
    }

    pub fn add_color(&mut self, variant: usize) -> Result<usize, DraftError> {
        let colors = &mut self.variant_mut(variant)?.colors;
        colors.push(ColorDraft::default());
        Ok(colors.len() - 1)
    }

    pub fn remove_color(&mut self, variant: usize, color: usize) -> Result<ColorDraft, DraftError> {
        let colors = &mut self.variant_mut(variant)?.colors;
        if color >= colors.len() {
            return Err(DraftError::NoColor { variant, color });
        }
        Ok(colors.remove(color))
    }

    pub fn add_size(&mut self, variant: usize) -> Result<usize, DraftError> {
        let sizes = &mut self.variant_mut(variant)?.sizes;
        sizes.push(SizeDraft::default());
        Ok(sizes.len() - 1)
    }

    pub fn remove_size(&mut self, variant: usize, size: usize) -> Result<SizeDraft, DraftError> {
        let sizes = &mut self.variant_mut(variant)?.sizes;
        if size >= sizes.len() {
            return Err(DraftError::NoSize { variant, size });
        }
        Ok(sizes.remove(size))
    }

    pub fn add_image_slot(&mut self, variant: usize, color: usize) -> Result<usize, DraftError> {
        let images = &mut self.color_mut(variant, color)?.images;
        images.push(ImageSlot::Empty);
        Ok(images.len() - 1)
    }

    pub fn remove_image_slot(&mut self, path: SlotPath) -> Result<ImageSlot, DraftError> {
        let images = &mut self.color_mut(path.variant, path.color)?.images;
        if path.image >= images.len() {
            return Err(DraftError::NoImage(path));
        }
        Ok(images.remove(path.image))
    }

    /// Szuka slotu czekającego na dane żądanie, niezależnie od tego, czy jego pozycja się przesunęła.
    pub fn pending_slot_mut(&mut self, request: Uuid) -> Option<&mut ImageSlot> {
        self.variants
            .iter_mut()
            .flat_map(|v| v.colors.iter_mut())
            .flat_map(|c| c.images.iter_mut())
            .find(|slot| **slot == ImageSlot::Pending(request))
    }

    pub fn pending_slots(&self) -> Vec<SlotPath> {
        let mut paths = Vec::new();
        for (v, variant) in self.variants.iter().enumerate() {
            for (c, color) in variant.colors.iter().enumerate() {
                for (i, slot) in color.images.iter().enumerate() {
                    if slot.is_pending() {
                        paths.push(SlotPath {
                            variant: v,
                            color: c,
                            image: i,
                        });
                    }
                }
            }
        }
        paths
    }

    /// Wszystkie wgrane URL-e w kolejności drzewa.
    pub fn uploaded_urls(&self) -> Vec<String> {
        self.variants
            .iter()
            .flat_map(|v| v.colors.iter())
            .flat_map(|c| c.images.iter())
            .filter_map(|slot| slot.url().map(str::to_string))
            .collect()
    }

    fn normalized(&self) -> Self {
        Self {
            id: self.id.clone(),
            product_name: trimmed(&self.product_name),
            product_type: trimmed(&self.product_type),
            material: trimmed(&self.material),
            description: trimmed(&self.description),
            category_id: self.category_id.clone(),
            is_recommended: self.is_recommended,
            variants: self
                .variants
                .iter()
                .map(|variant| VariantDraft {
                    variant_id: trimmed(&variant.variant_id),
                    finish: trimmed(&variant.finish),
                    colors: variant
                        .colors
                        .iter()
                        .map(|color| ColorDraft {
                            color_name: trimmed(&color.color_name),
                            edge: trimmed(&color.edge),
                            images: color.images.clone(),
                        })
                        .collect(),
                    sizes: variant
                        .sizes
                        .iter()
                        .map(|size| SizeDraft {
                            length: trimmed(&size.length),
                            width: trimmed(&size.width),
                            thickness: trimmed(&size.thickness),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Formularz produktu: szkic plus koordynator uploadów należący do tej samej sesji.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub draft: ProductDraft,
    uploads: UploadCoordinator,
}

impl ProductForm {
    pub fn new(scope: ImageScope) -> Self {
        Self {
            draft: ProductDraft::default(),
            uploads: UploadCoordinator::new(scope),
        }
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    pub fn begin_upload(&mut self, path: SlotPath) -> Result<UploadTicket, DraftError> {
        self.uploads.begin(&mut self.draft, path)
    }

    pub fn complete_upload<E>(
        &mut self,
        ticket: &UploadTicket,
        result: Result<String, E>,
    ) -> UploadOutcome<E> {
        self.uploads.complete(&mut self.draft, ticket, result)
    }

    pub fn remove_image(&mut self, path: SlotPath) -> Result<ImageSlot, DraftError> {
        self.uploads.remove(&mut self.draft, path)
    }
}

impl DraftForm for ProductForm {
    type Entity = Product;
    type Payload = Product;

    fn initialize(&mut self, existing: Option<&Product>) {
        self.draft = existing.map(ProductDraft::from_product).unwrap_or_default();
        self.uploads.seed(&self.draft);
    }

    fn reset(&mut self) {
        self.draft = ProductDraft::default();
        self.uploads.reset();
    }

    fn apply_fields(&mut self, fields: &[(String, String)]) {
        self.draft.apply_fields(fields);
    }

    fn submit(&self) -> Result<Product, FieldErrors> {
        let draft = self.draft.normalized();
        let mut errors = match draft.validate() {
            Ok(()) => FieldErrors::default(),
            Err(e) => FieldErrors::from(e),
        };
        for path in draft.pending_slots() {
            errors.push(path.to_string(), "Image upload still in progress");
        }
        if !errors.is_empty() {
            errors.sort();
            return Err(errors);
        }

        Ok(Product {
            id: draft.id.clone(),
            name: draft.product_name,
            product_type: draft.product_type,
            material: draft.material,
            description: draft.description,
            category_id: draft.category_id,
            category_name: None,
            is_recommended: draft.is_recommended,
            variants: draft
                .variants
                .iter()
                .map(|variant| Variant {
                    variant_id: variant.variant_id.clone(),
                    finish: variant.finish.clone(),
                    colors: variant
                        .colors
                        .iter()
                        .map(|color| Color {
                            name: color.color_name.clone(),
                            edge: color.edge.clone(),
                            images: self.uploads.images_for(color),
                        })
                        .collect(),
                    sizes: variant
                        .sizes
                        .iter()
                        .map(|size| Size {
                            length: size.length.clone(),
                            width: size.width.clone(),
                            thickness: size.thickness.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    fn editing_id(&self) -> Option<&EntityId> {
        self.draft.id.as_ref()
    }
}
