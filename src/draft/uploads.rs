// src/draft/uploads.rs

//! Koordynacja uploadu obrazów do slotów formularza produktu.
//!
//! Każdy upload dostaje identyfikator żądania. Wynik trafia do formularza tylko wtedy,
//! gdy jakiś slot nadal czeka na dokładnie to żądanie; spóźnione odpowiedzi
//! (slot usunięty albo nadpisany nowszym uploadem) są odrzucane.

use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::product::{ColorDraft, ImageSlot, ProductDraft};
use super::{DraftError, SlotPath};

/// Zasięg listy obrazów.
///
/// `PerColor`: każdy kolor ma własne obrazy.
/// `SharedFlat`: jedna płaska lista URL-i na całą sesję formularza, wysyłana w każdym kolorze
/// (zachowanie starego panelu, włączane dla zgodności).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum ImageScope {
    #[default]
    #[strum(serialize = "per-color")]
    PerColor,
    #[strum(serialize = "shared")]
    SharedFlat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub request: Uuid,
    pub path: SlotPath,
}

#[derive(Debug)]
pub enum UploadOutcome<E> {
    Applied(String),
    Failed(E),
    /// Slot już nie czeka na to żądanie, wynik pominięty.
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadCoordinator {
    scope: ImageScope,
    shared: Vec<String>,
}

impl UploadCoordinator {
    pub fn new(scope: ImageScope) -> Self {
        Self {
            scope,
            shared: Vec::new(),
        }
    }

    pub fn scope(&self) -> ImageScope {
        self.scope
    }

    pub fn shared_urls(&self) -> &[String] {
        &self.shared
    }

    /// Przy otwarciu istniejącego produktu płaska lista dostaje wszystkie jego obrazy w kolejności drzewa.
    pub fn seed(&mut self, draft: &ProductDraft) {
        self.shared = match self.scope {
            ImageScope::PerColor => Vec::new(),
            ImageScope::SharedFlat => draft.uploaded_urls(),
        };
    }

    pub fn reset(&mut self) {
        self.shared.clear();
    }

    pub fn begin(
        &mut self,
        draft: &mut ProductDraft,
        path: SlotPath,
    ) -> Result<UploadTicket, DraftError> {
        let slot = draft.slot_mut(path)?;
        let request = Uuid::new_v4();
        if let ImageSlot::Pending(previous) = slot {
            tracing::debug!(
                "Upload {} do slotu {} zastępuje wcześniejsze żądanie {}",
                request,
                path,
                previous
            );
        }
        *slot = ImageSlot::Pending(request);
        Ok(UploadTicket { request, path })
    }

    pub fn complete<E>(
        &mut self,
        draft: &mut ProductDraft,
        ticket: &UploadTicket,
        result: Result<String, E>,
    ) -> UploadOutcome<E> {
        let Some(slot) = draft.pending_slot_mut(ticket.request) else {
            tracing::debug!(
                "Odrzucam spóźniony wynik uploadu {} (slot {})",
                ticket.request,
                ticket.path
            );
            return UploadOutcome::Stale;
        };

        match result {
            Ok(url) => {
                *slot = ImageSlot::Uploaded(url.clone());
                if self.scope == ImageScope::SharedFlat {
                    self.shared.push(url.clone());
                }
                UploadOutcome::Applied(url)
            }
            Err(err) => {
                *slot = ImageSlot::Empty;
                UploadOutcome::Failed(err)
            }
        }
    }

    pub fn remove(
        &mut self,
        draft: &mut ProductDraft,
        path: SlotPath,
    ) -> Result<ImageSlot, DraftError> {
        let removed = draft.remove_image_slot(path)?;
        // W trybie płaskim pozycja slotu w kolorze jest jednocześnie indeksem w liście
        if self.scope == ImageScope::SharedFlat && path.image < self.shared.len() {
            self.shared.remove(path.image);
        }
        Ok(removed)
    }

    pub fn images_for(&self, color: &ColorDraft) -> Vec<String> {
        match self.scope {
            ImageScope::PerColor => color
                .images
                .iter()
                .filter_map(|slot| slot.url().map(str::to_string))
                .collect(),
            ImageScope::SharedFlat => self.shared.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DraftForm, ProductForm};
    use crate::models::{Color, EntityId, Product, Variant};

    fn path(variant: usize, color: usize, image: usize) -> SlotPath {
        SlotPath {
            variant,
            color,
            image,
        }
    }

    /// Jeden wariant z dwoma kolorami, po jednym pustym slocie w każdym.
    fn two_color_form(scope: ImageScope) -> ProductForm {
        let mut form = ProductForm::new(scope);
        form.draft.product_name = "Onyx".into();
        form.draft.category_id = Some(EntityId::Number(1));
        let v = form.draft.add_variant();
        form.draft.variants[v].variant_id = "V".into();
        for name in ["Black", "Gold"] {
            let c = form.draft.add_color(v).unwrap();
            form.draft.variants[v].colors[c].color_name = name.into();
            form.draft.add_image_slot(v, c).unwrap();
        }
        form
    }

    #[test]
    fn scope_parses_from_config_values() {
        assert_eq!("per-color".parse::<ImageScope>().unwrap(), ImageScope::PerColor);
        assert_eq!("SHARED".parse::<ImageScope>().unwrap(), ImageScope::SharedFlat);
        assert!("flat".parse::<ImageScope>().is_err());
        assert_eq!(ImageScope::SharedFlat.to_string(), "shared");
    }

    #[test]
    fn per_color_uploads_stay_in_their_color() {
        let mut form = two_color_form(ImageScope::PerColor);
        let black = form.begin_upload(path(0, 0, 0)).unwrap();
        let gold = form.begin_upload(path(0, 1, 0)).unwrap();
        assert!(matches!(
            form.complete_upload::<()>(&gold, Ok("gold.png".into())),
            UploadOutcome::Applied(_)
        ));
        assert!(matches!(
            form.complete_upload::<()>(&black, Ok("black.png".into())),
            UploadOutcome::Applied(_)
        ));

        let payload = form.submit().unwrap();
        assert_eq!(payload.variants[0].colors[0].images, vec!["black.png"]);
        assert_eq!(payload.variants[0].colors[1].images, vec!["gold.png"]);
    }

    #[test]
    fn shared_scope_sends_the_whole_list_to_every_color() {
        let mut form = two_color_form(ImageScope::SharedFlat);
        let black = form.begin_upload(path(0, 0, 0)).unwrap();
        let gold = form.begin_upload(path(0, 1, 0)).unwrap();
        // Kolejność na liście to kolejność zakończenia uploadów
        form.complete_upload::<()>(&gold, Ok("gold.png".into()));
        form.complete_upload::<()>(&black, Ok("black.png".into()));

        let payload = form.submit().unwrap();
        for color in &payload.variants[0].colors {
            assert_eq!(color.images, vec!["gold.png", "black.png"]);
        }
    }

    #[test]
    fn failed_upload_empties_the_slot_and_keeps_shared_list() {
        let mut form = two_color_form(ImageScope::SharedFlat);
        let ok = form.begin_upload(path(0, 0, 0)).unwrap();
        form.complete_upload::<&str>(&ok, Ok("first.png".into()));
        let before = form.uploads().shared_urls().to_vec();

        let failing = form.begin_upload(path(0, 1, 0)).unwrap();
        assert_eq!(
            form.draft.variants[0].colors[1].images[0],
            ImageSlot::Pending(failing.request)
        );
        let outcome = form.complete_upload(&failing, Err("boom"));
        assert!(matches!(outcome, UploadOutcome::Failed("boom")));
        assert_eq!(form.draft.variants[0].colors[1].images[0], ImageSlot::Empty);
        assert_eq!(form.uploads().shared_urls(), before.as_slice());
    }

    #[test]
    fn superseded_upload_is_discarded() {
        let mut form = two_color_form(ImageScope::PerColor);
        let older = form.begin_upload(path(0, 0, 0)).unwrap();
        let newer = form.begin_upload(path(0, 0, 0)).unwrap();

        form.complete_upload::<()>(&newer, Ok("new.png".into()));
        assert!(matches!(
            form.complete_upload::<()>(&older, Ok("old.png".into())),
            UploadOutcome::Stale
        ));
        assert_eq!(
            form.draft.variants[0].colors[0].images[0],
            ImageSlot::Uploaded("new.png".into())
        );
    }

    #[test]
    fn result_follows_slot_when_earlier_slot_is_removed() {
        let mut form = two_color_form(ImageScope::PerColor);
        form.draft.add_image_slot(0, 0).unwrap();
        let ticket = form.begin_upload(path(0, 0, 1)).unwrap();
        form.remove_image(path(0, 0, 0)).unwrap();

        assert!(matches!(
            form.complete_upload::<()>(&ticket, Ok("moved.png".into())),
            UploadOutcome::Applied(_)
        ));
        assert_eq!(
            form.draft.variants[0].colors[0].images,
            vec![ImageSlot::Uploaded("moved.png".into())]
        );
    }

    #[test]
    fn result_for_removed_slot_is_discarded() {
        let mut form = two_color_form(ImageScope::SharedFlat);
        let ticket = form.begin_upload(path(0, 1, 0)).unwrap();
        form.draft.remove_color(0, 1).unwrap();

        assert!(matches!(
            form.complete_upload::<()>(&ticket, Ok("lost.png".into())),
            UploadOutcome::Stale
        ));
        assert!(form.uploads().shared_urls().is_empty());
    }

    #[test]
    fn pending_upload_blocks_submit() {
        let mut form = two_color_form(ImageScope::PerColor);
        form.begin_upload(path(0, 1, 0)).unwrap();
        let errors = form.submit().unwrap_err();
        assert_eq!(errors.paths(), vec!["Variants[0].Colors[1].Images[0]"]);
    }

    #[test]
    fn shared_scope_edit_then_remove_first_image() {
        let product = Product {
            id: Some(EntityId::Number(9)),
            name: "Granite".into(),
            category_id: Some(EntityId::Number(1)),
            variants: vec![Variant {
                variant_id: "G1".into(),
                colors: vec![Color {
                    name: "Grey".into(),
                    images: vec!["img0.png".into(), "img1.png".into()],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut form = ProductForm::new(ImageScope::SharedFlat);
        form.initialize(Some(&product));
        assert_eq!(form.uploads().shared_urls(), ["img0.png", "img1.png"]);

        form.remove_image(path(0, 0, 0)).unwrap();
        let payload = form.submit().unwrap();
        assert_eq!(payload.variants[0].colors[0].images, vec!["img1.png"]);
        assert_eq!(payload.id, Some(EntityId::Number(9)));
    }

    #[test]
    fn upload_into_missing_slot_is_rejected() {
        let mut form = two_color_form(ImageScope::PerColor);
        assert_eq!(
            form.begin_upload(path(0, 0, 5)),
            Err(DraftError::NoImage(path(0, 0, 5)))
        );
    }
}
