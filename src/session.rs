// src/session.rs

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use strum_macros::Display;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::draft::{CategoryDraft, DraftForm, ImageScope, ProductForm};
use crate::errors::AppError;
use crate::models::EntityId;

/// Faza formularza: Empty -> Editing -> Submitting -> (Empty | Editing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FormPhase {
    Empty,
    Editing,
    Submitting,
}

/// Formularz wraz z jego fazą. Podczas zapisu wszelkie zmiany są blokowane.
#[derive(Debug)]
pub struct FormSession<F> {
    phase: FormPhase,
    form: F,
}

impl<F: DraftForm> FormSession<F> {
    pub fn new(form: F) -> Self {
        Self {
            phase: FormPhase::Empty,
            form,
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.phase == FormPhase::Submitting {
            return Err(AppError::SubmissionInProgress);
        }
        Ok(())
    }

    /// Dostęp do edycji; pierwsza zmiana przenosi pusty formularz w stan edycji.
    pub fn edit(&mut self) -> Result<&mut F, AppError> {
        self.ensure_idle()?;
        self.phase = FormPhase::Editing;
        Ok(&mut self.form)
    }

    /// Dostęp bez sprawdzania fazy, tylko do nanoszenia wyników uploadów.
    pub fn settle(&mut self) -> &mut F {
        &mut self.form
    }

    /// Otwiera pusty formularz albo kopię rekordu znanego z ostatniej listy.
    pub fn open(&mut self, existing: Option<&F::Entity>) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.form.reset();
        self.form.initialize(existing);
        self.phase = if existing.is_some() {
            FormPhase::Editing
        } else {
            FormPhase::Empty
        };
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), AppError> {
        self.open(None)
    }

    /// Nanosi pola, waliduje i przechodzi w `Submitting`.
    /// Zwraca identyfikator edytowanego rekordu (jeśli jest) i gotowy payload.
    pub fn begin_submit(
        &mut self,
        fields: &[(String, String)],
    ) -> Result<(Option<EntityId>, F::Payload), AppError> {
        self.ensure_idle()?;
        self.form.apply_fields(fields);
        self.phase = FormPhase::Editing;
        let payload = self.form.submit().map_err(AppError::Validation)?;
        self.phase = FormPhase::Submitting;
        Ok((self.form.editing_id().cloned(), payload))
    }

    pub fn finish_submit(&mut self, succeeded: bool) {
        if succeeded {
            self.form.reset();
            self.phase = FormPhase::Empty;
        } else {
            self.phase = FormPhase::Editing;
        }
    }
}

/// Szkice jednej przeglądarki: jeden formularz kategorii i jeden produktu.
#[derive(Debug)]
pub struct DraftSession {
    pub category: Mutex<FormSession<CategoryDraft>>,
    pub product: Mutex<FormSession<ProductForm>>,
}

impl DraftSession {
    pub fn new(scope: ImageScope) -> Self {
        Self {
            category: Mutex::new(FormSession::new(CategoryDraft::default())),
            product: Mutex::new(FormSession::new(ProductForm::new(scope))),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, Arc<DraftSession>>,
    scope: ImageScope,
}

impl SessionStore {
    pub fn new(idle: Duration, scope: ImageScope) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle)
                .build(),
            scope,
        }
    }

    pub async fn open(&self, id: Uuid) -> Arc<DraftSession> {
        let scope = self.scope;
        self.sessions
            .get_with(id, async move {
                tracing::info!("Nowa sesja panelu: {}", id);
                Arc::new(DraftSession::new(scope))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryPayload};

    fn session() -> FormSession<CategoryDraft> {
        FormSession::new(CategoryDraft::default())
    }

    fn name(value: &str) -> Vec<(String, String)> {
        vec![("CategoryName".to_string(), value.to_string())]
    }

    #[test]
    fn successful_submit_cycle_returns_to_empty() {
        let mut form = session();
        assert_eq!(form.phase(), FormPhase::Empty);

        let (editing, payload) = form.begin_submit(&name("Tiles")).unwrap();
        assert_eq!(editing, None);
        assert_eq!(
            payload,
            CategoryPayload {
                name: "Tiles".into(),
                image: String::new()
            }
        );
        assert_eq!(form.phase(), FormPhase::Submitting);

        form.finish_submit(true);
        assert_eq!(form.phase(), FormPhase::Empty);
        assert_eq!(form.form(), &CategoryDraft::default());
    }

    #[test]
    fn failed_submit_keeps_values_for_retry() {
        let mut form = session();
        form.begin_submit(&name("Tiles")).unwrap();
        form.finish_submit(false);
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.form().category_name, "Tiles");
    }

    #[test]
    fn second_submit_while_submitting_is_rejected() {
        let mut form = session();
        form.begin_submit(&name("Tiles")).unwrap();
        assert!(matches!(
            form.begin_submit(&name("Tiles")),
            Err(AppError::SubmissionInProgress)
        ));
        assert!(matches!(form.edit(), Err(AppError::SubmissionInProgress)));
        assert!(matches!(form.reset(), Err(AppError::SubmissionInProgress)));
    }

    #[test]
    fn validation_failure_stays_in_editing() {
        let mut form = session();
        let err = form.begin_submit(&name("")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn opening_existing_record_enters_editing() {
        let mut form = session();
        let category = Category {
            id: EntityId::Number(1),
            name: "Tiles".into(),
            image: String::new(),
        };
        form.open(Some(&category)).unwrap();
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.form().editing_id(), Some(&EntityId::Number(1)));
    }

    #[tokio::test]
    async fn store_returns_same_session_for_same_id() {
        let store = SessionStore::new(Duration::from_secs(60), ImageScope::PerColor);
        let id = Uuid::new_v4();
        let first = store.open(id).await;
        let second = store.open(id).await;
        assert!(Arc::ptr_eq(&first, &second));

        let other = store.open(Uuid::new_v4()).await;
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
