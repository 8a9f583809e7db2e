// src/catalog.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::api::{ApiResult, CatalogApi};
use crate::draft::DraftForm;
use crate::errors::AppError;
use crate::models::{Category, CategoryPayload, EntityId, Product};
use crate::session::FormSession;

/// Encja katalogu obsługiwana przez wspólny orkiestrator CRUD.
#[async_trait]
pub trait CatalogEntity: Clone + Send + Sync + 'static {
    type Payload: Send + Sync;

    /// Liczba pojedyncza i mnoga do komunikatów.
    const NOUN: &'static str;
    const PLURAL: &'static str;

    fn id(&self) -> Option<&EntityId>;
    fn display_name(&self) -> &str;

    async fn fetch_all(api: &dyn CatalogApi) -> ApiResult<Vec<Self>>;
    async fn create(api: &dyn CatalogApi, payload: &Self::Payload) -> ApiResult<Option<Self>>;
    async fn update(
        api: &dyn CatalogApi,
        id: &EntityId,
        payload: &Self::Payload,
    ) -> ApiResult<Option<Self>>;
    async fn delete(api: &dyn CatalogApi, id: &EntityId) -> ApiResult<()>;
}

#[async_trait]
impl CatalogEntity for Category {
    type Payload = CategoryPayload;

    const NOUN: &'static str = "category";
    const PLURAL: &'static str = "categories";

    fn id(&self) -> Option<&EntityId> {
        Some(&self.id)
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(api: &dyn CatalogApi) -> ApiResult<Vec<Self>> {
        api.list_categories().await
    }

    async fn create(api: &dyn CatalogApi, payload: &CategoryPayload) -> ApiResult<Option<Self>> {
        api.create_category(payload).await
    }

    async fn update(
        api: &dyn CatalogApi,
        id: &EntityId,
        payload: &CategoryPayload,
    ) -> ApiResult<Option<Self>> {
        api.update_category(id, payload).await
    }

    async fn delete(api: &dyn CatalogApi, id: &EntityId) -> ApiResult<()> {
        api.delete_category(id).await
    }
}

#[async_trait]
impl CatalogEntity for Product {
    type Payload = Product;

    const NOUN: &'static str = "product";
    const PLURAL: &'static str = "products";

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(api: &dyn CatalogApi) -> ApiResult<Vec<Self>> {
        api.list_products().await
    }

    async fn create(api: &dyn CatalogApi, payload: &Product) -> ApiResult<Option<Self>> {
        api.create_product(payload).await
    }

    async fn update(
        api: &dyn CatalogApi,
        id: &EntityId,
        payload: &Product,
    ) -> ApiResult<Option<Self>> {
        api.update_product(id, payload).await
    }

    async fn delete(api: &dyn CatalogApi, id: &EntityId) -> ApiResult<()> {
        api.delete_product(id).await
    }
}

/// Wynik udanej mutacji. `list_stale` oznacza, że odświeżenie listy po mutacji się nie powiodło.
#[derive(Debug)]
pub struct Mutation<E> {
    pub record: Option<E>,
    pub created: bool,
    pub list_stale: bool,
}

/// Oczekujące potwierdzenie usunięcia.
#[derive(Debug, Clone)]
pub struct DeleteConfirmation {
    pub token: Uuid,
    pub id: EntityId,
    pub label: String,
}

/// Orkiestrator CRUD dla jednego typu encji.
///
/// Każda udana mutacja kończy się pełnym pobraniem listy z API zamiast lokalnej poprawki.
pub struct Catalog<E: CatalogEntity> {
    api: Arc<dyn CatalogApi>,
    items: RwLock<Vec<E>>,
    pending_deletes: Cache<Uuid, DeleteConfirmation>,
}

impl<E: CatalogEntity> Catalog<E> {
    pub fn new(api: Arc<dyn CatalogApi>, confirm_ttl: Duration) -> Self {
        Self {
            api,
            items: RwLock::new(Vec::new()),
            pending_deletes: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(confirm_ttl)
                .build(),
        }
    }

    /// Ostatnia znana lista.
    pub async fn snapshot(&self) -> Vec<E> {
        self.items.read().await.clone()
    }

    /// Szuka po tekstowej postaci identyfikatora, więc `"12"` trafia zarówno w `12`, jak i w `"12"`.
    pub async fn find(&self, id: &str) -> Option<E> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id().is_some_and(|own| own.matches(id)))
            .cloned()
    }

    /// Szuka rekordu w ostatniej liście, a gdy go tam nie ma, pobiera listę ponownie.
    async fn locate(&self, id: &str) -> Result<E, AppError> {
        if let Some(record) = self.find(id).await {
            return Ok(record);
        }
        self.refresh().await?;
        self.find(id).await.ok_or(AppError::NotFound)
    }

    /// Pobiera listę z API. Przy błędzie poprzednia lista zostaje bez zmian.
    pub async fn refresh(&self) -> Result<Vec<E>, AppError> {
        match E::fetch_all(&*self.api).await {
            Ok(items) => {
                tracing::debug!("Pobrano {} {}", items.len(), E::PLURAL);
                *self.items.write().await = items.clone();
                Ok(items)
            }
            Err(source) => {
                tracing::warn!("Nie udało się pobrać {}: {}", E::PLURAL, source);
                Err(AppError::FetchFailure {
                    entity: E::PLURAL,
                    source,
                })
            }
        }
    }

    /// Otwiera formularz edycji z kopią rekordu z ostatniej listy.
    pub async fn edit<F>(&self, session: &Mutex<FormSession<F>>, id: &str) -> Result<(), AppError>
    where
        F: DraftForm<Entity = E>,
    {
        let record = self.locate(id).await?;
        session.lock().await.open(Some(&record))?;
        tracing::debug!("Edycja {} {}", E::NOUN, id);
        Ok(())
    }

    /// Tworzy albo aktualizuje rekord z formularza.
    ///
    /// Blokada formularza nie jest trzymana podczas żądania do API; w tym czasie formularz
    /// jest w fazie `Submitting` i odrzuca kolejne zapisy.
    pub async fn submit<F>(
        &self,
        session: &Mutex<FormSession<F>>,
        fields: &[(String, String)],
    ) -> Result<Mutation<E>, AppError>
    where
        F: DraftForm<Entity = E, Payload = E::Payload>,
    {
        let (editing, payload) = session.lock().await.begin_submit(fields)?;

        let result = match &editing {
            Some(id) => E::update(&*self.api, id, &payload).await,
            None => E::create(&*self.api, &payload).await,
        };

        match result {
            Ok(record) => {
                session.lock().await.finish_submit(true);
                match &editing {
                    Some(id) => tracing::info!("Zaktualizowano {} {}", E::NOUN, id),
                    None => tracing::info!("Utworzono {}", E::NOUN),
                }
                let list_stale = self.refresh().await.is_err();
                Ok(Mutation {
                    record,
                    created: editing.is_none(),
                    list_stale,
                })
            }
            Err(source) => {
                session.lock().await.finish_submit(false);
                Err(AppError::SubmitFailure {
                    entity: E::NOUN,
                    source,
                })
            }
        }
    }

    /// Pierwszy krok usuwania: nic nie jest wysyłane do API przed potwierdzeniem.
    pub async fn request_delete(&self, id: &str) -> Result<DeleteConfirmation, AppError> {
        let record = self.locate(id).await?;
        // Do API trafia identyfikator w postaci z listy, nie z URL-a
        let own_id = record.id().cloned().ok_or(AppError::NotFound)?;
        let confirmation = DeleteConfirmation {
            token: Uuid::new_v4(),
            id: own_id,
            label: record.display_name().to_string(),
        };
        self.pending_deletes
            .insert(confirmation.token, confirmation.clone())
            .await;
        Ok(confirmation)
    }

    pub async fn cancel_delete(&self, token: Uuid) {
        self.pending_deletes.invalidate(&token).await;
    }

    /// Drugi krok usuwania. Token jest jednorazowy: wysyła co najwyżej jedno żądanie DELETE.
    pub async fn confirm_delete(&self, token: Uuid) -> Result<Mutation<E>, AppError> {
        let confirmation = self
            .pending_deletes
            .remove(&token)
            .await
            .ok_or(AppError::DeletionNotFound)?;

        E::delete(&*self.api, &confirmation.id)
            .await
            .map_err(|source| AppError::DeleteFailure {
                entity: E::NOUN,
                source,
            })?;
        tracing::info!("Usunięto {} {}", E::NOUN, confirmation.id);

        let list_stale = self.refresh().await.is_err();
        Ok(Mutation {
            record: None,
            created: false,
            list_stale,
        })
    }
}
