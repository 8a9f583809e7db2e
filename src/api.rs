// src/api.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, multipart};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;

use crate::models::{Category, CategoryPayload, EntityId, ImageFile, Product, UploadResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("błąd HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API zwróciło status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("nieprawidłowa odpowiedź API: {0}")]
    InvalidResponse(String),

    #[error("nieprawidłowy adres API: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Zewnętrzne REST API katalogu.
///
/// Odpowiedzi na POST/PUT nie muszą zawierać zapisanego rekordu, dlatego
/// `create_*` i `update_*` zwracają `Option`.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_categories(&self) -> ApiResult<Vec<Category>>;
    async fn create_category(&self, payload: &CategoryPayload) -> ApiResult<Option<Category>>;
    async fn update_category(
        &self,
        id: &EntityId,
        payload: &CategoryPayload,
    ) -> ApiResult<Option<Category>>;
    async fn delete_category(&self, id: &EntityId) -> ApiResult<()>;

    async fn list_products(&self) -> ApiResult<Vec<Product>>;
    async fn create_product(&self, payload: &Product) -> ApiResult<Option<Product>>;
    async fn update_product(&self, id: &EntityId, payload: &Product)
    -> ApiResult<Option<Product>>;
    async fn delete_product(&self, id: &EntityId) -> ApiResult<()>;

    /// Wysyła plik jako pole multipart `image`, zwraca URL obrazu.
    async fn upload_image(&self, file: ImageFile) -> ApiResult<String>;
}

#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(base_url: Url, timeout: Duration) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn resource_url(&self, collection: &str, id: Option<&EntityId>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(collection);
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Brak treści błędu".to_string());
        tracing::error!("API odpowiedziało błędem: Status={}, Treść={}", status, body);
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_list<T: DeserializeOwned>(&self, collection: &str) -> ApiResult<Vec<T>> {
        let url = self.resource_url(collection, None)?;
        tracing::debug!("GET {}", url);
        let response = Self::check_status(self.client.get(url).send().await?).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        collection: &str,
        id: Option<&EntityId>,
        body: &B,
    ) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.resource_url(collection, id)?;
        tracing::debug!("{} {}", method, url);
        let response =
            Self::check_status(self.client.request(method, url).json(body).send().await?).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice::<T>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::debug!("Odpowiedź API nie zawiera rekordu ({}), pomijam", e);
                Ok(None)
            }
        }
    }

    async fn delete(&self, collection: &str, id: &EntityId) -> ApiResult<()> {
        let url = self.resource_url(collection, Some(id))?;
        tracing::debug!("DELETE {}", url);
        Self::check_status(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.fetch_list("categories").await
    }

    async fn create_category(&self, payload: &CategoryPayload) -> ApiResult<Option<Category>> {
        self.send_json(Method::POST, "categories", None, payload)
            .await
    }

    async fn update_category(
        &self,
        id: &EntityId,
        payload: &CategoryPayload,
    ) -> ApiResult<Option<Category>> {
        self.send_json(Method::PUT, "categories", Some(id), payload)
            .await
    }

    async fn delete_category(&self, id: &EntityId) -> ApiResult<()> {
        self.delete("categories", id).await
    }

    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.fetch_list("products").await
    }

    async fn create_product(&self, payload: &Product) -> ApiResult<Option<Product>> {
        self.send_json(Method::POST, "products", None, payload).await
    }

    async fn update_product(
        &self,
        id: &EntityId,
        payload: &Product,
    ) -> ApiResult<Option<Product>> {
        self.send_json(Method::PUT, "products", Some(id), payload)
            .await
    }

    async fn delete_product(&self, id: &EntityId) -> ApiResult<()> {
        self.delete("products", id).await
    }

    async fn upload_image(&self, file: ImageFile) -> ApiResult<String> {
        let url = self.resource_url("upload", None)?;
        let size = file.bytes.len();
        let mut part = multipart::Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new().part("image", part);

        tracing::info!("Wysyłanie obrazu '{}' ({} bajtów)", file.file_name, size);
        let response =
            Self::check_status(self.client.post(url).multipart(form).send().await?).await?;
        let uploaded = response.json::<UploadResponse>().await.map_err(|e| {
            tracing::error!("Błąd deserializacji odpowiedzi uploadu: {}", e);
            ApiError::InvalidResponse("brak pola imageUrl".to_string())
        })?;
        Ok(uploaded.image_url)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Atrapa API trzymająca dane w pamięci i zapisująca wykonane wywołania.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeState {
        categories: Vec<Category>,
        products: Vec<Product>,
        next_id: i64,
        calls: Vec<String>,
        failing: HashSet<&'static str>,
        uploads: usize,
    }

    #[derive(Default)]
    pub struct FakeCatalogApi {
        state: Mutex<FakeState>,
    }

    impl FakeCatalogApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_categories(categories: Vec<Category>) -> Self {
            let api = Self::new();
            {
                let mut state = api.state.lock().unwrap();
                state.next_id = categories.len() as i64;
                state.categories = categories;
            }
            api
        }

        pub fn with_products(products: Vec<Product>) -> Self {
            let api = Self::new();
            api.state.lock().unwrap().products = products;
            api
        }

        /// Operacje: "list", "create", "update", "delete", "upload".
        pub fn fail(&self, operation: &'static str) {
            self.state.lock().unwrap().failing.insert(operation);
        }

        pub fn heal(&self, operation: &'static str) {
            self.state.lock().unwrap().failing.remove(operation);
        }

        pub fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        pub fn count_calls(&self, prefix: &str) -> usize {
            self.calls().iter().filter(|c| c.starts_with(prefix)).count()
        }

        pub fn products(&self) -> Vec<Product> {
            self.state.lock().unwrap().products.clone()
        }

        fn record(&self, call: String, operation: &'static str) -> ApiResult<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            if state.failing.contains(operation) {
                return Err(ApiError::Status {
                    status: 500,
                    body: format!("{} failed", operation),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CatalogApi for FakeCatalogApi {
        async fn list_categories(&self) -> ApiResult<Vec<Category>> {
            self.record("GET /categories".into(), "list")?;
            Ok(self.state.lock().unwrap().categories.clone())
        }

        async fn create_category(&self, payload: &CategoryPayload) -> ApiResult<Option<Category>> {
            self.record("POST /categories".into(), "create")?;
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let category = Category {
                id: EntityId::Number(state.next_id),
                name: payload.name.clone(),
                image: payload.image.clone(),
            };
            state.categories.push(category.clone());
            Ok(Some(category))
        }

        async fn update_category(
            &self,
            id: &EntityId,
            payload: &CategoryPayload,
        ) -> ApiResult<Option<Category>> {
            self.record(format!("PUT /categories/{}", id), "update")?;
            let mut state = self.state.lock().unwrap();
            let category = state
                .categories
                .iter_mut()
                .find(|c| &c.id == id)
                .ok_or_else(|| ApiError::Status {
                    status: 404,
                    body: String::new(),
                })?;
            category.name = payload.name.clone();
            category.image = payload.image.clone();
            Ok(Some(category.clone()))
        }

        async fn delete_category(&self, id: &EntityId) -> ApiResult<()> {
            self.record(format!("DELETE /categories/{}", id), "delete")?;
            self.state.lock().unwrap().categories.retain(|c| &c.id != id);
            Ok(())
        }

        async fn list_products(&self) -> ApiResult<Vec<Product>> {
            self.record("GET /products".into(), "list")?;
            Ok(self.state.lock().unwrap().products.clone())
        }

        async fn create_product(&self, payload: &Product) -> ApiResult<Option<Product>> {
            self.record("POST /products".into(), "create")?;
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let mut product = payload.clone();
            product.id = Some(EntityId::Number(state.next_id));
            state.products.push(product);
            // Prawdziwe API często nie odsyła rekordu
            Ok(None)
        }

        async fn update_product(
            &self,
            id: &EntityId,
            payload: &Product,
        ) -> ApiResult<Option<Product>> {
            self.record(format!("PUT /products/{}", id), "update")?;
            let mut state = self.state.lock().unwrap();
            if let Some(product) = state.products.iter_mut().find(|p| p.id.as_ref() == Some(id)) {
                *product = payload.clone();
            }
            Ok(Some(payload.clone()))
        }

        async fn delete_product(&self, id: &EntityId) -> ApiResult<()> {
            self.record(format!("DELETE /products/{}", id), "delete")?;
            self.state
                .lock()
                .unwrap()
                .products
                .retain(|p| p.id.as_ref() != Some(id));
            Ok(())
        }

        async fn upload_image(&self, file: ImageFile) -> ApiResult<String> {
            self.record(format!("POST /upload {}", file.file_name), "upload")?;
            let mut state = self.state.lock().unwrap();
            state.uploads += 1;
            Ok(format!("http://img.test/{}/{}", state.uploads, file.file_name))
        }
    }
}
