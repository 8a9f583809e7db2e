// src/state.rs

use std::sync::Arc;

use crate::api::CatalogApi;
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::models::{Category, Product};
use crate::session::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<dyn CatalogApi>,
    pub sessions: SessionStore,
    pub categories: Catalog<Category>,
    pub products: Catalog<Product>,
}

impl AppState {
    pub fn new(config: AppConfig, api: Arc<dyn CatalogApi>) -> Self {
        Self {
            sessions: SessionStore::new(config.session_idle, config.image_scope),
            categories: Catalog::new(api.clone(), config.delete_confirm_ttl),
            products: Catalog::new(api.clone(), config.delete_confirm_ttl),
            api,
            config,
        }
    }
}
