// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_admin::api::HttpCatalogApi;
use catalog_admin::app::build_router;
use catalog_admin::config::AppConfig;
use catalog_admin::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Inicjalizacja systemu logowania (tracing), poziom można zmienić przez RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_admin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Inicjalizacja panelu katalogu...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Błędna konfiguracja: {}", err);
            std::process::exit(1);
        }
    };

    let api = match HttpCatalogApi::new(config.api_url.clone(), config.http_timeout) {
        Ok(api) => api,
        Err(err) => {
            tracing::error!("Nie można utworzyć klienta API: {}", err);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "API katalogu: {}, tryb obrazów: {}",
        config.api_url,
        config.image_scope
    );

    let addr = config.bind_addr;
    let app_state = Arc::new(AppState::new(config, Arc::new(api)));
    let app = build_router(app_state);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Nie można powiązać adresu {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Serwer nasłuchuje na {}", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Błąd serwera: {}", e);
    }
}
