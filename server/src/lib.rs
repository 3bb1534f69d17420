//! Haggle marketplace server.
//!
//! Serves the listing catalogue and buyer/seller conversations as JSON under
//! `/listings` and `/conversations`, and as HTML pages under `/`, `/listing/…`
//! and `/conversation/…`. All state lives in CSV files under the data dir.

pub mod api;
pub mod config;
pub mod error;
pub mod pages;
pub mod store;

use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{ConversationStore, ListingStore};

/// Shared by every handler.
pub struct AppState {
    pub listings: ListingStore,
    pub conversations: ConversationStore,
}

impl AppState {
    pub fn new(listings: ListingStore, conversations: ConversationStore) -> Self {
        Self {
            listings,
            conversations,
        }
    }

    /// Build the stores described by `config`, creating the conversation
    /// directory if needed.
    pub async fn open(config: &Config) -> std::io::Result<Arc<Self>> {
        let listings = ListingStore::new(config.listings_path());
        let conversations = ConversationStore::new(config.conversations_path());

        tokio::fs::create_dir_all(conversations.dir()).await?;
        if !tokio::fs::try_exists(listings.path()).await.unwrap_or(false) {
            warn!(
                "Listings file {} does not exist yet; the catalogue is empty until a listing is added",
                listings.path().display()
            );
        }
        info!(
            listings = %listings.path().display(),
            conversations = %conversations.dir().display(),
            "stores ready"
        );
        Ok(Arc::new(Self::new(listings, conversations)))
    }
}

/// The full application: JSON API, HTML pages, request tracing and CORS.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .merge(api::routes())
        .merge(pages::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
