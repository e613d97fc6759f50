//! HTTP surface of the notification hub.
//!
//! Every write that needs fan-out or subscription work only enqueues a
//! message and returns; the queue consumers owned by the binary do the rest.

use axum::http::{header, HeaderValue, Method};
use domain::store::Stores;
use events::QueuePublisher;
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
mod params;
mod response;
mod router;
mod sse;

pub use error::{Error, Result};
pub use router::define_routes;

/// Shared handler state. Needs to implement Clone to be passed into the Router as State.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub sse_manager: Arc<::sse::Manager>,
    pub publisher: Arc<dyn QueuePublisher>,
}

impl AppState {
    pub fn new(
        config: Config,
        stores: Stores,
        sse_manager: Arc<::sse::Manager>,
        publisher: Arc<dyn QueuePublisher>,
    ) -> Self {
        Self {
            config,
            stores,
            sse_manager,
            publisher,
        }
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_owned());
    let listen_addr = format!("{interface}:{}", app_state.config.port);

    let cors_layer = cors_layer(&app_state.config.allowed_origins);
    let app = define_routes(app_state).layer(cors_layer);

    info!("Server starting... listening for connections on http://{listen_addr}");
    let listener = TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
