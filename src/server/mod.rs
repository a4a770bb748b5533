use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::images::ImageStore;
use crate::storage::ItemStore;

pub mod routes;

/// Server state
pub struct AppState {
    pub database_path: PathBuf,
    pub images: ImageStore,
}

/// Build the application router with CORS restricted to one origin.
///
/// Credentials are allowed, so the origin must be named exactly and request
/// headers are mirrored rather than wildcarded.
pub fn build_router(state: Arc<AppState>, origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let app = Router::new()
        .route("/", get(routes::hello))
        .route("/items", get(routes::get_items).post(routes::add_item))
        .route("/image/{image_name}", get(routes::get_image))
        .route("/search", get(routes::search_items))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

pub async fn start_server(
    port: u16,
    database_path: PathBuf,
    images_dir: PathBuf,
    origin: &str,
) -> anyhow::Result<()> {
    let images = ImageStore::new(images_dir);
    images.ensure_dir()?;

    // Fail fast on an unopenable database and create the schema up front
    ItemStore::open(&database_path)?;

    let state = Arc::new(AppState {
        database_path,
        images,
    });

    let app = build_router(state, origin)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {} (allowed origin: {})", addr, origin);
    println!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
