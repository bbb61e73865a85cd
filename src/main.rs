#![allow(dead_code)]
#![allow(unused_variables)]

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

#[macro_use]
extern crate lazy_static;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    http::Method,
    routing::{delete, get, post},
    BoxError, Router,
};
use tower::{buffer::BufferLayer, limit::RateLimitLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{app::env::Envy, app::errors::DefaultApiError, files::registry::FileRegistry};

mod app;
mod files;

#[derive(Clone)]
pub struct AppState {
    pub registry: FileRegistry,
    pub envy: Arc<Envy>,
}

#[tokio::main]
async fn main() {
    // tracing
    tracing_subscriber::fmt::init();

    // environment
    let app_env = env::var("APP_ENV").unwrap_or("development".to_string());
    let _ = dotenvy::from_filename(format!(".env.{}", app_env));
    let envy = match envy::from_env::<Envy>() {
        Ok(config) => config,
        Err(e) => panic!("{:#?}", e),
    };

    // properties
    let port = envy.port.to_owned().unwrap_or(3000);
    let max_upload_size_bytes = envy
        .max_upload_size_mb
        .unwrap_or(files::service::DEFAULT_MAX_UPLOAD_SIZE_MB)
        * 1024
        * 1024;
    // headroom on top of the file cap for multipart framing
    let max_body_bytes = (max_upload_size_bytes + 1024 * 1024) as usize;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::POST, Method::GET, Method::DELETE]);

    // storage
    let staging_dir = envy.staging_dir();
    tokio::fs::create_dir_all(&staging_dir)
        .await
        .expect("failed to create storage directories");

    println!("storage ready at {}", envy.storage_path);

    let state = AppState {
        registry: FileRegistry::new(),
        envy: Arc::new(envy),
    };

    app::util::janitor::spawn(state.clone());

    // app
    let app = Router::new()
        .route("/", get(app::controller::get_root))
        // files
        .route("/upload", post(files::controller::upload_file))
        .route("/files", get(files::controller::get_files))
        .route("/files/:id", get(files::controller::get_file_by_id))
        .route(
            "/files/:id/content",
            get(files::controller::download_file_by_id),
        )
        .route("/files/:id", delete(files::controller::delete_file_by_id))
        // layers
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: BoxError| async move {
                    DefaultApiError::InternalServerError.value()
                }))
                .layer(BufferLayer::new(1024))
                .layer(RateLimitLayer::new(64, Duration::from_secs(1))),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");

    println!("shutting down, draining in-flight requests");
}
