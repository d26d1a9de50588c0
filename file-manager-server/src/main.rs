mod errors;
mod params;
mod services;

use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use blob_store::{CancellationToken, ContentProvider, FileContentProvider, FileName, LocalFileBlobStore};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::params::Args;
use crate::services::file_manager_service::{routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // The storage root is read once; everything below shares this provider.
    let blob_store = LocalFileBlobStore::open(&args.data_dir)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let provider: Arc<dyn ContentProvider<FileName>> = Arc::new(FileContentProvider::new(blob_store));

    let shutdown = CancellationToken::new();
    let state = web::Data::new(AppState {
        provider,
        shutdown: shutdown.clone(),
        max_upload_bytes: args.max_upload_bytes,
    });

    // Cancel in-flight operations on Ctrl-C so graceful shutdown is not held up by them.
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, cancelling in-flight operations");
            shutdown.cancel();
        }
    });

    tracing::info!("File manager listening on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await
}
