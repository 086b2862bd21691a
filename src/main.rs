mod acquisition;
mod api;
mod catalog_client;
mod config;
mod domain;
mod download;
mod enrichment;
mod error;
mod parser;
mod reader;
mod storage;
#[cfg(test)]
mod testing;

use std::{path::Path, sync::Arc};

use acquisition::AcquisitionCoordinator;
use anyhow::Context;
use catalog_client::{CatalogClient, EndpointResolver, build_http_client};
use config::Config;
use download::DownloadPipeline;
use enrichment::EnrichmentClient;
use migration::MigratorTrait;
use parser::EpubParser;
use poem::{
    EndpointExt, Route, Server,
    listener::TcpListener,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;
use reader::ReadingSessionLoader;
use sea_orm::Database;
use storage::{LibraryRepo, ReaderRepo, SeaOrmStore};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type GutenfetchResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> GutenfetchResult<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!(
        "{}=info,poem=info,reqwest=warn,h2=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting gutenfetch");

    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load();
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.download_dir.display()))?;

    let db_conn = Database::connect(&config.db_connection_string)
        .await
        .with_context(|| "Failed to connect to database")?;
    migration::Migrator::up(&db_conn, None)
        .await
        .with_context(|| "Failed to run database migrations")?;
    let store = Arc::new(SeaOrmStore::new(Arc::new(db_conn)));

    let http = build_http_client()?;
    let resolver = Arc::new(EndpointResolver::new(http.clone(), &config.bootstrap_url));
    let enrichment = EnrichmentClient::new(http.clone(), &config.enrichment_url)
        .with_api_key(&config.enrichment_api_key);
    tracing::info!(
        bootstrap = %config.bootstrap_url,
        enrichment = %config.enrichment_url,
        has_api_key = !config.enrichment_api_key.is_empty(),
        download_dir = %config.download_dir.display(),
        "configured upstream clients"
    );

    let library: Arc<dyn LibraryRepo> = store.clone();
    let progress: Arc<dyn ReaderRepo> = store;
    let coordinator = AcquisitionCoordinator::new(
        CatalogClient::new(resolver, http.clone()),
        enrichment.clone(),
        Arc::clone(&library),
        DownloadPipeline::new(http, config.download_dir.clone()),
    );
    let reader = ReadingSessionLoader::new(
        Arc::clone(&library),
        progress,
        enrichment,
        Arc::new(EpubParser),
    );

    let api = api::GutenfetchApi {
        coordinator: Arc::new(coordinator),
        reader: Arc::new(reader),
        library,
        jobs: Arc::default(),
    };
    run_poem(api, &config.bind_addr).await
}

pub async fn run_poem(api: api::GutenfetchApi, bind_addr: &str) -> GutenfetchResult<()> {
    let version = env!("CARGO_PKG_VERSION");
    let api_service = OpenApiService::new(api, "Gutenfetch API", version)
        .server(format!("http://{bind_addr}"));
    let ui = api_service.rapidoc();
    let spec = api_service.spec();
    let route = Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .with(Cors::new())
        .with(PoemTracing);

    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr)).run(route).await?;
    Ok(())
}
