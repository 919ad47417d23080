use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

use enrichment_api::config::ApiConfig;
use enrichment_api::contacts::ContactImporter;
use enrichment_api::database::{ContactStore, SqliteContactStore};
use enrichment_api::handlers::{self, AppState};
use enrichment_api::helpers::{self, identity::StaticTokenIdentity};
use enrichment_api::integrations::HttpEnrichmentProvider;
use enrichment_api::jobs::EnrichmentManager;
use importers::FieldNormalizer;

/// How long in-flight enrichments get to finish on Ctrl+C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file; defaults to `<config dir>/contact-enrichment/api.toml`
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_file_path: Option<String>,
}

fn init_tracing(log_file_path: Option<String>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("enrichment-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path);

    // Load config
    let (config, config_path) = ApiConfig::load(args.config)?;
    tracing::info!("Loaded config from {}", config_path.display());

    // Initialize database
    let db = helpers::database::initialize_database(&config.database)?;
    let store: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(
        db.async_connection.clone(),
        &config.timeouts,
    ));

    let provider = Arc::new(HttpEnrichmentProvider::new(
        &config.enrichment,
        config.timeouts.enrichment(),
    )?);
    tracing::info!("Enrichment provider at {}", config.enrichment.api_url);

    let enrichment_manager = Arc::new(EnrichmentManager::new(
        store.clone(),
        provider,
        config.timeouts.enrichment(),
        config.enrichment.max_concurrent,
    ));

    // Restore interrupted enrichments on startup
    if let Err(e) = enrichment_manager.restore_interrupted().await {
        tracing::warn!("Failed to restore interrupted enrichments: {}", e);
    }

    let identity = Arc::new(StaticTokenIdentity::from_config(&config.auth)?);

    let state = web::Data::new(AppState {
        store: store.clone(),
        importer: ContactImporter::new(
            store.clone(),
            FieldNormalizer::default(),
            config.import.chunk_size,
        ),
        enrichment: enrichment_manager.clone(),
        identity,
    });

    let host = config.server.host.clone();
    let port = config.server.port;
    tracing::info!("Starting server on {}:{}", host, port);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if let Some(cors_config) = &cors_config {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await?;

    // Detached bulk enrichments outlive the HTTP server; give them a moment
    enrichment_manager.shutdown(SHUTDOWN_GRACE).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
