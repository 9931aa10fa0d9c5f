use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use ecoloop::accounts::AccountService;
use ecoloop::config::Config;
use ecoloop::db::{create_pool, run_migrations};
use ecoloop::engine::{GeminiClient, RecommendationEngine};
use ecoloop::http_client::{HttpClient, DEFAULT_TIMEOUT};
use ecoloop::inventory::Inventory;
use ecoloop::middleware::AuthLayer;
use ecoloop::proto::auth::auth_service_server::AuthServiceServer;
use ecoloop::proto::health::health_server::HealthServer;
use ecoloop::proto::items::items_service_server::ItemsServiceServer;
use ecoloop::proto::FILE_DESCRIPTOR_SET;
use ecoloop::services::{AuthServiceImpl, HealthServiceImpl, ItemsServiceImpl};
use ecoloop::session::TokenSigner;
use ecoloop::storage::{LocalStore, PgStore, Stores};

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            tracing::info!("Database connection established");
            Ok(Stores::from_backend(PgStore::new(pool)))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using local store at {}", config.data_path.display());
            let store = LocalStore::open(&config.data_path).await?;
            Ok(Stores::from_backend(store))
        }
    }
}

fn build_engine(config: &Config) -> anyhow::Result<RecommendationEngine> {
    match &config.gemini_api_key {
        Some(api_key) => {
            tracing::info!("Recommendation model enabled: {}", config.gemini_model);
            let http = HttpClient::new(DEFAULT_TIMEOUT)?;
            Ok(RecommendationEngine::new(Arc::new(GeminiClient::new(
                http,
                api_key.clone(),
                config.gemini_model.clone(),
                config.gemini_base_url.clone(),
            ))))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set, recommendations use the baseline fallback");
            Ok(RecommendationEngine::offline())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecoloop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting ecoloop gRPC server...");

    let stores = open_stores(&config).await?;
    let engine = Arc::new(build_engine(&config)?);

    let accounts = Arc::new(AccountService::new(
        stores.users.clone(),
        TokenSigner::new(config.jwt_secret.clone()),
    ));
    let inventory = Arc::new(Inventory::new(&stores, engine));

    let auth_service = AuthServiceImpl::new(accounts.clone());
    let items_service = ItemsServiceImpl::new(inventory);
    let health_service = HealthServiceImpl::new();

    // CORS layer for gRPC-Web
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any);

    let reflection_service = ReflectionBuilder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    Server::builder()
        .accept_http1(true) // Required for gRPC-Web
        .layer(cors)
        .layer(tonic_web::GrpcWebLayer::new())
        .layer(AuthLayer::new(accounts))
        .add_service(reflection_service)
        .add_service(AuthServiceServer::new(auth_service))
        .add_service(ItemsServiceServer::new(items_service))
        .add_service(HealthServer::new(health_service))
        .serve(addr)
        .await?;

    Ok(())
}
