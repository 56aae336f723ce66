use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infinito_api::{
    build_router,
    config::{Config, StoreBackend},
    state::AppState,
};
use infinito_llm::{Generator, HttpGenerator};
use infinito_persist::{GenerationStore, InMemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Infinito API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!(endpoint = %config.generator.endpoint, model = %config.generator.model, "Initializing generator");
    let generator: Arc<dyn Generator> = Arc::new(HttpGenerator::from_config(&config.generator)?);

    let (store, backend) = connect_store(&config).await?;

    let state = Arc::new(
        AppState::new(
            store,
            generator,
            config.generator.clone(),
            config.expansion.clone(),
        )
        .with_store_backend(backend),
    );

    let app = build_router(state, &config.cors, config.server.request_timeout());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<(Arc<dyn GenerationStore>, &'static str)> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, generations are lost on restart");
            Ok((Arc::new(InMemoryStore::new()), "memory"))
        }
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongodb => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("MONGODB_URI is not set"))?;
            tracing::info!("Connecting to MongoDB");
            let store =
                infinito_persist::MongoGenerationStore::connect(uri, &config.store.database).await?;
            tracing::info!(database = %config.store.database, "MongoDB connected");
            Ok((Arc::new(store), "mongodb"))
        }
        #[cfg(not(feature = "mongodb"))]
        StoreBackend::Mongodb => Err(anyhow::anyhow!(
            "store.backend = \"mongodb\" requires building with the `mongodb` feature"
        )),
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
