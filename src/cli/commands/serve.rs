use anyhow::Context;
use clap::Args;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::config::AppConfig;
use crate::database::{
    CardStore, CredentialStore, DatabaseManager, MemoryCardStore, MemoryUserStore, PgCardStore,
    PgUserStore,
};
use crate::llm::OpenRouterGenerator;
use crate::server::{self, AppState};
use crate::services::{AuthService, CardsService};

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Keep users and cards in process memory instead of Postgres")]
    pub in_memory: bool,

    #[arg(long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,
}

pub async fn handle(args: ServeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let (users, cards, database): (Arc<dyn CredentialStore>, Arc<dyn CardStore>, _) = if args.in_memory {
        warn!("Serving from in-memory stores; data is lost on shutdown");
        (
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryCardStore::new()),
            None,
        )
    } else {
        config.database_url()?;
        let database = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        database.migrate().await.context("failed to apply schema")?;
        (
            Arc::new(PgUserStore::new(database.pool().clone())),
            Arc::new(PgCardStore::new(database.pool().clone())),
            Some(database),
        )
    };

    let generator = OpenRouterGenerator::new(&config.llm).context("failed to build LLM client")?;
    if !generator.is_configured() {
        warn!("OPENROUTER_API_KEY is not set; card generation will be unavailable");
    }

    let security = &config.security;
    let auth = AuthService::new(
        users,
        TokenIssuer::new(&security.jwt_secret, security.jwt_expiry_hours)?,
        PasswordHasher::new(security.password_memory_kib, security.password_iterations)?,
    );
    let state = AppState {
        auth: Arc::new(auth),
        cards: Arc::new(CardsService::new(cards, Arc::new(generator))),
        database: database.clone(),
        generation_timeout: config.llm.request_timeout(),
    };

    let app = server::app(state, security);
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Cards API ({:?}) listening on http://{}", config.environment, bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
