/// Quill Auth Service - Main entry point

use std::net::SocketAddr;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use quill_auth::{
    config::Config,
    db::PgAccountStore,
    routes,
    security::{token_revocation::RedisRevocationRegistry, SecretBox, TokenIssuer},
    services::{AuthService, SmtpCodeDelivery, TwoFaService},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        "Starting Quill Auth Service on {}:{}",
        config.server_host,
        config.server_port
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database connection pool initialized");

    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let redis_conn = ConnectionManager::new(redis_client).await?;
    tracing::info!("Redis connection initialized");

    let accounts = Arc::new(PgAccountStore::new(db_pool));
    let registry = Arc::new(RedisRevocationRegistry::new(redis_conn));
    let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret));
    let secret_box = SecretBox::from_base64(&config.twofa_enc_key)?;
    let delivery = Arc::new(SmtpCodeDelivery::from_config(&config)?);

    let two_fa = TwoFaService::new(accounts.clone(), delivery, secret_box);
    let auth = AuthService::new(accounts, registry, tokens, two_fa.clone());

    let state = AppState {
        auth,
        two_fa,
        cookie_secure: config.cookie_secure,
    };

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("REST API listening on {}", addr);

    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
