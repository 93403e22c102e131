use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::identity::repo::seaorm::SeaOrmIdentityRepository;
use service::identity::repository::IdentityRepository;
use service::identity::IdentityConfig;
use service::oauth::google::{GoogleOAuthClient, GoogleOAuthConfig};
use service::oauth::OAuthProvider;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &configs::ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", cfg.host, cfg.port)))
}

/// Google provider from config; missing credentials disable the routes.
pub fn build_google(cfg: &configs::GoogleConfig) -> Result<Option<Arc<dyn OAuthProvider>>, StartupError> {
    let Some(google_cfg) = GoogleOAuthConfig::from_config(cfg) else {
        warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set; Google login disabled");
        return Ok(None);
    };
    let client = GoogleOAuthClient::new(google_cfg).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    info!(callback = %cfg.callback_url, "Google login enabled");
    Ok(Some(Arc::new(client)))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = configs::AppConfig::load_or_env()?;

    // DB connection
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await?;
        info!("database migrations applied");
    }

    let repo: Arc<dyn IdentityRepository> = Arc::new(SeaOrmIdentityRepository::new(db));
    let google = build_google(&cfg.google)?;
    let state = auth::ServerState::new(
        repo,
        IdentityConfig::from_auth(&cfg.auth),
        auth::ServerAuthConfig::from(&cfg.auth),
        google,
    );

    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
