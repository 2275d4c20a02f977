use std::net::SocketAddr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};

use meu_bentin as app;

#[derive(Debug, Parser)]
#[command(name = "meu-bentin", version, about = "Meu Bentin back office server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print an Argon2 hash for APP__OPERATOR_PASSWORD_HASH
    HashPassword {
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::HashPassword { password }) = &cli.command {
        let hash = app::auth::hash_password(password).map_err(|e| anyhow!(e.to_string()))?;
        println!("{}", hash);
        return Ok(());
    }

    let cfg = app::config::load_config().context("failed to load configuration")?;
    app::config::init_tracing(&cfg.log_level, cfg.log_json);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => migrate(&cfg).await,
        _ => serve(cfg).await,
    }
}

async fn migrate(cfg: &app::config::AppConfig) -> Result<()> {
    if !cfg.uses_database() {
        return Err(anyhow!("APP__DATABASE_URL is not set; nothing to migrate"));
    }
    let pool = app::db::establish_connection_from_app_config(cfg).await?;
    app::db::run_migrations(&pool).await?;
    info!("Migrations applied");
    Ok(())
}

async fn serve(cfg: app::config::AppConfig) -> Result<()> {
    let backend = app::store::Backend::open(&cfg)
        .await
        .context("failed to open the store")?;

    let (event_sender, event_rx) = app::events::EventSender::channel(cfg.event_channel_capacity);
    tokio::spawn(app::events::process_events(event_rx));

    if cfg.operator_password_hash.trim().is_empty() {
        warn!("APP__OPERATOR_PASSWORD_HASH is not set; login is disabled");
    }

    let cors = app::cors_layer(&cfg)?;
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;

    let state = app::AppState::new(cfg, backend, event_sender);
    if let Err(e) = state.services.load_all().await {
        error!("Initial load failed, starting with an empty state: {}", e);
    }
    let drafts = state.drafts.clone();

    let router = app::app_router(state).layer(cors);

    info!("meu-bentin listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = drafts.flush().await {
        warn!("Failed to flush drafts on shutdown: {}", e);
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
