use clap::Parser;
use eventhub::db::schema;
use eventhub::db::services::UserService;
use eventhub::server::config::ServerConfig;
use eventhub::version::VERSION;
use eventhub::web::create_axum_router;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Logging depends on the configured directory, so config errors go to stderr.
    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!("Starting server, version: {}", VERSION);

    // --- Database Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url.to_owned());
    opt.max_connections(server_config.max_connections);
    let db_pool = Arc::new(Database::connect(opt).await?);

    schema::create_tables(&*db_pool).await?;

    if let Some((email, password)) = server_config.first_superuser() {
        let users = UserService::new(db_pool.clone()).with_hash_cost(server_config.bcrypt_cost);
        match users.ensure_first_superuser(email, password).await {
            Ok(user) => info!(user_id = %user.id, "First superuser is present."),
            Err(e) => {
                error!(error = %e, "Failed to bootstrap the first superuser.");
                return Err(e.into());
            }
        }
    }

    // --- Axum HTTP Server Setup ---
    let app = create_axum_router(db_pool, server_config.clone());
    let listener = tokio::net::TcpListener::bind(&server_config.bind_address).await?;
    info!(address = %server_config.bind_address, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the shutdown signal.");
    }
}
