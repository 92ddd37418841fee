use actix_web::{web, App, HttpServer};
use mongo_gateway::{configure, cors, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> mongo_gateway::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!("Starting server at {}:{}", config.server.host, config.server.port);

    let state = web::Data::new(AppState::new(config.clone()));

    // Sessions live in memory only; sweep the idle ones periodically
    if config.session.idle_timeout().is_some() {
        let sweep_state = state.clone();
        let interval = config.session.cleanup_interval();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let evicted = sweep_state.sessions.evict_idle().await;
                if !evicted.is_empty() {
                    info!("Evicted {} idle session(s)", evicted.len());
                }
            }
        });
    }

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    let workers = config.server.workers();
    let cors_config = config.cors.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&cors_config))
            .app_data(state.clone())
            .configure(configure)
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
