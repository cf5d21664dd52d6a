use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_service::{
    config::Config,
    db::{create_pool, run_migrations},
    middleware::SessionMiddleware,
    routes::configure_routes,
    services::{HtmlRenderer, Mailer, Renderer, SmtpMailer},
    AppState,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; LOG_FORMAT=json switches to structured output
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    if config.is_production() && !config.security.secure_cookies {
        tracing::warn!("SECURE_COOKIES is off in production; session cookies travel over plain HTTP");
    }

    let db_pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;
    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations completed");

    std::fs::create_dir_all(&config.uploads.profile_pics_dir).with_context(|| {
        format!(
            "Failed to create profile picture directory {}",
            config.uploads.profile_pics_dir.display()
        )
    })?;

    let smtp = SmtpMailer::new(&config.email)?;
    tracing::info!(enabled = smtp.is_enabled(), "Email service initialized");
    let mailer: Arc<dyn Mailer> = Arc::new(smtp);
    let renderer: Arc<dyn Renderer> = Arc::new(HtmlRenderer::default());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let state = AppState::new(db_pool, config, mailer, renderer);

    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(SessionMiddleware::new(state.sessions.clone()))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    tracing::info!("blog-service shut down");
    Ok(())
}
