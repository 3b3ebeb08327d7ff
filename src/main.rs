use std::sync::Arc;

use anyhow::Result;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{prelude::*, EnvFilter};
use zhihu_client::{ZhihuClient, ZhihuClientConfig};

use redwatch::config::Config;
use redwatch::db::{self, repo::Repo};
use redwatch::notify::{Notifier, SmtpMailer};
use redwatch::scheduler::{AuthorWatch, JobRegistry, QuestionWatch};
use redwatch::source::RemoteSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize variables
    let log_level = config.log_level();
    let log_dir = &config.logging.dir;

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(log_dir)?;

    // Setup file appender (daily rotation)
    let file_appender = tracing_appender::rolling::daily(log_dir, "redwatch.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Use local time for log timestamps
    let local_timer = ChronoLocal::rfc_3339();

    // Setup stdout layer with local time
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_timer(local_timer.clone());

    // Setup file layer with local time
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_timer(local_timer)
        .with_writer(non_blocking);

    // Filter layer based on config
    let filter_layer = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("sqlx=warn".parse()?)
        .add_directive("sea_orm=warn".parse()?);

    // Combine layers
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Starting Redwatch...");
    info!("Logs are written to: {}", log_dir);

    // Connect to database
    let db = db::establish_connection(&config.database.url).await?;
    info!("Database connection established");

    // Run migrations
    migration::Migrator::up(&db, None).await?;
    info!("✅ Database migrations completed");

    // Initialize repository
    let repo = Arc::new(Repo::new(db.clone()));

    // Test database connection
    repo.ping().await?;
    info!("✅ Database ping successful");

    // Initialize site client
    let zhihu = ZhihuClient::new(ZhihuClientConfig {
        timeout_secs: config.source.timeout_secs,
    })?;
    let source: Arc<dyn RemoteSource> = Arc::new(zhihu);
    info!("✅ Site client initialized");

    // Initialize mail dispatch
    let mailer = Arc::new(SmtpMailer::new(&config.mail)?);
    if mailer.is_configured() {
        info!("✅ SMTP mailer initialized ({})", config.mail.host);
    }
    let notifier = Arc::new(Notifier::new(
        Arc::clone(&repo),
        mailer,
        config.mail.subject.clone(),
    ));

    // Initialize job registry and watch controllers
    let registry = Arc::new(JobRegistry::new().await?);
    let author_watch = AuthorWatch::new(
        Arc::clone(&repo),
        Arc::clone(&source),
        Arc::clone(&notifier),
        Arc::clone(&registry),
        config.scheduler.clone(),
    );
    let question_watch = QuestionWatch::new(
        Arc::clone(&repo),
        Arc::clone(&source),
        Arc::clone(&notifier),
        Arc::clone(&registry),
        config.scheduler.clone(),
    );

    // Rebuild jobs for rows whose status survived the last shutdown
    let authors_restored = author_watch.restore_active().await?;
    let questions_restored = question_watch.restore_active().await?;
    info!(
        "✅ Watches restored: {} authors, {} questions",
        authors_restored, questions_restored
    );

    registry.start().await?;
    info!("🚀 Job scheduler started");

    // Startup statistics
    info!(
        "📊 Tracking {} authors ({} active), {} questions ({} active), {} receivers",
        repo.count_all_authors().await?,
        repo.count_active_authors().await?,
        repo.count_all_questions().await?,
        repo.count_active_questions().await?,
        repo.count_all_receivers().await?,
    );

    info!("Redwatch initialization complete");

    // Setup Ctrl+C handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down...");
        let _ = shutdown_tx.send(()).await;
    });

    // Wait for shutdown signal
    shutdown_rx.recv().await;
    info!("Shutting down gracefully...");

    registry.shutdown().await?;

    info!("✅ Shutdown complete");
    Ok(())
}
