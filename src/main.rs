use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use price_tracker::{ Config, Result };
use teloxide::Bot;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

use price_tracker::api::{ router, AppState };
use price_tracker::db::TrackingRepository;
use price_tracker::notify::{ NotificationDispatcher, TelegramNotifier };
use price_tracker::scraper::HttpScraper;
use price_tracker::services::TrackingService;
use price_tracker::tracker::{ ItemLocks, PriceChecker, Tracker };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "price_tracker=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| price_tracker::AppError::Config(e.to_string()))?;

    tracing::info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        shop = %config.scraper.shop_base_url,
        "Starting price tracker"
    );

    // Initialize database connection
    let db = sea_orm::Database::connect(&config.database_url).await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations completed successfully");

    let store = Arc::new(TrackingRepository::new(db));
    let source = Arc::new(HttpScraper::new(&config.scraper)?);
    let bot = Bot::new(&config.telegram_bot_token);

    let tracker = Tracker::new(store.clone(), ItemLocks::new());

    let dispatcher = Arc::new(
        NotificationDispatcher::new(
            store.clone(),
            Arc::new(TelegramNotifier::new(bot.clone())),
            config.notification_max_attempts,
            config.notification_batch_size
        )
    );

    let tracking_service = Arc::new(
        TrackingService::new(
            tracker.clone(),
            source.clone(),
            config.default_threshold_ratio
        ).with_dispatcher(dispatcher.clone())
    );

    // Deliver queued and retried notifications between poll cycles
    tokio::spawn(dispatcher.clone().start(config.notification_flush_interval));

    // Start background price checker
    let checker = PriceChecker::new(
        tracker,
        source,
        dispatcher,
        config.poll_interval,
        config.scraper.fetch_budget(),
        config.scraper.max_concurrent
    );
    tokio::spawn(checker.start());
    tracing::info!("Price checker started");

    // Start Telegram bot
    tokio::spawn(price_tracker::bot::run_bot(bot, tracking_service.clone()));

    let app = router(AppState::new(tracking_service));

    // Start server
    let addr = config.bind_address();
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| price_tracker::AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| price_tracker::AppError::Internal(e.to_string()))?;

    Ok(())
}
