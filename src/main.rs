use inkpress::{AppConfig, AppState, build_router, migrations::Migrator, seed::seed_roles};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("inkpress={0},tower_http={0}", config.log_level))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied");
    seed_roles(&db).await?;

    let address = config.listen_address();
    tracing::info!(
        show_metadata = config.show_metadata,
        show_pagination = config.show_pagination,
        "Configuration loaded"
    );

    let app = build_router(AppState::new(db, config));
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
