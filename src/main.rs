//! `accreditation-scoring` - serves the scoring API.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use accreditation_scoring::adapters::http::{app_router, ScoringAppState};
use accreditation_scoring::adapters::{
    run_migrations, InMemoryScoreStore, PostgresDesiredGradeReader, PostgresScoreStore,
    StaticDesiredGrade,
};
use accreditation_scoring::config::{AppConfig, ConfigError, DesiredGradeSource, ValidationError};
use accreditation_scoring::ports::{DesiredGradeReader, ScoreStore};
use accreditation_scoring::telemetry::{self, TelemetryError};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("Database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for StartupError {
    fn from(err: ValidationError) -> Self {
        StartupError::Config(ConfigError::from(err))
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init(&config.server)?;

    let catalog = config.scoring.load_catalog().map_err(ConfigError::from)?;
    let weights = config
        .scoring
        .load_weights(&catalog)
        .map_err(ConfigError::from)?;

    let (store, desired_grade_reader): (Arc<dyn ScoreStore>, Arc<dyn DesiredGradeReader>) =
        match &config.database {
            Some(database) => {
                let pool = database.connect().await?;
                if database.run_migrations {
                    run_migrations(&pool).await?;
                    info!("Migrations applied");
                }
                let reader: Arc<dyn DesiredGradeReader> =
                    match config.scoring.desired_grade_source {
                        DesiredGradeSource::Database => Arc::new(PostgresDesiredGradeReader::new(
                            pool.clone(),
                            config.scoring.institution_id,
                        )),
                        DesiredGradeSource::Static => Arc::new(StaticDesiredGrade::default()),
                    };
                let store: Arc<dyn ScoreStore> = Arc::new(PostgresScoreStore::new(pool));
                (store, reader)
            }
            None => {
                info!("No database configured, keeping scores in memory");
                let store: Arc<dyn ScoreStore> = Arc::new(InMemoryScoreStore::new());
                let reader: Arc<dyn DesiredGradeReader> = Arc::new(StaticDesiredGrade::default());
                (store, reader)
            }
        };

    let state = ScoringAppState {
        store,
        desired_grade_reader,
        catalog: Arc::new(catalog),
        weights: Arc::new(weights),
        default_grade: config.scoring.default_desired_grade,
        institution_id: config.scoring.institution_id,
    };
    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(environment = ?config.server.environment, %addr, "Accreditation scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
