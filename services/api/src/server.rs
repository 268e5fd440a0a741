use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryProfileRepository};
use crate::routes::with_ranking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talent_rank::config::AppConfig;
use talent_rank::error::AppError;
use talent_rank::telemetry;
use talent_rank::workflows::ranking::{ProfileCsvImporter, RankingError, RankingService};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryProfileRepository::default());
    if let Some(path) = args.profiles_csv.take() {
        let profiles = ProfileCsvImporter::from_path(&path)?;
        let seeded = repository.seed(profiles).map_err(RankingError::from)?;
        info!(seeded, path = %path.display(), "profile store seeded");
    }

    let ranking_service = Arc::new(RankingService::new(repository, config.ranking.clone()));
    if args.sweep_on_start {
        let summary = ranking_service.recalculate_all_rankings()?;
        info!(?summary, "startup ranking sweep finished");
    }

    let app = with_ranking_routes(ranking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ranking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
