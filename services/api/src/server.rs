use crate::cli::ServeArgs;
use crate::infra::{seed_demo_accounts, AppState, InMemoryCustomerDirectory, InMemoryTransactionLog};
use crate::routes::with_loyalty_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use dogslife::config::AppConfig;
use dogslife::error::AppError;
use dogslife::loyalty::{LoyaltyService, ProgressionEngine, Rulebook};
use dogslife::telemetry;

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

    let directory = Arc::new(InMemoryCustomerDirectory::default());
    let log = Arc::new(InMemoryTransactionLog::default());
    let service = Arc::new(LoyaltyService::new(
        directory,
        log,
        ProgressionEngine::new(Rulebook::standard()),
    ));

    if let Err(err) = seed_demo_accounts(&service) {
        info!(%err, "demo seed skipped");
    }

    let app = with_loyalty_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dogslife balance service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
