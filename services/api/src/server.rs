use crate::cli::ServeArgs;
use crate::infra::{open_store, AppState, TracingNotifier};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rcd_permits::config::AppConfig;
use rcd_permits::error::AppError;
use rcd_permits::graphql::build_schema;
use rcd_permits::telemetry;
use rcd_permits::workflows::employees::EmployeeService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(database) = args.database.take() {
        config.database.path = database;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    if config.database.is_in_memory() {
        warn!("serving from an in-memory database; records are lost on shutdown");
    }
    let store = open_store(&config.database)?;
    let schema = build_schema(store.clone(), Arc::new(TracingNotifier), config.fees);
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        schema,
        employees: Arc::new(EmployeeService::new(store)),
    };

    let app = with_portal_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rcd permit portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
