use crate::cli::ServeArgs;
use crate::infra::{bootstrap, AppState};
use crate::routes::with_school_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use schoolmgmt::config::AppConfig;
use schoolmgmt::telemetry;
use schoolmgmt::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let school = bootstrap(&config, args.seed)?;
    if let Some(summary) = &school.seeded {
        info!(
            colleges = summary.colleges,
            students = summary.students,
            enrollments = summary.enrollments.total,
            "sample data loaded"
        );
    }
    info!(admin = %school.admin.id, username = %school.admin.username, "bootstrap admin ready");

    let app = with_school_routes(school.repository)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        uniqueness = config.enrollment.uniqueness.label(),
        "school management service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
