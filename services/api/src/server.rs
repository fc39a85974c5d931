use crate::cli::ServeArgs;
use crate::infra::{AppContext, AppState};
use crate::routes::app_router;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use talent_bridge::config::AppConfig;
use talent_bridge::dashboard::DashboardSync;
use talent_bridge::error::AppError;
use talent_bridge::telemetry;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let context = Arc::new(AppContext::build(&config)?);
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        context: context.clone(),
    };

    let sync = DashboardSync::start(
        context.dashboard.clone(),
        context.feed.subscribe(),
        config.dashboard.refresh_interval,
    );

    let app = app_router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talent bridge api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    sync.shutdown().await;
    let flushed = context.drafts.flush_all().await?;
    info!(flushed, "pending drafts written; shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "unable to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
