use user_service::config::{UserConfig, SERVICE_NAME};
use user_service::startup::Application;
use service_core::config::TelemetryConfig;
use service_core::observability::{init_metrics, init_tracing};
use service_core::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_tracing(
        SERVICE_NAME,
        &telemetry.log_level,
        telemetry.otlp_endpoint.as_deref(),
    );
    init_metrics();

    let config = UserConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    let shutdown = app.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    app.run_until_stopped().await
}
