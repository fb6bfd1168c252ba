use string_service::config::StringConfig;
use string_service::startup::Application;
use tokio_util::sync::CancellationToken;

pub struct TestApp {
    pub http_address: String,
    pub grpc_address: String,
    pub shutdown: CancellationToken,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let app = Application::build(StringConfig::for_tests())
            .await
            .expect("Failed to build test application");

        let http_address = format!("http://127.0.0.1:{}", app.http_port());
        let grpc_address = format!("http://127.0.0.1:{}", app.grpc_port());
        let shutdown = app.shutdown_token();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            grpc_address,
            shutdown,
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
