mod common;

use common::TestApp;
use tonic_health::pb::{
    health_check_response::ServingStatus, health_client::HealthClient, HealthCheckRequest,
};
use service_core::grpc::StringClient;

#[tokio::test]
async fn uppercase_and_count_over_grpc() {
    let app = TestApp::spawn().await;
    let client = StringClient::connect(&app.grpc_address).await.unwrap();

    let reply = client.uppercase("gokit".to_string()).await.unwrap();
    assert_eq!(reply.v, "GOKIT");
    assert!(reply.err.is_empty());

    let reply = client.uppercase(String::new()).await.unwrap();
    assert_eq!(reply.err, "Empty string");

    let reply = client.count("abcd".to_string()).await.unwrap();
    assert_eq!(reply.v, 4);
}

#[tokio::test]
async fn grpc_health_reports_serving() {
    let app = TestApp::spawn().await;
    let channel = tonic::transport::Endpoint::new(app.grpc_address.clone())
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut health = HealthClient::new(channel);

    let resp = health
        .check(HealthCheckRequest {
            service: "svckit.string.v1.StringService".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.status, ServingStatus::Serving as i32);
}
