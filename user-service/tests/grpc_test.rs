mod common;

use common::TestApp;
use service_core::grpc::UserClient;

#[tokio::test]
async fn register_login_and_validate_over_grpc() {
    let app = TestApp::spawn().await;
    let client = UserClient::connect(&app.grpc_address).await.unwrap();

    let reply = client
        .register("grace".into(), "pw".into(), "Grace".into())
        .await
        .unwrap();
    assert!(reply.err.is_empty());
    assert!(!reply.id.is_empty());

    let reply = client
        .register("grace".into(), "pw".into(), "Grace".into())
        .await
        .unwrap();
    assert_eq!(reply.err, "username existed");

    let login = client.login("grace".into(), "pw".into()).await.unwrap();
    assert!(login.err.is_empty());
    assert_eq!(login.expires_in, 3600);

    let valid = client.valid_token(login.token).await.unwrap();
    assert!(valid.valid);
    assert_eq!(valid.username, "grace");
}

#[tokio::test]
async fn update_password_over_grpc() {
    let app = TestApp::spawn().await;
    let client = UserClient::connect(&app.grpc_address).await.unwrap();
    client
        .register("heidi".into(), "old".into(), String::new())
        .await
        .unwrap();

    let reply = client
        .update_password("heidi".into(), "bad".into(), "new".into())
        .await
        .unwrap();
    assert_eq!(reply.err, "username or password not match");

    let reply = client
        .update_password("heidi".into(), "old".into(), "new".into())
        .await
        .unwrap();
    assert!(reply.err.is_empty());

    let login = client.login("heidi".into(), "old".into()).await.unwrap();
    assert_eq!(login.err, "wrong password");
}

#[tokio::test]
async fn empty_username_is_invalid_argument() {
    let app = TestApp::spawn().await;
    let client = UserClient::connect(&app.grpc_address).await.unwrap();

    let status = client
        .register(String::new(), "pw".into(), String::new())
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}
