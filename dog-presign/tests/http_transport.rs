use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dog_presign::{
    FileBlob, HttpTransferClient, MemoryObjectStore, TransferClient, TransferConfig, TransferCtx,
    TransferError, TransferOrchestrator,
};
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpTransferClient {
    HttpTransferClient::new(Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn put_sends_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/myBucket/abc"))
        .and(header("content-type", "application/pdf"))
        .and(body_bytes(b"pdf bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/myBucket/abc?X-Amz-Signature=sig", server.uri());
    let response = client()
        .put(&url, Some("application/pdf"), Bytes::from_static(b"pdf bytes"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_success());
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<Error>AccessDenied</Error>"))
        .mount(&server)
        .await;

    let url = format!("{}/myBucket/abc", server.uri());
    let response = client().put(&url, None, Bytes::from_static(b"x")).await.unwrap();
    assert_eq!(response.status, 403);
    assert!(!response.is_success());
}

#[tokio::test]
async fn get_returns_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/myBucket/abc"))
        .and(query_param("X-Amz-Signature", "sig"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_bytes(b"hello".to_vec()),
        )
        .mount(&server)
        .await;

    let url = format!("{}/myBucket/abc?X-Amz-Signature=sig", server.uri());
    let response = client().get(&url).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], b"hello");
    assert_eq!(response.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn unreachable_host_is_transfer_failed() {
    // Nothing listens on the discard port
    let err = client()
        .get("http://127.0.0.1:9/myBucket/abc")
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::TransferFailed { status: None, .. }));
}

#[tokio::test]
async fn timeout_is_transfer_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let slow = HttpTransferClient::new(Some(Duration::from_millis(200))).unwrap();
    let err = slow
        .get(&format!("{}/myBucket/abc", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TransferFailed");
}

/// Grants signed by the memory store, bytes carried over real HTTP
async fn orchestrator_against(server: &MockServer) -> (Arc<MemoryObjectStore>, TransferOrchestrator) {
    let store = Arc::new(MemoryObjectStore::with_base_url(server.uri()));
    let transport = Arc::new(client());
    let transfers = TransferOrchestrator::new(store.clone(), transport, TransferConfig::default()).unwrap();
    (store, transfers)
}

#[tokio::test]
async fn upload_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (_store, transfers) = orchestrator_against(&server).await;
    let file = FileBlob::new(b"over the wire".to_vec())
        .with_file_name("wire.txt")
        .with_content_type("text/plain");

    let key = transfers.upload(&TransferCtx::new(), &file).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), format!("/{}", key));
    assert_eq!(requests[0].body, b"over the wire".to_vec());
}

#[tokio::test]
async fn upload_rejected_by_backend_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (_store, transfers) = orchestrator_against(&server).await;
    let file = FileBlob::new(b"denied".to_vec()).with_file_name("denied.txt");

    let err = transfers.upload(&TransferCtx::new(), &file).await.unwrap_err();
    assert!(matches!(err, TransferError::AccessGrantExpired));
}

#[tokio::test]
async fn download_over_http_with_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (store, transfers) = orchestrator_against(&server).await;
    store.insert("myBucket/abc", b"known".to_vec());

    let err = transfers.download(&TransferCtx::new(), "myBucket/abc").await.unwrap_err();
    assert!(matches!(err, TransferError::TransferFailed { status: Some(500), .. }));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn download_over_http_with_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (store, transfers) = orchestrator_against(&server).await;
    store.insert("myBucket/abc", b"known".to_vec());

    let err = transfers.download(&TransferCtx::new(), "myBucket/abc").await.unwrap_err();
    assert!(matches!(err, TransferError::EmptyFile));
}
