//! End-to-end tests: demo server on an ephemeral port, driven through the
//! `Invoker` and through raw HTTP.

use std::net::SocketAddr;

use postrpc_client::{ClientError, Invoker, RpcOutcome, rpc_params};
use postrpc_demos::{GREETING, PARAMS_MISMATCH, PARAMS_OK, demo_registry};
use postrpc_http_server::HttpRpcServer;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn start_server(max_body_size: Option<usize>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut builder = HttpRpcServer::builder()
        .registry(demo_registry())
        .greeting(GREETING);
    builder = match max_body_size {
        Some(limit) => builder.max_body_size(limit),
        None => builder.unlimited_body(),
    };
    let server = builder.build();

    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

async fn raw_post(addr: SocketAddr, body: &'static str) -> (StatusCode, String) {
    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_insert_mismatch_and_match() {
    let addr = start_server(Some(1024 * 1024)).await;
    let invoker = Invoker::new(&format!("http://{}/", addr)).unwrap();

    let outcome = invoker.invoke("insert", rpc_params![1, 2]).await.unwrap();
    assert_eq!(outcome, RpcOutcome::Error(PARAMS_MISMATCH.to_string()));

    let outcome = invoker.invoke("insert", rpc_params![2, 2]).await.unwrap();
    assert_eq!(outcome, RpcOutcome::Result(json!(PARAMS_OK)));
}

#[tokio::test]
async fn test_wire_bodies_match_exactly() {
    let addr = start_server(Some(1024 * 1024)).await;

    let (status, body) =
        raw_post(addr, r#"{"jsonrpc":"2.0","method":"insert","params":[1,2],"id":1}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"jsonrpc":"2.0","id":1,"error":"Params doesn't match!"}"#);

    let (status, body) =
        raw_post(addr, r#"{"jsonrpc":"2.0","method":"insert","params":[2,2],"id":1}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"jsonrpc":"2.0","id":1,"result":"Params are OK!"}"#);
}

#[tokio::test]
async fn test_private_method_rejected_but_delegation_works() {
    let addr = start_server(Some(1024 * 1024)).await;

    let (status, body) = raw_post(addr, r#"{"jsonrpc":"2.0","method":"_private","id":2}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"jsonrpc":"2.0","id":2,"error":"Invalid request method"}"#);

    let invoker = Invoker::new(&format!("http://{}/", addr)).unwrap();
    let outcome = invoker.invoke("audited", rpc_params![1, 2, 3]).await.unwrap();
    assert_eq!(outcome, RpcOutcome::Result(json!({"private": true, "params": 3})));
}

#[tokio::test]
async fn test_malformed_body_gets_sentinel_error() {
    let addr = start_server(Some(1024 * 1024)).await;

    let (status, body) = raw_post(addr, "not-json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"jsonrpc":"2.0","id":-1,"error":"Runtime error"}"#);

    // The server keeps serving afterwards.
    let (status, _) = raw_post(addr, r#"{"method":"echo","params":[1],"id":3}"#).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_id_less_request_gets_empty_body() {
    let addr = start_server(Some(1024 * 1024)).await;

    let (status, body) = raw_post(addr, r#"{"jsonrpc":"2.0","method":"insert","params":[5,5]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_unknown_method_through_invoker() {
    let addr = start_server(Some(1024 * 1024)).await;
    let invoker = Invoker::new(&format!("http://{}/", addr)).unwrap();

    let outcome = invoker.invoke("subtract", rpc_params![3, 1]).await.unwrap();
    assert_eq!(outcome, RpcOutcome::Error("Invalid request method".to_string()));

    let outcome = invoker.invoke("_private", rpc_params![]).await.unwrap();
    assert!(outcome.is_error());
}

#[tokio::test]
async fn test_echo_round_trips_structured_params() {
    let addr = start_server(None).await;
    let invoker = Invoker::new(&format!("http://{}/any/path", addr)).unwrap();

    let params = rpc_params!["text", 1.5, Value::Null, json!({"nested": [true, false]})];
    let outcome = invoker.invoke("echo", params.clone()).await.unwrap();
    assert_eq!(outcome, RpcOutcome::Result(Value::Array(params)));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let addr = start_server(Some(64)).await;
    let invoker = Invoker::new(&format!("http://{}/", addr)).unwrap();

    let outcome = invoker
        .invoke("echo", rpc_params!["x".repeat(256)])
        .await
        .unwrap();
    assert_eq!(outcome, RpcOutcome::Error("Request body too large".to_string()));
}

#[tokio::test]
async fn test_greeting_on_get() {
    let addr = start_server(Some(1024 * 1024)).await;

    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), GREETING);
}

#[tokio::test]
async fn test_callback_receives_outcome() {
    let addr = start_server(Some(1024 * 1024)).await;
    let invoker = Invoker::new(&format!("http://{}/", addr)).unwrap();

    let mut received = Vec::new();
    for params in [rpc_params![7, 7], rpc_params![7, 8]] {
        invoker
            .invoke_with_callback("insert", params, |outcome| received.push(outcome))
            .await
            .unwrap();
    }

    assert_eq!(
        received,
        vec![
            RpcOutcome::Result(json!(PARAMS_OK)),
            RpcOutcome::Error(PARAMS_MISMATCH.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_server_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let invoker = Invoker::new(&format!("http://{}/", addr)).unwrap();
    let mut called = false;
    let result = invoker
        .invoke_with_callback("insert", rpc_params![1, 1], |_| called = true)
        .await;

    assert!(matches!(result, Err(ClientError::Connection(_))));
    assert!(!called);
}
