#![allow(dead_code)]

use hop_api::{HopClient, HopConfig};
use serde_json::{Value, json};
use wiremock::{MockServer, ResponseTemplate};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn client(server: &MockServer, token: &str) -> HopClient {
    init_logging();
    HopClient::new(HopConfig::new(token).with_base_url(server.uri())).expect("client build")
}

pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

pub fn api_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "success": false,
        "error": { "code": code, "message": message }
    }))
}

pub fn channel_json(id: &str, state: Value) -> Value {
    json!({
        "id": id,
        "project": null,
        "state": state,
        "capabilities": 0,
        "created_at": "2023-01-01T00:00:00Z",
        "type": "unprotected"
    })
}

pub async fn requests(server: &MockServer) -> Vec<wiremock::Request> {
    server.received_requests().await.unwrap_or_default()
}
