// End-to-end tests against a real listener

use mock_kms::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn test_config() -> KmsConfig {
    KmsConfig {
        port: 0,
        bind_address: "127.0.0.1".to_string(),
        key_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("dev_key"),
        node_ids: vec!["rp1".to_string(), "idp1".to_string()],
        proxy_node_ids: vec!["proxy2_idp5".to_string()],
    }
}

fn sign_request(node_id: &str) -> Value {
    json!({
        "node_id": node_id,
        "request_message": base64::encode(b"end to end"),
        "hash_method": "SHA256",
        "key_type": "RSA",
        "sign_method": "RSA-SHA256",
    })
}

#[tokio::test]
async fn test_sign_over_http() {
    let server = start(&test_config()).await.unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    server
        .events()
        .subscribe(KmsEventKind::SignCallback, move |event| {
            sink.lock().unwrap().push(event.payload.clone())
        });

    let url = format!("http://{}/kms/sign", server.local_addr());
    let response = reqwest::Client::new()
        .post(&url)
        .json(&sign_request("proxy2_idp5"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let signature = base64::decode(body["signature"].as_str().unwrap()).unwrap();
    assert_eq!(signature.len(), 256);
    assert_eq!(seen.lock().unwrap().as_slice(), &[sign_request("proxy2_idp5")]);

    stop(server).await.unwrap();
}

#[tokio::test]
async fn test_rotation_is_visible_over_http() {
    let server = start(&test_config()).await.unwrap();
    let kms = server.kms();
    let url = format!("http://{}/kms/master/sign", server.local_addr());
    let client = reqwest::Client::new();

    let pem = std::fs::read_to_string(
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ec_p384_pkcs8.pem"),
    )
    .unwrap();
    kms.set_node_signing_master_key("idp1", pem, SigningAlgorithm::EcdsaSha384)
        .unwrap();

    let body: Value = client
        .post(&url)
        .json(&sign_request("idp1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let signature = base64::decode(body["signature"].as_str().unwrap()).unwrap();
    // DER SEQUENCE tag
    assert_eq!(signature[0], 0x30);

    kms.set_key_source(KeySourceMode::Original);
    let body: Value = client
        .post(&url)
        .json(&sign_request("idp1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let signature = base64::decode(body["signature"].as_str().unwrap()).unwrap();
    assert_eq!(signature.len(), 256);

    stop(server).await.unwrap();
}

#[tokio::test]
async fn test_unknown_node_returns_error_body() {
    let server = start(&test_config()).await.unwrap();
    let url = format!("http://{}/kms/decrypt", server.local_addr());

    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({"node_id": "as9", "encrypted_message": base64::encode(b"x")}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], 1001);

    stop(server).await.unwrap();
}

#[tokio::test]
async fn test_two_servers_run_side_by_side() {
    let first = start(&test_config()).await.unwrap();
    let second = start(&test_config()).await.unwrap();
    assert_ne!(first.local_addr(), second.local_addr());

    stop(first).await.unwrap();
    stop(second).await.unwrap();
}
