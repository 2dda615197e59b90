// Request handlers for /kms/decrypt, /kms/sign and /kms/master/sign

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::error::{error_codes, KmsError, KmsResult};
use crate::events::{KmsEvent, KmsEventKind};
use crate::key_management::KeyPurpose;

/// Synthetic node id used by one RP test scenario
pub const PLACEHOLDER_RP_NODE_ID: &str = "NonExistentRPNode";

/// Real node whose signing key answers for [`PLACEHOLDER_RP_NODE_ID`]
pub const PLACEHOLDER_SUBSTITUTE_NODE_ID: &str = "rp1";

#[derive(Debug, Deserialize)]
struct DecryptRequest {
    node_id: Option<String>,
    encrypted_message: Option<String>,
    key_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignRequest {
    node_id: Option<String>,
    request_message: Option<String>,
    request_message_hash: Option<String>,
    hash_method: Option<String>,
    key_type: Option<String>,
    sign_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DecryptResponse {
    decrypted_message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignResponse {
    signature: String,
}

pub(crate) async fn decrypt(State(state): State<AppState>, body: Bytes) -> Response {
    respond("decrypt", handle_decrypt(&state, &body))
}

pub(crate) async fn sign(State(state): State<AppState>, body: Bytes) -> Response {
    respond(
        "sign",
        handle_sign(&state, &body, KeyPurpose::Signing, KmsEventKind::SignCallback),
    )
}

pub(crate) async fn master_sign(State(state): State<AppState>, body: Bytes) -> Response {
    respond(
        "master sign",
        handle_sign(
            &state,
            &body,
            KeyPurpose::SigningMaster,
            KmsEventKind::MasterSignCallback,
        ),
    )
}

/// Only the ordinary sign endpoint remaps the placeholder id.
pub fn resolve_sign_node_id(node_id: &str) -> &str {
    if node_id == PLACEHOLDER_RP_NODE_ID {
        PLACEHOLDER_SUBSTITUTE_NODE_ID
    } else {
        node_id
    }
}

fn handle_decrypt(state: &AppState, body: &[u8]) -> KmsResult<DecryptResponse> {
    let payload = parse_body(body)?;
    let event = KmsEvent::new(KmsEventKind::DecryptCallback, payload.clone());
    state.events.publish(&event);

    let request: DecryptRequest = serde_json::from_value(payload)
        .map_err(|e| KmsError::invalid_request("body", &e.to_string(), error_codes::MALFORMED_BODY))?;
    let node_id = required("node_id", &request.node_id)?;
    let ciphertext = decode_base64("encrypted_message", required("encrypted_message", &request.encrypted_message)?)?;

    log::debug!(
        "[{}] decrypt for node '{}' (key_type {:?})",
        event.request_id,
        node_id,
        request.key_type
    );

    let plaintext = state.kms.decrypt(node_id, &ciphertext)?;
    Ok(DecryptResponse {
        decrypted_message: base64::encode(plaintext),
    })
}

fn handle_sign(
    state: &AppState,
    body: &[u8],
    purpose: KeyPurpose,
    kind: KmsEventKind,
) -> KmsResult<SignResponse> {
    let payload = parse_body(body)?;
    let event = KmsEvent::new(kind, payload.clone());
    state.events.publish(&event);

    let request: SignRequest = serde_json::from_value(payload)
        .map_err(|e| KmsError::invalid_request("body", &e.to_string(), error_codes::MALFORMED_BODY))?;
    let requested_node_id = required("node_id", &request.node_id)?;
    let message = decode_base64("request_message", required("request_message", &request.request_message)?)?;

    let node_id = match purpose {
        KeyPurpose::Signing => resolve_sign_node_id(requested_node_id),
        _ => requested_node_id,
    };
    if node_id != requested_node_id {
        log::debug!(
            "[{}] substituting node '{}' for '{}'",
            event.request_id,
            node_id,
            requested_node_id
        );
    }

    log::debug!(
        "[{}] {} for node '{}' (sign_method {:?}, hash_method {:?}, key_type {:?}, hash {:?})",
        event.request_id,
        kind,
        node_id,
        request.sign_method,
        request.hash_method,
        request.key_type,
        request.request_message_hash
    );

    let signature = state.kms.sign(node_id, purpose, &message)?;
    Ok(SignResponse {
        signature: base64::encode(signature),
    })
}

fn parse_body(body: &[u8]) -> KmsResult<Value> {
    serde_json::from_slice(body)
        .map_err(|e| KmsError::invalid_request("body", &e.to_string(), error_codes::MALFORMED_BODY))
}

fn required<'a>(field: &str, value: &'a Option<String>) -> KmsResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| KmsError::invalid_request(field, "field is required", error_codes::MISSING_FIELD))
}

fn decode_base64(field: &str, value: &str) -> KmsResult<Vec<u8>> {
    base64::decode(value)
        .map_err(|e| KmsError::invalid_request(field, &e.to_string(), error_codes::INVALID_BASE64))
}

fn respond<T: Serialize>(operation: &str, result: KmsResult<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(error) => {
            log::error!(
                "KMS {} request failed: {} {:?}",
                operation,
                error,
                error.technical_details()
            );
            error.into_response()
        }
    }
}
