use coinvault::coins::StoreError;
use coinvault::error::{ApiError, RoutingError, error_response};
use coinvault::http::parser::ProtocolError;
use coinvault::http::response::StatusCode;

fn body_json(err: &ApiError, expose: bool) -> (StatusCode, serde_json::Value) {
    let response = error_response(err, expose);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    (response.status, serde_json::from_slice(&response.body).unwrap())
}

#[test]
fn test_routing_error_uses_own_status() {
    let err = ApiError::from(RoutingError::no_route("/unknown"));
    let (status, json) = body_json(&err, true);

    assert_eq!(status, StatusCode::NotFound);
    assert_eq!(json["status"], 404);
    assert_eq!(json["error"], "No route found for path: /unknown");
}

#[test]
fn test_store_not_found_maps_to_404() {
    let err = ApiError::from(StoreError::NotFound(999));
    let (status, json) = body_json(&err, true);

    assert_eq!(status, StatusCode::NotFound);
    assert_eq!(json["error"], "Coin not found: 999");
}

#[test]
fn test_bad_json_maps_to_400() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
    let err = ApiError::from(parse_err);
    let (status, json) = body_json(&err, true);

    assert_eq!(status, StatusCode::BadRequest);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON payload"));
}

#[test]
fn test_protocol_error_maps_to_400() {
    let err = ApiError::from(ProtocolError::MissingTerminator);
    let (status, json) = body_json(&err, true);

    assert_eq!(status, StatusCode::BadRequest);
    assert_eq!(json["status"], 400);
}

#[test]
fn test_read_timeout_maps_to_408() {
    let err = ApiError::from(ProtocolError::Timeout);
    let (status, json) = body_json(&err, true);

    assert_eq!(status, StatusCode::RequestTimeout);
    assert_eq!(json["status"], 408);
}

#[test]
fn test_unexpected_error_with_details() {
    let err = ApiError::from(anyhow::anyhow!("database exploded"));
    let (status, json) = body_json(&err, true);

    assert_eq!(status, StatusCode::InternalServerError);
    assert_eq!(json["status"], 500);
    assert!(json["error"].as_str().unwrap().contains("database exploded"));
}

#[test]
fn test_unexpected_error_without_details() {
    let err = ApiError::from(anyhow::anyhow!("database exploded"));
    let (status, json) = body_json(&err, false);

    assert_eq!(status, StatusCode::InternalServerError);
    assert_eq!(json["error"], "Internal Server Error");
}

#[test]
fn test_client_errors_are_not_redacted() {
    let err = ApiError::NotFound("Coin not found: 5".to_string());
    let (_, json) = body_json(&err, false);

    assert_eq!(json["error"], "Coin not found: 5");
}
