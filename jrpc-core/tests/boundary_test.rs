//! Id precision and size ceiling integration tests

use jrpc_core::{codec, Codec, Error, ErrorObject, Id, Limits, Request, Response};
use serde_json::json;

fn request_text(method: &str) -> String {
    json!({"jsonrpc": "2.0", "method": method, "id": 1}).to_string()
}

fn error_response_text(message: &str) -> String {
    json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": message}}).to_string()
}

#[test]
fn test_i32_max_id_written_as_integer() {
    let request = Request::with_id("ping", 2147483647).unwrap();
    let json = request.to_json().unwrap();
    assert!(json.contains(r#""id":2147483647,"#));

    let parsed = Request::parse(&json).unwrap();
    assert_eq!(parsed.id, Some(Id::Number(2147483647)));
}

#[test]
fn test_i64_max_id_roundtrips_through_double() {
    let request = Request::with_id("ping", i64::MAX).unwrap();
    let json = request.to_json().unwrap();
    assert!(!json.contains("9223372036854775807"));

    let parsed = Request::parse(&json).unwrap();
    assert_eq!(parsed.id, Some(Id::Number(i64::MAX)));
}

#[test]
fn test_wide_ids_lose_precision_past_2_pow_53() {
    let response = Response::success(json!(1), 9_007_199_254_740_993i64);
    let parsed = Response::parse(&response.to_json().unwrap()).unwrap();
    assert_eq!(parsed.id, Id::Number(9_007_199_254_740_992));
}

#[test]
fn test_fractional_id_rejected() {
    let result = codec::decode_request(r#"{"jsonrpc":"2.0","method":"a","id":1.5}"#);
    assert!(matches!(result, Err(Error::Validation(_))));

    let parsed = codec::decode_request(r#"{"jsonrpc":"2.0","method":"a","id":3.0}"#).unwrap();
    assert_eq!(parsed.id, Some(Id::Number(3)));
}

#[test]
fn test_method_length_ceiling() {
    let at_limit = "m".repeat(256);
    let over_limit = "m".repeat(257);

    let parsed = codec::decode_request(&request_text(&at_limit)).unwrap();
    assert_eq!(parsed.method.len(), 256);

    assert!(matches!(
        codec::decode_request(&request_text(&over_limit)),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        Request::new(over_limit),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_error_message_length_ceiling() {
    let parsed = codec::decode_response(&error_response_text(&"e".repeat(4096))).unwrap();
    assert_eq!(parsed.error.unwrap().message.len(), 4096);

    assert!(matches!(
        codec::decode_response(&error_response_text(&"e".repeat(4097))),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_error_message_ceiling_applies_on_write() {
    let at_limit = Response::failure(ErrorObject::new(-32000, "e".repeat(4096)).unwrap(), 1);
    let json = at_limit.to_json().unwrap();
    assert_eq!(Response::parse(&json).unwrap(), at_limit);

    let over_limit = Response::failure(ErrorObject::new(-32000, "e".repeat(4097)).unwrap(), 1);
    assert!(matches!(over_limit.to_json(), Err(Error::Validation(_))));

    let mut buf = [0u8; 8192];
    assert!(matches!(
        over_limit.serialize_into(&mut buf),
        Err(Error::Validation(_))
    ));

    let tight = Codec::new(Limits::default().with_max_error_message_len(16));
    let response = Response::failure(ErrorObject::new(-32000, "e".repeat(17)).unwrap(), 1);
    assert!(matches!(tight.encode(&response), Err(Error::Validation(_))));
}

#[test]
fn test_string_id_length_ceiling() {
    let at_limit = json!({"jsonrpc": "2.0", "id": "i".repeat(8192), "result": 1}).to_string();
    let over_limit = json!({"jsonrpc": "2.0", "id": "i".repeat(8193), "result": 1}).to_string();

    assert!(codec::decode_response(&at_limit).is_ok());
    assert!(matches!(
        codec::decode_response(&over_limit),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_custom_limits_override_defaults() {
    let codec = Codec::new(
        Limits::default()
            .with_max_method_len(512)
            .with_max_error_message_len(16),
    );

    assert!(codec.decode_request(&request_text(&"m".repeat(400))).is_ok());
    assert!(codec
        .decode_response(&error_response_text(&"e".repeat(17)))
        .is_err());
}

#[test]
fn test_capacity_failure_leaves_buffer_and_envelope_intact() {
    let response = Response::failure(
        ErrorObject::internal_error().with_data(json!({"trace": "abc"})),
        1,
    );

    let mut buf = [0u8; 16];
    match response.serialize_into(&mut buf) {
        Err(Error::Capacity {
            required,
            available,
        }) => {
            assert_eq!(required, response.to_json().unwrap().len());
            assert_eq!(available, 16);
        }
        other => panic!("Expected capacity error, got {:?}", other),
    }
    assert_eq!(buf, [0u8; 16]);
    assert_eq!(
        response.error.as_ref().and_then(|e| e.data.clone()),
        Some(json!({"trace": "abc"}))
    );
}

#[test]
fn test_failures_map_to_wire_errors() {
    let parse = codec::decode("{").unwrap_err().to_error_object();
    assert_eq!(parse.code, -32700);

    let invalid = codec::decode(r#"{"jsonrpc":"2.0"}"#)
        .unwrap_err()
        .to_error_object();
    assert_eq!(invalid.code, -32600);
}
