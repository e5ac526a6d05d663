//! Message kind detection integration tests

use jrpc_core::{codec, Codec, Error, Message, MessageKind};
use serde_json::json;

#[test]
fn test_peek_single_request() {
    let kind = codec::peek_kind(r#"{"jsonrpc":"2.0","method":"x"}"#).unwrap();
    assert_eq!(kind, MessageKind::RequestSingle);
}

#[test]
fn test_peek_single_response() {
    let kind = codec::peek_kind(r#"{"jsonrpc":"2.0","id":1,"result":5}"#).unwrap();
    assert_eq!(kind, MessageKind::ResponseSingle);

    let kind = codec::peek_kind(
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
    )
    .unwrap();
    assert_eq!(kind, MessageKind::ResponseSingle);
}

#[test]
fn test_peek_request_batch() {
    let kind = codec::peek_kind(
        r#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","method":"b"}]"#,
    )
    .unwrap();
    assert_eq!(kind, MessageKind::RequestBatch);
}

#[test]
fn test_peek_rejects_empty_array() {
    assert!(matches!(codec::peek_kind("[]"), Err(Error::Validation(_))));
}

#[test]
fn test_peek_rejects_method_with_result() {
    let result = codec::peek_kind(r#"{"jsonrpc":"2.0","method":"a","result":1,"id":1}"#);
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn test_peek_rejects_scalars() {
    for text in ["42", "\"text\"", "null", "true"] {
        assert!(
            matches!(codec::peek_kind(text), Err(Error::Validation(_))),
            "expected validation failure for {}",
            text
        );
    }
}

#[test]
fn test_decode_dispatches_by_kind() {
    let request = codec::decode(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":9}"#).unwrap();
    assert_eq!(request.kind(), MessageKind::RequestSingle);
    assert_eq!(request.as_request().unwrap().params, Some(json!([1, 2])));

    let response = codec::decode(r#"{"jsonrpc":"2.0","id":9,"result":3}"#).unwrap();
    assert_eq!(response.as_response().unwrap().result, Some(json!(3)));

    let batch = codec::decode(r#"[{"jsonrpc":"2.0","id":1,"result":1}]"#).unwrap();
    match batch {
        Message::ResponseBatch(items) => assert_eq!(items.len(), 1),
        other => panic!("Expected response batch, got {:?}", other.kind()),
    }
}

#[test]
fn test_decode_empty_array_fails() {
    assert!(matches!(codec::decode("[]"), Err(Error::Validation(_))));
}

#[test]
fn test_decode_mixed_batch_fails() {
    let text = r#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","id":1,"result":1}]"#;
    assert!(matches!(codec::decode(text), Err(Error::Validation(_))));
}

#[test]
fn test_ambiguous_element_rejected_at_any_position() {
    let requests = r#"[{"jsonrpc":"2.0","method":"a"},{"jsonrpc":"2.0","method":"b","result":1}]"#;
    assert!(matches!(codec::decode(requests), Err(Error::Validation(_))));
    assert!(matches!(
        codec::decode_request_batch(requests),
        Err(Error::Validation(_))
    ));

    let responses = r#"[{"jsonrpc":"2.0","id":1,"result":1},{"jsonrpc":"2.0","id":2,"result":2,"method":"b"}]"#;
    assert!(matches!(codec::decode(responses), Err(Error::Validation(_))));
    assert!(matches!(
        codec::decode_response_batch(responses),
        Err(Error::Validation(_))
    ));

    assert!(matches!(
        codec::decode_request(r#"{"jsonrpc":"2.0","method":"a","error":{"code":1,"message":"m"}}"#),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_message_roundtrip_preserves_kind() {
    let texts = [
        r#"{"jsonrpc":"2.0","id":1,"method":"a"}"#,
        r#"[{"jsonrpc":"2.0","method":"a"}]"#,
        r#"{"jsonrpc":"2.0","id":"x","result":null}"#,
        r#"[{"jsonrpc":"2.0","id":2,"error":{"code":-32000,"message":"busy"}}]"#,
    ];

    for text in texts {
        let message = Message::parse(text).unwrap();
        assert_eq!(message.to_json().unwrap(), text);
    }
}

#[test]
fn test_decode_value_skips_text_parsing() {
    let codec = Codec::default();
    let message = codec
        .decode_value(json!([{"jsonrpc": "2.0", "method": "a", "id": 1}]))
        .unwrap();
    assert_eq!(message.kind(), MessageKind::RequestBatch);
    assert_eq!(message.item_count(), 1);
}
