use super::*;

#[test]
fn ok_response_preserves_hit_order() {
    let raw = r#"{
        "status": "ok",
        "implementations": [
            { "line": 5, "column": 3, "filename": "/src/b.cr" },
            { "line": 1, "column": 9, "filename": "/src/a.cr" }
        ]
    }"#;

    let response = parse_response(raw).expect("valid ok response");
    let ToolResponse::Ok { implementations } = response else {
        panic!("expected ok response");
    };
    assert_eq!(implementations.len(), 2);
    assert_eq!(implementations[0].filename, "/src/b.cr");
    assert_eq!(implementations[0].line, 5);
    assert_eq!(implementations[0].column, 3);
    assert_eq!(implementations[1].filename, "/src/a.cr");
}

#[test]
fn blocked_response_parses() {
    let response = parse_response(r#"{"status":"blocked"}"#).expect("valid blocked response");
    assert!(matches!(response, ToolResponse::Blocked));
}

#[test]
fn plain_text_is_an_error() {
    assert!(parse_response("not json").is_err());
}

#[test]
fn unknown_status_is_an_error() {
    assert!(parse_response(r#"{"status":"exploded"}"#).is_err());
}

#[test]
fn ok_without_implementations_field_is_an_error() {
    assert!(parse_response(r#"{"status":"ok"}"#).is_err());
}

#[test]
fn mistyped_hit_field_is_an_error() {
    let raw = r#"{"status":"ok","implementations":[{"line":"five","column":3,"filename":"/a.cr"}]}"#;
    assert!(parse_response(raw).is_err());
}

#[test]
fn missing_hit_field_is_an_error() {
    let raw = r#"{"status":"ok","implementations":[{"line":5,"column":3}]}"#;
    assert!(parse_response(raw).is_err());
}
