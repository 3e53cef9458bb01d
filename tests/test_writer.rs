use coinvault::http::response::{Response, ResponseBuilder, StatusCode};
use coinvault::http::writer::{ResponseWriter, serialize_response};

#[test]
fn test_serialize_status_line_headers_and_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "application/json")
        .body(b"[]".to_vec())
        .build();

    let raw = serialize_response(&response);
    assert_eq!(
        raw,
        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n[]".to_vec()
    );
}

#[test]
fn test_serialize_injects_missing_content_length() {
    let response = Response {
        status: StatusCode::Ok,
        reason: "OK".to_string(),
        headers: vec![],
        body: b"hello".to_vec(),
    };

    let raw = String::from_utf8(serialize_response(&response)).unwrap();
    assert_eq!(raw, "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
}

#[test]
fn test_serialize_no_content_has_no_body() {
    let raw = serialize_response(&Response::no_content());

    assert_eq!(
        raw,
        b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n".to_vec()
    );
}

#[test]
fn test_serialize_uses_custom_reason() {
    let response = ResponseBuilder::new(StatusCode::NotFound)
        .reason("Gone Fishing")
        .build();

    let raw = String::from_utf8(serialize_response(&response)).unwrap();
    assert!(raw.starts_with("HTTP/1.1 404 Gone Fishing\r\n"));
}

#[test]
fn test_serialize_drops_duplicate_content_length() {
    let response = Response {
        status: StatusCode::Ok,
        reason: "OK".to_string(),
        headers: vec![
            ("Content-Length".to_string(), "1".to_string()),
            ("content-length".to_string(), "2".to_string()),
        ],
        body: b"abc".to_vec(),
    };

    let raw = String::from_utf8(serialize_response(&response)).unwrap();
    assert_eq!(raw.matches("ontent-").count(), 1);
    assert!(raw.contains("Content-Length: 3\r\n"));
}

#[tokio::test]
async fn test_writer_writes_all_bytes() {
    let response = Response::ok(vec![b'x'; 10_000]);
    let mut writer = ResponseWriter::new(&response);
    let expected = writer.bytes().to_vec();

    let mut out: Vec<u8> = Vec::new();
    writer.write_to_stream(&mut out).await.unwrap();

    assert_eq!(out, expected);
    assert!(out.ends_with(&[b'x'; 10]));
}
