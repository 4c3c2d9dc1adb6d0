use mediaserve::http::parser::{
    RequestParser, extract_method, extract_query_params, extract_target, parse_range,
};
use mediaserve::http::request::{ByteRange, Method, Request};
use std::collections::HashMap;

fn parse(bytes: &[u8]) -> Request {
    let mut parser = RequestParser::new();
    parser.add(bytes);
    parser.into_request()
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_parse_get_with_query() {
    let req = parse(b"GET /a/b?x=1&y HTTP/1.1\r\n\r\n");

    assert!(req.complete);
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.target, "a/b");
    assert_eq!(req.query_params, params(&[("x", "1"), ("y", "")]));
    assert_eq!(req.range, None);
}

#[test]
fn test_extract_methods() {
    assert_eq!(extract_method("GET / HTTP1.1"), Method::GET);
    assert_eq!(extract_method("HEAD / HTTP1.1"), Method::HEAD);
    assert_eq!(extract_method("POST / HTTP1.1"), Method::POST);
    assert_eq!(extract_method("Error / HTTP1.1"), Method::UNKNOWN);
    assert_eq!(extract_method("get / HTTP1.1"), Method::UNKNOWN);
    assert_eq!(extract_method(""), Method::UNKNOWN);
}

#[test]
fn test_target_normalization() {
    assert_eq!(extract_target("GET / HTTP1.1"), "");
    assert_eq!(extract_target("GET // HTTP1.1"), "");
    assert_eq!(extract_target("GET /// HTTP1.1"), "");
    assert_eq!(extract_target("GET /dir/file.txt HTTP1.1"), "dir/file.txt");
    assert_eq!(extract_target("GET /dir/file.txt/ HTTP1.1"), "dir/file.txt");
    assert_eq!(extract_target("GET /dir/file.txt?params HTTP1.1"), "dir/file.txt");
    assert_eq!(extract_target("GET /?params HTTP1.1"), "");
    assert_eq!(extract_target("GET //?params HTTP1.1"), "");
}

#[test]
fn test_target_never_absolute() {
    assert_eq!(extract_target("GET //etc/passwd HTTP/1.1"), "etc/passwd");
}

#[test]
fn test_target_keeps_dot_dot() {
    // Traversal is rejected when the response is classified, not here.
    assert_eq!(extract_target("GET /../secret HTTP/1.1"), "../secret");
}

#[test]
fn test_query_params() {
    assert!(extract_query_params("GET / HTTP1.1").is_empty());
    assert!(extract_query_params("GET /dir/file.txt? HTTP1.1").is_empty());
    assert!(extract_query_params("GET /? HTTP1.1").is_empty());
    assert_eq!(
        extract_query_params("GET /dir/file.txt?params HTTP1.1"),
        params(&[("params", "")])
    );
    assert_eq!(
        extract_query_params("GET /dir/file.txt?param1&param2&param3 HTTP1.1"),
        params(&[("param1", ""), ("param2", ""), ("param3", "")])
    );
    assert_eq!(
        extract_query_params("GET /dir/file.txt?param1=val1&param2=val2&param3=val3 HTTP1.1"),
        params(&[("param1", "val1"), ("param2", "val2"), ("param3", "val3")])
    );
    assert_eq!(
        extract_query_params("GET //?params HTTP1.1"),
        params(&[("params", "")])
    );
}

#[test]
fn test_query_params_last_duplicate_wins() {
    assert_eq!(
        extract_query_params("GET /f?rate=10&rate=20 HTTP/1.1"),
        params(&[("rate", "20")])
    );
}

#[test]
fn test_query_value_split_on_first_equals() {
    assert_eq!(
        extract_query_params("GET /f?expr=a=b HTTP/1.1"),
        params(&[("expr", "a=b")])
    );
}

#[test]
fn test_parse_range_values() {
    assert_eq!(
        parse_range("Range: bytes=0-1024"),
        Some(ByteRange { start: 0, end: Some(1024) })
    );
    assert_eq!(
        parse_range("Range: bytes=0-"),
        Some(ByteRange { start: 0, end: None })
    );
    assert_eq!(
        parse_range("Range: bytes=1024-"),
        Some(ByteRange { start: 1024, end: None })
    );
    assert_eq!(
        parse_range("Range: bytes=232128512-"),
        Some(ByteRange { start: 232128512, end: None })
    );
}

#[test]
fn test_parse_range_rejects_malformed() {
    assert_eq!(parse_range("Range: time=0-1024"), None);
    assert_eq!(parse_range("Range: Bytes=0-1024"), None);
    assert_eq!(parse_range("Range: bytes=1024"), None);
    assert_eq!(parse_range("Range:bytes=0-1"), None);
    assert_eq!(parse_range("Range bytes"), None);
}

#[test]
fn test_range_header_recorded() {
    let req = parse(b"GET /movie.webm HTTP/1.1\r\nHost: x\r\nRange: bytes=100-199\r\n\r\n");

    assert!(req.is_range_request());
    assert_eq!(req.range, Some(ByteRange { start: 100, end: Some(199) }));
}

#[test]
fn test_only_first_range_line_counts() {
    let req = parse(
        b"GET /f HTTP/1.1\r\nRange: bytes=1-2\r\nRange: bytes=3-4\r\n\r\n",
    );
    assert_eq!(req.range, Some(ByteRange { start: 1, end: Some(2) }));

    let req = parse(
        b"GET /f HTTP/1.1\r\nRange: time=1-2\r\nRange: bytes=3-4\r\n\r\n",
    );
    assert_eq!(req.range, None);
}

#[test]
fn test_malformed_range_is_ignored() {
    let req = parse(b"GET /f HTTP/1.1\r\nRange: time=0-1024\r\n\r\n");

    assert!(req.complete);
    assert!(!req.is_range_request());
}

#[test]
fn test_other_headers_ignored() {
    let req = parse(b"GET /f HTTP/1.1\r\nX-Range: bytes=0-1\r\nHost: a\r\n\r\n");

    assert_eq!(req.range, None);
    assert_eq!(req.target, "f");
}

#[test]
fn test_live_flag() {
    assert!(parse(b"GET /cam.ogv?live HTTP/1.1\r\n\r\n").is_live());
    assert!(parse(b"GET /cam.ogv?live=0 HTTP/1.1\r\n\r\n").is_live());
    assert!(!parse(b"GET /cam.ogv?rate=5 HTTP/1.1\r\n\r\n").is_live());
}

#[test]
fn test_incomplete_until_blank_line() {
    let mut parser = RequestParser::new();
    parser.add(b"GET /dir HTTP/1.1\r\nHost: example.com\r\n");
    assert!(!parser.is_complete());
    assert_eq!(parser.request().target, "dir");

    parser.add(b"\r");
    assert!(!parser.is_complete());

    parser.add(b"\n");
    assert!(parser.is_complete());
}

#[test]
fn test_split_chunks_match_single_add() {
    let raw: &[u8] =
        b"GET /media/clip.webm?rate=64&live HTTP/1.1\r\nHost: localhost\r\nRange: bytes=10-\r\n\r\n";
    let whole = parse(raw);

    for size in 1..=raw.len() {
        let mut parser = RequestParser::new();
        for chunk in raw.chunks(size) {
            assert!(!parser.is_complete());
            parser.add(chunk);
        }
        let split = parser.into_request();

        assert!(split.complete, "chunk size {size}");
        assert_eq!(split.method, whole.method);
        assert_eq!(split.target, whole.target);
        assert_eq!(split.query_params, whole.query_params);
        assert_eq!(split.range, whole.range);
    }
}

#[test]
fn test_request_ids_are_unique() {
    let a = RequestParser::new().into_request();
    let b = RequestParser::new().into_request();
    let c = Request::new();

    assert_ne!(a.id, b.id);
    assert_ne!(b.id, c.id);
    assert_ne!(a.id, c.id);
}
