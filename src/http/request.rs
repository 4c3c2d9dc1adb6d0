use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide request counter. Only uniqueness of ids matters.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(0);

/// HTTP request methods recognized by the server.
///
/// Anything other than the three supported verbs is parsed as `UNKNOWN`
/// and served like a `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Unrecognized or missing method token
    UNKNOWN,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// GET - Retrieve a resource
    GET,
    /// POST - Submit data (the body is ignored)
    POST,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive; any other token yields `UNKNOWN`.
    ///
    /// # Example
    ///
    /// ```
    /// # use mediaserve::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::GET);
    /// assert_eq!(Method::from_token("get"), Method::UNKNOWN);
    /// ```
    pub fn from_token(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            _ => Method::UNKNOWN,
        }
    }
}

/// A single byte range taken from a `Range: bytes=<start>-[<end>]` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset
    pub start: i64,
    /// End offset, `None` when the range runs to the end of the file
    pub end: Option<i64>,
}

/// Represents a request as reconstructed by the incremental parser.
///
/// Only the pieces the response engine consumes are retained: the method,
/// the normalized target, query parameters and at most one byte range.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// Target path with the leading `/`, trailing slashes and query removed
    pub target: String,
    /// Query parameters; bare keys map to an empty string
    pub query_params: HashMap<String, String>,
    /// Byte range from the first `Range` header line, if it parsed
    pub range: Option<ByteRange>,
    /// Set once the blank line ending the header block has been seen
    pub complete: bool,
    /// Diagnostic identifier, unique within the process
    pub id: u64,
}

impl Request {
    /// Creates an empty, incomplete request with a fresh id.
    pub fn new() -> Self {
        Self {
            method: Method::UNKNOWN,
            target: String::new(),
            query_params: HashMap::new(),
            range: None,
            complete: false,
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Retrieves a query parameter value by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(|v| v.as_str())
    }

    /// True when the `live` query parameter is present (value ignored).
    ///
    /// Live resources are treated as unbounded streams: range requests are
    /// not honored and no length headers are sent.
    pub fn is_live(&self) -> bool {
        self.query_params.contains_key("live")
    }

    /// True when a valid `Range` header was received.
    pub fn is_range_request(&self) -> bool {
        self.range.is_some()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
