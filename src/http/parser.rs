use bytes::BytesMut;
use std::collections::HashMap;

use crate::http::request::{ByteRange, Method, Request};

const LINE_BREAK: &[u8] = b"\r\n";

/// Incremental, line-oriented request parser.
///
/// Raw socket input is fed through [`RequestParser::add`] in arbitrary
/// chunks. Every complete CRLF-terminated line is interpreted as soon as it
/// is available; a trailing partial line is kept until the next call. The
/// request is complete once an empty line is seen.
#[derive(Debug)]
pub struct RequestParser {
    buffer: BytesMut,
    cursor: usize,
    saw_range_line: bool,
    request: Request,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(1024),
            cursor: 0,
            saw_range_line: false,
            request: Request::new(),
        }
    }

    /// Appends a chunk of input and parses every complete line in it.
    ///
    /// # Panics
    ///
    /// Panics if the request is already complete.
    pub fn add(&mut self, bytes: &[u8]) {
        assert!(
            !self.request.complete,
            "request {} already complete",
            self.request.id
        );
        self.buffer.extend_from_slice(bytes);

        while let Some(end) = find_line_break(&self.buffer[self.cursor..]) {
            let end = self.cursor + end;
            let line = String::from_utf8_lossy(&self.buffer[self.cursor..end]).into_owned();
            let first_line = self.cursor == 0;
            self.cursor = end + LINE_BREAK.len();

            if first_line {
                self.parse_request_line(&line);
            } else if line.starts_with("Range") {
                self.parse_range_line(&line);
            }

            if line.is_empty() {
                self.request.complete = true;
                break;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.request.complete
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Bytes received after the blank line that ended the header block.
    pub fn trailing_bytes(&self) -> &[u8] {
        if self.request.complete {
            &self.buffer[self.cursor..]
        } else {
            &[]
        }
    }

    /// Consumes the parser, handing the request over to its sole reader.
    pub fn into_request(self) -> Request {
        self.request
    }

    fn parse_request_line(&mut self, line: &str) {
        self.request.method = extract_method(line);
        self.request.target = extract_target(line);
        self.request.query_params = extract_query_params(line);
    }

    fn parse_range_line(&mut self, line: &str) {
        // Only the first Range line is considered, whether or not it parses.
        if self.saw_range_line {
            return;
        }
        self.saw_range_line = true;
        self.request.range = parse_range(line);
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_line_break(buf: &[u8]) -> Option<usize> {
    buf.windows(LINE_BREAK.len()).position(|w| w == LINE_BREAK)
}

/// Extracts the method token preceding the first space of a request line.
pub fn extract_method(line: &str) -> Method {
    let token = line.split(' ').next().unwrap_or("");
    Method::from_token(token)
}

/// Extracts the normalized target from a request line.
///
/// The target starts after the first `/` and stops at the next `?` or
/// space. Leading and trailing slashes are removed, so `/`, `//` and `///`
/// all yield an empty target and `//etc` never becomes an absolute path.
pub fn extract_target(line: &str) -> String {
    let Some(slash) = line.find('/') else {
        return String::new();
    };
    let rest = &line[slash + 1..];
    let end = rest.find(['?', ' ']).unwrap_or(rest.len());
    rest[..end].trim_matches('/').to_string()
}

/// Extracts query parameters from a request line.
///
/// `?a=1&b&c=3` yields `{a: "1", b: "", c: "3"}`. Later duplicates win.
pub fn extract_query_params(line: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    let uri = match line.find('/') {
        Some(slash) => line[slash..].split(' ').next().unwrap_or(""),
        None => return params,
    };
    let Some((_, query)) = uri.split_once('?') else {
        return params;
    };

    for token in query.split('&').filter(|t| !t.is_empty()) {
        let (key, value) = token.split_once('=').unwrap_or((token, ""));
        params.insert(key.to_string(), value.to_string());
    }

    params
}

/// Parses a `Range: bytes=<start>-[<end>]` header line.
///
/// Returns `None` unless the unit between the first space and the first `=`
/// is exactly `bytes` and the spec after `=` contains a `-`. Offsets are read
/// leniently: non-numeric text counts as zero.
pub fn parse_range(line: &str) -> Option<ByteRange> {
    let sp = line.find(' ')?;
    let eq = line.find('=')?;
    if line.get(sp + 1..eq)? != "bytes" {
        return None;
    }

    let (start, end) = line[eq + 1..].split_once('-')?;
    let end = if end.is_empty() {
        None
    } else {
        Some(parse_leading_i64(end))
    };

    Some(ByteRange {
        start: parse_leading_i64(start),
        end,
    })
}

/// Reads an optionally signed decimal prefix, ignoring leading whitespace
/// and anything after the digits. Yields 0 when no digits are present.
fn parse_leading_i64(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if negative { -value } else { value }
}
