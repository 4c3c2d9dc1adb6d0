use anyhow::Context;
use bytes::{Bytes, BytesMut};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite};

use crate::http::listing;
use crate::http::mime;
use crate::http::request::Request;
use crate::http::throttle::Throttle;
use crate::http::writer::{ResponseWriter, serialize_head};

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = concat!("mediaserve/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes produced by the server.
///
/// Reason phrases are non-standard: `206` is sent as `OK` and `404` as
/// `File Not Found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 206 OK
    PartialContent,
    /// 404 File Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use mediaserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::PartialContent.as_u16(), 206);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::PartialContent => 206,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::PartialContent => "OK",
            StatusCode::NotFound => "File Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// How a request is answered, decided once when the response is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Stream a whole file
    EntireFile,
    /// Stream `start..end` of a file
    FileRange { start: i64, end: i64 },
    /// Render an HTML listing of a directory
    DirectoryList,
    /// Missing resource or rejected path; empty body
    NotFound,
    /// Filesystem failure other than not-found; empty body
    InternalError,
}

impl ResponseMode {
    pub fn status(&self) -> StatusCode {
        match self {
            ResponseMode::EntireFile | ResponseMode::DirectoryList => StatusCode::Ok,
            ResponseMode::FileRange { .. } => StatusCode::PartialContent,
            ResponseMode::NotFound => StatusCode::NotFound,
            ResponseMode::InternalError => StatusCode::InternalServerError,
        }
    }

    fn streams_file(&self) -> bool {
        matches!(self, ResponseMode::EntireFile | ResponseMode::FileRange { .. })
    }
}

/// The response to one completed request.
///
/// Owns the request it answers. Headers are produced by [`Response::head`]
/// and the body is pulled lazily, one bounded chunk at a time, through
/// [`Response::next_chunk`] or [`Response::send_body`]. The body can only
/// be produced once; a fresh `Response` is needed to start over.
#[derive(Debug)]
pub struct Response {
    request: Request,
    mode: ResponseMode,
    path: PathBuf,
    file_length: i64,
    throttle: Throttle,
    file: Option<File>,
    offset: i64,
    remaining: i64,
    finished: bool,
}

impl Response {
    /// Classifies `request` against the filesystem below `root`.
    pub async fn new(request: Request, root: &Path) -> Self {
        let throttle = Throttle::from_rate(request.param("rate"));
        let target = request.target.as_str();
        let mut file_length = 0;

        let (mode, path) = if target.is_empty() {
            (ResponseMode::DirectoryList, root.to_path_buf())
        } else if target.contains("..") {
            (ResponseMode::NotFound, PathBuf::new())
        } else {
            let path = root.join(target);
            let mode = match tokio::fs::metadata(&path).await {
                Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                    ResponseMode::NotFound
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = request.id,
                        path = %path.display(),
                        error = %e,
                        "Failed to stat target"
                    );
                    ResponseMode::InternalError
                }
                Ok(meta) if meta.is_dir() => ResponseMode::DirectoryList,
                Ok(meta) => {
                    file_length = i64::try_from(meta.len()).unwrap_or(i64::MAX);
                    match request.range {
                        Some(range) if meta.is_file() && !request.is_live() => {
                            ResponseMode::FileRange {
                                start: range.start,
                                end: range.end.unwrap_or(file_length),
                            }
                        }
                        _ => ResponseMode::EntireFile,
                    }
                }
            };
            (mode, path)
        };

        tracing::debug!(
            request_id = request.id,
            mode = ?mode,
            path = %path.display(),
            "Classified request"
        );

        Self {
            request,
            mode,
            path,
            file_length,
            throttle,
            file: None,
            offset: 0,
            remaining: 0,
            finished: false,
        }
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn status(&self) -> StatusCode {
        self.mode.status()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    /// Size of the file being served, zero for other modes.
    pub fn file_length(&self) -> i64 {
        self.file_length
    }

    /// Current file offset while streaming a range.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Bytes of the range still to be sent.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn content_type(&self) -> &'static str {
        match self.mode {
            ResponseMode::NotFound | ResponseMode::InternalError => mime::ERROR_CONTENT_TYPE,
            ResponseMode::DirectoryList => mime::LISTING_CONTENT_TYPE,
            ResponseMode::EntireFile | ResponseMode::FileRange { .. } => {
                mime::content_type_for(&self.request.target)
            }
        }
    }

    /// Builds the serialized status line and header block.
    pub fn head(&self) -> Vec<u8> {
        let mut headers: Vec<(&str, String)> = vec![
            ("Connection", "close".to_string()),
            ("Date", httpdate::fmt_http_date(SystemTime::now())),
            ("Server", SERVER_NAME.to_string()),
        ];

        if !self.request.is_live() {
            match self.mode {
                ResponseMode::EntireFile => {
                    headers.push(("Accept-Ranges", "bytes".to_string()));
                    headers.push(("Content-Length", self.file_length.to_string()));
                }
                ResponseMode::FileRange { start, end } => {
                    headers.push(("Accept-Ranges", "bytes".to_string()));
                    headers.push(("Content-Length", range_length(start, end).to_string()));
                    headers.push((
                        "Content-Range",
                        format!("bytes {}-{}/{}", start, end, self.file_length),
                    ));
                }
                _ => {}
            }
        }

        headers.push(("Content-Type", self.content_type().to_string()));

        serialize_head(self.status(), &headers)
    }

    /// Writes the header block. A failure here ends the connection.
    pub async fn send_headers<W>(&self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let head = self.head();
        ResponseWriter::new(head)
            .write_to_stream(stream)
            .await
            .context("failed to send response headers")?;

        tracing::debug!(
            request_id = self.request.id,
            status = self.status().as_u16(),
            "Sent headers"
        );
        Ok(())
    }

    /// Produces the next body chunk, or `None` once the body is exhausted.
    ///
    /// File handles are opened on the first call and closed as soon as the
    /// end of the file or range is reached.
    pub async fn next_chunk(&mut self) -> anyhow::Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }

        let chunk = match self.mode {
            ResponseMode::EntireFile => self.next_file_chunk().await?,
            ResponseMode::FileRange { start, end } => self.next_range_chunk(start, end).await?,
            ResponseMode::DirectoryList => {
                self.finished = true;
                Some(self.render_listing().await?)
            }
            ResponseMode::NotFound | ResponseMode::InternalError => None,
        };

        if chunk.is_none() {
            self.finished = true;
            self.file = None;
        }
        Ok(chunk)
    }

    /// Sends one chunk of the body. Returns `true` while more calls are
    /// needed.
    ///
    /// When throttled, each file chunk is followed by the throttle delay.
    pub async fn send_body<W>(&mut self, stream: &mut W) -> anyhow::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(chunk) = self.next_chunk().await? else {
            tracing::debug!(request_id = self.request.id, "Body complete");
            return Ok(false);
        };

        ResponseWriter::new(chunk)
            .write_to_stream(stream)
            .await
            .context("failed to send response body")?;

        if self.mode.streams_file() && self.throttle.is_throttled() {
            tokio::time::sleep(self.throttle.delay).await;
        }

        Ok(!self.finished)
    }

    async fn open(&mut self) -> anyhow::Result<&mut File> {
        if self.file.is_none() {
            let file = File::open(&self.path)
                .await
                .with_context(|| format!("failed to open {}", self.path.display()))?;
            self.file = Some(file);
        }
        // Just opened above when missing.
        self.file
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("file handle unavailable"))
    }

    async fn next_file_chunk(&mut self) -> anyhow::Result<Option<Bytes>> {
        let len = self.throttle.chunk_size;
        let file = self.open().await?;
        read_chunk(file, len).await
    }

    async fn next_range_chunk(&mut self, start: i64, end: i64) -> anyhow::Result<Option<Bytes>> {
        if self.file.is_none() {
            let file = self.open().await?;
            file.seek(SeekFrom::Start(u64::try_from(start).unwrap_or(0)))
                .await
                .context("failed to seek to range start")?;
            self.offset = start.max(0);
            self.remaining = range_length(start, end);
        }

        if self.remaining == 0 {
            return Ok(None);
        }

        let len = self.throttle.chunk_size.min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let expected = self.offset;
        let file = self.open().await?;
        let Some(chunk) = read_chunk(file, len).await? else {
            return Ok(None);
        };
        let read = chunk.len() as i64;
        if cfg!(debug_assertions) {
            let position = file.stream_position().await?;
            assert_eq!(position as i64, expected + read, "file position diverged from range offset");
        }

        self.remaining -= read;
        self.offset += read;

        Ok(Some(chunk))
    }

    async fn render_listing(&self) -> anyhow::Result<Bytes> {
        let entries = listing::read_entries(&self.path)
            .await
            .with_context(|| format!("failed to list {}", self.path.display()))?;
        let html = listing::render(&self.request.target, &entries, self.request.param("rate"));
        Ok(Bytes::from(html))
    }
}

/// Number of bytes a `start..end` range covers. Inverted ranges are empty.
pub fn range_length(start: i64, end: i64) -> i64 {
    end.saturating_sub(start).max(0)
}

async fn read_chunk(file: &mut File, len: usize) -> anyhow::Result<Option<Bytes>> {
    let mut buf = BytesMut::zeroed(len);
    let n = file.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(buf.freeze()))
}
