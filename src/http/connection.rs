use anyhow::Context;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::parser::RequestParser;
use crate::http::request::{Method, Request};
use crate::http::response::Response;

/// Size of a single socket read while receiving the request.
const RECV_BUFFER_SIZE: usize = 512;

/// Handles a single accepted connection: receive one request, answer it,
/// close.
///
/// The stream is any byte transport; the server uses `TcpStream`.
pub struct Connection<S> {
    stream: S,
    root: PathBuf,
    parser: RequestParser,
    state: ConnectionState,
}

/// Position of a connection in its single request/response lifecycle.
pub enum ConnectionState {
    /// Reading until the request is complete
    Receiving,
    /// Sending the response to the parsed request
    Responding(Request),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, root: PathBuf) -> Self {
        Self {
            stream,
            root,
            parser: RequestParser::new(),
            state: ConnectionState::Receiving,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Drives the connection to completion. The stream is shut down on
    /// every exit path, including errors.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.state = ConnectionState::Closed;
        let _ = self.stream.shutdown().await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Receiving => match self.receive().await? {
                    Some(request) => ConnectionState::Responding(request),
                    None => ConnectionState::Closed,
                },

                ConnectionState::Responding(request) => {
                    self.respond(request).await?;
                    ConnectionState::Closed
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    /// Reads until the parser sees the end of the header block. Returns
    /// `None` when the peer closes the stream first.
    async fn receive(&mut self) -> anyhow::Result<Option<Request>> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        while !self.parser.is_complete() {
            let n = self
                .stream
                .read(&mut buf)
                .await
                .context("failed to receive request")?;

            if n == 0 {
                tracing::info!(
                    request_id = self.parser.request().id,
                    "Connection closed before request was complete"
                );
                return Ok(None);
            }

            self.parser.add(&buf[..n]);
        }

        let parser = std::mem::take(&mut self.parser);
        let trailing = parser.trailing_bytes().len();
        if trailing > 0 {
            tracing::warn!(
                request_id = parser.request().id,
                bytes = trailing,
                "Discarding data after request headers"
            );
        }

        let request = parser.into_request();
        tracing::debug!(
            request_id = request.id,
            method = ?request.method,
            target = %request.target,
            range = ?request.range,
            "Parsed request"
        );
        Ok(Some(request))
    }

    async fn respond(&mut self, request: Request) -> anyhow::Result<()> {
        let id = request.id;
        let head_only = request.method == Method::HEAD;

        let mut response = Response::new(request, &self.root).await;
        response.send_headers(&mut self.stream).await?;

        if head_only {
            return Ok(());
        }

        // The request is complete; anything the peer sends from now on is
        // read and dropped so it never reaches the parser.
        let (mut reader, mut writer) = tokio::io::split(&mut self.stream);
        let pump = async {
            while response.send_body(&mut writer).await? {}
            anyhow::Ok(())
        };

        tokio::select! {
            res = pump => res?,
            _ = discard_unexpected(&mut reader, id) => {}
        }

        Ok(())
    }
}

/// Logs and drops data arriving while the body is streaming. Never
/// completes; end of stream or a read error just stops the reading.
async fn discard_unexpected<R>(reader: &mut R, request_id: u64)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        tracing::warn!(
            request_id,
            bytes = n,
            "Discarding unexpected data received while sending body"
        );
    }
    std::future::pending::<()>().await
}
