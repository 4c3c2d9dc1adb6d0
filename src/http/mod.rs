//! HTTP protocol implementation.
//!
//! This module implements the subset of HTTP/1.1 needed to serve static
//! files, byte ranges of media files and directory listings. Every
//! connection carries exactly one request and is closed afterwards.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection handler implementing the receive/respond state machine
//! - **`parser`**: Incremental, line-oriented request parser fed with raw socket input
//! - **`request`**: The parsed request: method, target, query parameters and byte range
//! - **`response`**: Response mode selection, header generation and the resumable body pump
//! - **`throttle`**: Chunk size and delay derived from the `rate` query parameter
//! - **`listing`**: Directory enumeration and HTML rendering
//! - **`writer`**: Serializes response heads and writes buffers to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Receiving  │ ← Feed socket input to the parser
//!        └──────┬──────┘
//!               │ Blank line seen
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Send headers, then pump the body chunk by chunk
//!        └──────┬───────────┘
//!               │ Body done, write failure or early peer close
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```
//!
//! # Query Parameters
//!
//! - `?rate=<kb/s>` throttles file transmission to roughly the given rate.
//! - `?live` marks an unbounded resource: range headers are ignored and no
//!   length headers are sent.
//!
//! # Example
//!
//! ```ignore
//! use mediaserve::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, ".".into());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
pub mod listing;
pub mod throttle;
