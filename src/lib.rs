//! mediaserve - Static File and Media Streaming Server
//!
//! Core library for request parsing, response generation and connection handling.

pub mod config;
pub mod http;
pub mod server;
