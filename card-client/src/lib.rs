//! Card Client - HTTP transport for the card engine
//!
//! Implements [`card_engine::CardTransport`] against a remote commit backend.

pub mod config;
pub mod connection;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use connection::{ConnectionState, ConnectionTracker};
pub use error::{ClientError, ClientResult};
pub use http::HttpCardTransport;
