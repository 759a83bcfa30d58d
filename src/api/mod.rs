//! The remote feed store: gateway trait, HTTP client and error normalization.

pub mod api_types;
pub mod client;
pub mod error;
pub mod gateway;

pub use client::HttpGateway;
pub use gateway::FeedGateway;
