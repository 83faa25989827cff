//! Prerender gateway library.
//!
//! Serves prerendered HTML to known bots and forwards everyone else to a
//! client-rendered origin.

pub mod adapter;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod resilience;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
