//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → [routing rewrite rules decide adapter vs origin]
//!     → adapter (bots) or origin.rs (everyone else)
//!     → Send to client
//! ```

pub mod origin;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{app, app_with_client, HttpServer, ServerError};
