//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace span, limits)
//!     → middleware/cors.rs (CORS headers on every response)
//!     → handlers.rs (content type check, dispatch to functions)
//!     → response.rs (receipt or `{ error, txId? }` envelope)
//! ```

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer};
