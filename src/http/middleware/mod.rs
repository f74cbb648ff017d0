//! Response middleware.

pub mod cors;
pub mod envelope;

pub use cors::{cors_middleware, CorsHeaders};
pub use envelope::error_envelope;
