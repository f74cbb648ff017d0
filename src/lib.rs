//! Donation gateway library.
//!
//! Two HTTP functions in front of an Algorand node and a hosted database:
//! `sendDonation` transfers funds to a charity account and `mintCertificate`
//! creates a one-of-one commemorative asset for the donor.

pub mod blockchain;
pub mod config;
pub mod functions;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod records;

pub use config::schema::GatewayConfig;
pub use functions::FunctionContext;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
