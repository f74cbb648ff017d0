//! Outcome recording subsystem.
//!
//! # Data Flow
//! ```text
//! Confirmed transaction
//!     → types.rs (DonationRecord / CertificateRecord rows)
//!     → Recorder (supabase.rs over PostgREST, or memory.rs)
//!     → failure becomes a response warning, never an error
//! ```
//!
//! # Design Decisions
//! - Tables are append-only; there is no update or delete path
//! - Credentials are passed per call so they can rotate without a restart

pub mod memory;
pub mod supabase;
pub mod types;

pub use memory::MemoryRecorder;
pub use supabase::SupabaseRecorder;
pub use types::{CertificateRecord, DatabaseCredentials, DonationRecord, RecordError, Recorder};
