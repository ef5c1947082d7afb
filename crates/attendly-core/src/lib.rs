// attendly-core: session layer between attendly-api and consumers.
//
// Connection management, live-event synchronization over polling,
// registry operations with async-enrollment reconciliation, and mode
// control. All peripheral state is observable through tokio watch
// channels.

pub mod classify;
pub mod config;
pub mod error;
pub mod mode;
pub mod notify;
pub mod registry;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{Transport, classify};
pub use config::SessionConfig;
pub use error::CoreError;
pub use session::{ConnectionState, Session};

// Re-export wire types at the crate root for ergonomics.
pub use attendly_api::{
    DeviceStatus, FingerprintSlot, ScanEvent, ScanStatus, SlotStatus, TunnelDescriptor,
};
