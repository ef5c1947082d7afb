// attendly-api: raw HTTP clients for the attendance peripheral and the
// local tunnel agent. State machines and reconciliation live in
// attendly-core.

pub mod client;
pub mod error;
pub mod transport;
pub mod tunnel;
pub mod types;

pub use client::DeviceClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use tunnel::{DEFAULT_AGENT_URL, TunnelAgentClient};
pub use types::{
    DeviceStatus, FingerprintSlot, FingerprintsResponse, NotificationPoll, ScanEvent, ScanStatus,
    SlotStatus, TunnelDescriptor,
};
