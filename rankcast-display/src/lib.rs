//! Display-side agent logic.
//!
//! The binary in `main.rs` wires these modules to the MQTT link; everything
//! here is plain state so the command path is testable without a broker.

pub mod heartbeat;
pub mod router;
pub mod state;
pub mod surface;
