//! Rankcast control-plane protocol library.
//!
//! Everything both processes agree on lives here: topic naming, runtime
//! identity, payload shapes and tolerant decoding, duplicate suppression,
//! the pasted-data parser, liveness tracking, the console's per-monitor
//! state cache and the MQTT transport link.

pub mod config;
pub mod dedup;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod liveness;
pub mod monitors;
pub mod parser;
pub mod topics;
pub mod transport;

pub use error::ProtocolError;
pub use identity::RuntimeIdentity;
pub use topics::{TopicKind, TopicRegistry};
