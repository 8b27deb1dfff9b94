/*!
Development and test tooling for rankcast.

Lets component tests exercise the command path without a live broker:
- [`mqtt_stub::MockMqttClient`] records publishes/subscriptions and can
  simulate inbound messages
- [`builders`] assembles the JSON payloads the operator console sends
*/

pub mod builders;
pub mod mqtt_stub;

pub use builders::PayloadBuilder;
pub use mqtt_stub::{MockMessage, MockMqttClient};
