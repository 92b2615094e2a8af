//! MQTT integration
//!
//! Carries the panel's two network concerns over one broker connection:
//!
//! - **Relay input**: while the subscribed-topic source is selected, incoming
//!   joy payloads on the configured topic are decoded and handed to the panel.
//! - **Publish mode**: synthesized messages handed to the transport are
//!   re-published on the configured topic.
//!
//! ```text
//! mqtt/
//! ├── config.rs     - Broker endpoint and credentials
//! └── transport.rs  - Connection task, subscription sync, publish loop
//! ```

pub mod config;
pub mod transport;

pub use config::MqttServer;
pub use transport::{MqttError, MqttTransportHandle};
