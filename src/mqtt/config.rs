use serde::{Deserialize, Serialize};

/// Broker endpoint and credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttServer {
    /// `host` or `host:port`; port defaults to 1883
    pub url: String,
    pub user: String,
    pub pw: String,
}

impl Default for MqttServer {
    fn default() -> Self {
        Self {
            url: "localhost:1883".to_string(),
            user: String::new(),
            pw: String::new(),
        }
    }
}

impl MqttServer {
    /// Splits the url into host and port, falling back to 1883
    pub fn host_and_port(&self) -> (String, u16) {
        let mut components = self.url.splitn(2, ':');
        let host = components.next().unwrap_or("localhost").to_string();
        let port = components
            .next()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1883);

        (host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_host_and_port() {
        let server = MqttServer {
            url: "broker.local:8883".to_string(),
            ..Default::default()
        };
        assert_eq!(server.host_and_port(), ("broker.local".to_string(), 8883));
    }

    #[test]
    fn missing_or_bad_port_falls_back_to_default() {
        let bare = MqttServer {
            url: "broker.local".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.host_and_port(), ("broker.local".to_string(), 1883));

        let garbled = MqttServer {
            url: "broker.local:not-a-port".to_string(),
            ..Default::default()
        };
        assert_eq!(garbled.host_and_port().1, 1883);
    }
}
