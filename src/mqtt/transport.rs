//! Broker connection task
//!
//! Owns the rumqttc client and event loop in one tokio task. The task keeps
//! the subscription in sync with the panel configuration (subscribed only
//! while the relay source is selected), decodes incoming joy payloads for the
//! panel, and publishes outgoing messages on the configured topic. Connection
//! errors are logged and retried; the task only ends when its channels close.

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::message::JoyMessage;
use crate::persistence::PanelConfig;
use crate::source::DataSource;

/// MQTT transport errors
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("Failed to subscribe to '{topic}': {reason}")]
    SubscribeError { topic: String, reason: String },

    #[error("Failed to publish on '{topic}': {reason}")]
    PublishError { topic: String, reason: String },
}

/// Handle for the broker connection task
pub struct MqttTransportHandle {
    task_handle: JoinHandle<()>,
}

impl MqttTransportHandle {
    /// Spawns the transport task against the configured broker
    pub fn spawn(
        config_rx: watch::Receiver<PanelConfig>,
        publish_rx: mpsc::Receiver<JoyMessage>,
        relay_tx: mpsc::Sender<JoyMessage>,
    ) -> Self {
        let task_handle = tokio::spawn(async move {
            run_transport(config_rx, publish_rx, relay_tx).await;
            info!("MQTT transport task finished");
        });

        Self { task_handle }
    }

    pub fn abort(&self) {
        self.task_handle.abort();
    }
}

async fn run_transport(
    mut config_rx: watch::Receiver<PanelConfig>,
    mut publish_rx: mpsc::Receiver<JoyMessage>,
    relay_tx: mpsc::Sender<JoyMessage>,
) {
    let server = config_rx.borrow().server.clone();
    let (host, port) = server.host_and_port();
    info!("Connecting to MQTT broker at {}:{}", host, port);

    let mut mqtt_options = MqttOptions::new("JoyPanel", host, port);
    mqtt_options
        .set_credentials(server.user.clone(), server.pw.clone())
        .set_keep_alive(Duration::from_secs(5));

    let (client, mut event_loop) = AsyncClient::new(mqtt_options, 100);

    let mut subscribed: Option<String> = None;
    let initial_config = config_rx.borrow().clone();
    if let Err(e) = sync_subscription(&client, &mut subscribed, &initial_config).await {
        warn!("{}", e);
    }

    loop {
        tokio::select! {
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if subscribed.as_deref() == Some(publish.topic.as_str()) {
                        match serde_json::from_slice::<JoyMessage>(&publish.payload) {
                            Ok(message) => {
                                debug!("Relayed joy message from '{}'", publish.topic);
                                if relay_tx.try_send(message).is_err() {
                                    debug!("Relay channel full or closed, dropping message");
                                }
                            }
                            Err(e) => warn!("Discarding malformed joy payload: {}", e),
                        }
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker");
                    // Re-establish the subscription after (re)connects.
                    let wanted = subscribed.take();
                    if let Some(topic) = wanted {
                        if let Err(e) = client.subscribe(&topic, QoS::AtMostOnce).await {
                            warn!("Failed to re-subscribe to '{}': {}", topic, e);
                        } else {
                            subscribed = Some(topic);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("MQTT connection error: {}", e);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            },

            changed = config_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let config = config_rx.borrow().clone();
                if let Err(e) = sync_subscription(&client, &mut subscribed, &config).await {
                    warn!("{}", e);
                }
            }

            message = publish_rx.recv() => {
                let Some(message) = message else { break };
                let topic = config_rx.borrow().pub_topic.clone();
                if let Err(e) = publish_message(&client, &topic, &message).await {
                    warn!("{}", e);
                }
            }
        }
    }
}

/// Brings the broker subscription in line with the panel configuration
///
/// Subscribed exactly while the relay source is selected; a topic change
/// unsubscribes the old topic first.
async fn sync_subscription(
    client: &AsyncClient,
    subscribed: &mut Option<String>,
    config: &PanelConfig,
) -> Result<(), MqttError> {
    let wanted =
        (config.data_source == DataSource::SubTopic).then(|| config.sub_topic.clone());

    if wanted == *subscribed {
        return Ok(());
    }

    if let Some(old_topic) = subscribed.take() {
        info!("Unsubscribing from '{}'", old_topic);
        if let Err(e) = client.unsubscribe(&old_topic).await {
            warn!("Failed to unsubscribe from '{}': {}", old_topic, e);
        }
    }

    if let Some(topic) = wanted {
        info!("Subscribing to '{}'", topic);
        client
            .subscribe(&topic, QoS::AtMostOnce)
            .await
            .map_err(|e| MqttError::SubscribeError {
                topic: topic.clone(),
                reason: e.to_string(),
            })?;
        *subscribed = Some(topic);
    }

    Ok(())
}

async fn publish_message(
    client: &AsyncClient,
    topic: &str,
    message: &JoyMessage,
) -> Result<(), MqttError> {
    let payload = serde_json::to_vec(message).map_err(|e| MqttError::PublishError {
        topic: topic.to_string(),
        reason: e.to_string(),
    })?;

    client
        .publish(topic, QoS::AtMostOnce, false, payload)
        .await
        .map_err(|e| MqttError::PublishError {
            topic: topic.to_string(),
            reason: e.to_string(),
        })
}
