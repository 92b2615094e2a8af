//! Panel configuration persistence
//!
//! Loads and saves the panel configuration as TOML in the user config
//! directory. A default file is written on first start, and an autosave task
//! mirrors live configuration changes back to disk so the panel comes up the
//! way it was left.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::mqtt::MqttServer;
use crate::source::DataSource;

/// How the central view renders the current message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Generic indicators for every axis and button slot
    #[default]
    #[serde(rename = "auto")]
    Auto,

    /// The selected layout schema, drawn as a controller
    #[serde(rename = "custom")]
    Custom,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 2] = [DisplayMode::Auto, DisplayMode::Custom];

    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Auto => "Auto-Generated",
            DisplayMode::Custom => "Custom Display",
        }
    }
}

/// Complete panel configuration
///
/// Every field carries a serde default so configs written by older builds
/// keep loading after new fields appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Which producer feeds the synthesizer
    pub data_source: DataSource,

    /// Topic to relay from while the subscribed source is selected
    pub sub_topic: String,

    /// Topic to re-publish on while publish mode is enabled
    pub pub_topic: String,

    /// Whether synthesized messages are re-published at all
    pub publish_mode: bool,

    /// Frame id stamped into every outgoing message
    pub frame_id: String,

    /// Central view style
    pub display_mode: DisplayMode,

    /// Name of the active layout schema
    pub layout_name: String,

    /// Device index fed through in gamepad mode
    pub gamepad_id: usize,

    /// Keyboard mode enable switch
    pub kb_enabled: bool,

    /// Broker endpoint for relay and publish
    pub server: MqttServer,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::SubTopic,
            sub_topic: "/joy".to_string(),
            pub_topic: "/joy".to_string(),
            publish_mode: false,
            frame_id: String::new(),
            display_mode: DisplayMode::Auto,
            layout_name: "steamdeck".to_string(),
            gamepad_id: 0,
            kb_enabled: true,
            server: MqttServer::default(),
        }
    }
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to parse config: {0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("No user config directory available")]
    NoConfigDir,
}

/// On-disk home of the panel configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `<user config dir>/joypanel/config.toml`
    pub fn at_default_location() -> Result<Self, PersistenceError> {
        let base = dirs::config_dir().ok_or(PersistenceError::NoConfigDir)?;
        Ok(Self::new(base.join("joypanel").join("config.toml")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Writes a default config if none exists yet
    pub async fn ensure_default(&self) -> Result<(), PersistenceError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }

        info!("Writing default config to {:?}", self.path);
        self.save(&PanelConfig::default()).await
    }

    pub async fn load(&self) -> Result<PanelConfig, PersistenceError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let config = toml::from_str(&raw)?;
        debug!("Loaded config from {:?}", self.path);
        Ok(config)
    }

    pub async fn save(&self, config: &PanelConfig) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let raw = toml::to_string_pretty(config)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!("Saved config to {:?}", self.path);
        Ok(())
    }

    /// Spawns a task that saves the config whenever it changed since the last tick
    pub fn start_autosave_task(
        self,
        mut config_rx: watch::Receiver<PanelConfig>,
        interval_secs: u64,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            // The first tick fires immediately; skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match config_rx.has_changed() {
                    Ok(true) => {
                        let config = config_rx.borrow_and_update().clone();
                        if let Err(e) = self.save(&config).await {
                            warn!("Autosave failed: {}", e);
                        }
                    }
                    Ok(false) => {}
                    Err(_) => {
                        debug!("Config channel closed, stopping autosave");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_panel_bootstrap_values() {
        let config = PanelConfig::default();

        assert_eq!(config.data_source, DataSource::SubTopic);
        assert_eq!(config.sub_topic, "/joy");
        assert_eq!(config.pub_topic, "/joy");
        assert!(!config.publish_mode);
        assert_eq!(config.frame_id, "");
        assert_eq!(config.display_mode, DisplayMode::Auto);
        assert_eq!(config.layout_name, "steamdeck");
        assert_eq!(config.gamepad_id, 0);
        assert!(config.kb_enabled);
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let config: PanelConfig = toml::from_str("").unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config: PanelConfig = toml::from_str(
            r#"
            data_source = "interactive"
            layout_name = "xbox"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_source, DataSource::Interactive);
        assert_eq!(config.layout_name, "xbox");
        assert_eq!(config.sub_topic, "/joy");
        assert!(config.kb_enabled);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = PanelConfig::default();
        config.data_source = DataSource::Gamepad;
        config.publish_mode = true;
        config.frame_id = "base_link".to_string();
        config.gamepad_id = 2;

        let raw = toml::to_string_pretty(&config).unwrap();
        let decoded: PanelConfig = toml::from_str(&raw).unwrap();
        assert_eq!(decoded, config);
    }
}
