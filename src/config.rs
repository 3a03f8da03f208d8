//! JSON configuration (`config.json`).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BridgeError, Result};
use crate::general::endpoint::{validate, Endpoint};
use crate::general::spatial::Point;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub audio: AudioConfig,
    pub scene: SceneConfig,
    pub zone: ZoneConfig,
    pub hello_message: String,
    /// Capacity of the receive -> consumption apply queue.
    pub queue_capacity: usize,
    /// Echo every status line to the console.
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// "ip:port" of the sound engine; unset until the user provides one.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub endpoint: Option<String>,
    pub listen_port: Option<u16>,
    pub axis_step: f32,
    pub objects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub center: Point,
    pub radius: f32,
    pub elements: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            audio: AudioConfig::default(),
            scene: SceneConfig::default(),
            zone: ZoneConfig::default(),
            hello_message: "Hello from control board!".to_string(),
            queue_capacity: 1024,
            verbose: true,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            endpoint: None,
            listen_port: None,
            axis_step: 0.1,
            objects: 1,
        }
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            center: Point::default(),
            radius: 100.0,
            elements: vec!["1".to_string(), "2".to_string()],
        }
    }
}

impl BridgeConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&text)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.audio_endpoint()?;
        self.scene_endpoint()?;

        if !self.zone.radius.is_finite() || self.zone.radius <= 0.0 {
            return Err(BridgeError::InvalidRadius(self.zone.radius));
        }
        let mut seen = HashSet::new();
        for id in &self.zone.elements {
            if !seen.insert(id) {
                return Err(BridgeError::DuplicateElement(id.clone()));
            }
        }
        if self.queue_capacity == 0 {
            return Err(BridgeError::Config("queue_capacity must be at least 1".into()));
        }
        if self.scene.listen_port == Some(0) {
            return Err(BridgeError::PortOutOfRange(0));
        }
        Ok(())
    }

    pub fn audio_endpoint(&self) -> Result<Option<Endpoint>> {
        self.audio.endpoint.as_deref().map(validate).transpose()
    }

    pub fn scene_endpoint(&self) -> Result<Option<Endpoint>> {
        self.scene.endpoint.as_deref().map(validate).transpose()
    }
}
