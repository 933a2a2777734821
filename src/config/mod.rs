//! Configuration management for MidiKeys
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.
//! Channels are 1-based here, as users write them.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::backend::BackendKind;
use crate::keys::KeyMap;
use crate::router::RoutingSettings;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub keymap: KeyMap,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            midi: MidiConfig::default(),
            routing: RoutingConfig::default(),
            keymap: KeyMap::default(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Transport selection for both sides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidiConfig {
    #[serde(default)]
    pub input: PortConfig,
    #[serde(default)]
    pub output: PortConfig,
}

/// One side of the MIDI connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Index into the backend's device list, clamped to the last device
    #[serde(default)]
    pub device: usize,
}

/// Channel routing (1-16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default = "default_channel")]
    pub listen_channel: u8,
    #[serde(default)]
    pub remap_channel: Option<u8>,
    #[serde(default = "default_channel")]
    pub output_channel: u8,
    #[serde(default = "default_true")]
    pub sync_output_channel: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            listen_channel: default_channel(),
            remap_channel: None,
            output_channel: default_channel(),
            sync_output_channel: true,
        }
    }
}

impl RoutingConfig {
    /// Convert to the router's 0-based settings
    pub fn to_settings(&self) -> RoutingSettings {
        fn zero_based(channel: u8) -> u8 {
            channel.clamp(1, 16) - 1
        }

        RoutingSettings {
            listen_channel: zero_based(self.listen_channel),
            remap_channel: self.remap_channel.map(zero_based),
            output_channel: zero_based(self.output_channel),
            sync_output_channel: self.sync_output_channel,
        }
    }

    pub fn from_settings(settings: &RoutingSettings) -> Self {
        Self {
            listen_channel: settings.listen_channel + 1,
            remap_channel: settings.remap_channel.map(|ch| ch + 1),
            output_channel: settings.output_channel + 1,
            sync_output_channel: settings.sync_output_channel,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        let routing = &self.routing;
        validate_channel("listen_channel", routing.listen_channel)?;
        validate_channel("output_channel", routing.output_channel)?;
        if let Some(remap) = routing.remap_channel {
            validate_channel("remap_channel", remap)?;
        }

        if self.midi.input.backend == BackendKind::Console {
            tracing::warn!("Console backend has no input side; input will stay disconnected");
        }

        for (note, key) in self.keymap.iter() {
            if note > 127 {
                anyhow::bail!("Key map note {} is out of range (must be 0-127)", note);
            }
            if key.trim().is_empty() {
                anyhow::bail!("Key map entry for note {} has an empty key", note);
            }
        }

        if !(1..=1000).contains(&self.tick_ms) {
            anyhow::bail!("tick_ms must be between 1 and 1000 (got {})", self.tick_ms);
        }

        Ok(())
    }
}

fn validate_channel(field: &str, channel: u8) -> Result<()> {
    if !(1..=16).contains(&channel) {
        anyhow::bail!("routing.{} must be 1-16 (got {})", field, channel);
    }
    Ok(())
}

fn default_channel() -> u8 { 1 }
fn default_true() -> bool { true }
fn default_tick_ms() -> u64 { 16 }
