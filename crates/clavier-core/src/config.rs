//! User configuration for the clavier player
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/clavier/config.yaml
//!
//! The player consumes this read-only: hotkey bindings, the note-label
//! → physical-key table, the sheet library directory and the name of
//! the window playback is allowed to target.

use crate::types::{PhysicalKey, ScanCode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Start/stop hotkey bindings
    pub hotkeys: HotkeyConfig,
    /// Playback settings (target window, key mapping)
    pub playback: PlaybackConfig,
    /// Directory scanned for sheet files
    /// Default: ~/Music/clavier-sheets
    pub music_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hotkeys: HotkeyConfig::default(),
            playback: PlaybackConfig::default(),
            music_dir: default_music_dir(),
        }
    }
}

/// Global hotkey bindings, matched by hardware scan code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Starts a playback pass while the session is armed
    pub start_key: KeyBinding,
    /// Pauses the pass currently playing
    pub stop_key: KeyBinding,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            start_key: KeyBinding { name: "v".into(), scan_code: ScanCode(47) },
            stop_key: KeyBinding { name: "b".into(), scan_code: ScanCode(48) },
        }
    }
}

/// One hotkey: display name plus the scan code hooks match against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBinding {
    pub name: String,
    pub scan_code: ScanCode,
}

/// Playback settings section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// First word of the foreground window title playback targets;
    /// presses are ignored while any other window is active
    pub target_window: String,
    /// Note-label position suffix → physical key
    pub key_mapping: BTreeMap<String, PhysicalKey>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target_window: "Sky".into(),
            key_mapping: default_key_mapping(),
        }
    }
}

/// The standard 15-key in-game layout, three rows of five
pub fn default_key_mapping() -> BTreeMap<String, PhysicalKey> {
    ["y", "u", "i", "o", "p", "h", "j", "k", "l", ";", "n", "m", ",", ".", "/"]
        .iter()
        .enumerate()
        .map(|(position, key)| (position.to_string(), PhysicalKey::from(*key)))
        .collect()
}

/// Get the default config file path
///
/// Returns: ~/.config/clavier/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("clavier")
        .join("config.yaml")
}

/// Get the default sheet library directory
///
/// Returns: ~/Music/clavier-sheets
pub fn default_music_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("clavier-sheets")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> AppConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: Loaded config ({} mapped keys, start '{}', stop '{}')",
                    config.playback.key_mapping.len(),
                    config.hotkeys.start_key.name,
                    config.hotkeys.stop_key.name
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config: {}", e);
            AppConfig::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {parent:?}"))?;
    }
    let contents = serde_yaml::to_string(config).context("Failed to serialize config")?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write config to {path:?}"))?;
    Ok(())
}
