//! Booth configuration.

use std::path::Path;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::compositor::OutputSize;
use crate::error::{PhotoboothResult, ResultExt};
use crate::export::DEFAULT_DOWNLOAD_FILENAME;

/// Longest accepted countdown.
pub const MAX_COUNTDOWN_SECS: u32 = 10;

/// Centralized booth configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct BoothConfig {
    /// Countdown before each capture (0-10 seconds).
    pub countdown_secs: u32,

    /// Size of the captured photo.
    pub output: OutputSize,

    /// Mirror the live frame horizontally in the captured photo.
    pub mirror: bool,

    /// Overlay identifiers, in display order. The first is selected initially.
    pub overlays: Vec<String>,

    /// Directory the overlay identifiers are resolved against.
    pub asset_dir: String,

    /// File name for downloads.
    pub download_filename: String,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            output: OutputSize::FullHd,
            mirror: false,
            overlays: vec![
                "kana-frame.png".to_string(),
                "sakura-frame.png".to_string(),
                "polaroid-frame.png".to_string(),
            ],
            asset_dir: "assets/frames".to_string(),
            download_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
        }
    }
}

impl BoothConfig {
    /// Clamp and repair settings.
    pub fn validate(&mut self) {
        self.countdown_secs = self.countdown_secs.min(MAX_COUNTDOWN_SECS);
        self.output = self.output.clamped();

        let mut seen = Vec::with_capacity(self.overlays.len());
        self.overlays.retain(|id| {
            let keep = !id.trim().is_empty() && !seen.contains(id);
            seen.push(id.clone());
            keep
        });
        if self.overlays.is_empty() {
            self.overlays = Self::default().overlays;
        }

        if self.download_filename.trim().is_empty() {
            self.download_filename = DEFAULT_DOWNLOAD_FILENAME.to_string();
        }
    }

    /// Reset all settings to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> PhotoboothResult<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> PhotoboothResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        Self::from_json(&json)
    }
}

lazy_static! {
    /// Global booth configuration.
    ///
    /// Thread-safe access via `parking_lot::RwLock` (non-poisoning, fast).
    pub static ref BOOTH_CONFIG: RwLock<BoothConfig> = RwLock::new(BoothConfig::default());
}

/// Snapshot of the global configuration.
pub fn get_booth_config() -> BoothConfig {
    BOOTH_CONFIG.read().clone()
}

/// Replace the global configuration (batch update).
pub fn set_booth_config(config: BoothConfig) {
    let mut current = BOOTH_CONFIG.write();
    *current = config;
    current.validate();
    log::debug!("[CONFIG] Booth config updated: {:?}", *current);
}

/// Set the countdown length.
pub fn set_countdown_secs(secs: u32) {
    BOOTH_CONFIG.write().countdown_secs = secs.min(MAX_COUNTDOWN_SECS);
    log::debug!("[CONFIG] set_countdown_secs({})", secs);
}

/// Get the current countdown setting.
pub fn get_countdown_secs() -> u32 {
    BOOTH_CONFIG.read().countdown_secs
}

/// Set the output size.
pub fn set_output_size(output: OutputSize) {
    BOOTH_CONFIG.write().output = output.clamped();
    log::debug!("[CONFIG] set_output_size({:?})", output);
}

/// Reset the global configuration to defaults.
pub fn reset_booth_config() {
    BOOTH_CONFIG.write().reset();
    log::debug!("[CONFIG] Booth settings reset to defaults");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoothConfig::default();
        assert_eq!(config.countdown_secs, 5);
        assert_eq!(config.output.dimensions(), (1920, 1080));
        assert_eq!(config.overlays[0], "kana-frame.png");
        assert_eq!(config.download_filename, "captured-photo.png");
    }

    #[test]
    fn test_validate_clamps_and_repairs() {
        let mut config = BoothConfig {
            countdown_secs: 99,
            output: OutputSize::Custom {
                width: 0,
                height: 480,
            },
            overlays: vec![
                "a.png".to_string(),
                " ".to_string(),
                "a.png".to_string(),
                "b.png".to_string(),
            ],
            download_filename: String::new(),
            ..BoothConfig::default()
        };
        config.validate();

        assert_eq!(config.countdown_secs, MAX_COUNTDOWN_SECS);
        assert_eq!(config.output.dimensions(), (1, 480));
        assert_eq!(config.overlays, vec!["a.png", "b.png"]);
        assert_eq!(config.download_filename, DEFAULT_DOWNLOAD_FILENAME);

        config.overlays.clear();
        config.validate();
        assert_eq!(config.overlays, BoothConfig::default().overlays);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            BoothConfig::from_json(r#"{"countdownSecs": 3, "output": {"type": "vga"}, "mirror": true}"#)
                .unwrap();
        assert_eq!(config.countdown_secs, 3);
        assert_eq!(config.output, OutputSize::Vga);
        assert!(config.mirror);
        assert_eq!(config.overlays, BoothConfig::default().overlays);

        assert!(BoothConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.json");
        std::fs::write(&path, r#"{"overlays": ["x.png"], "countdownSecs": 0}"#).unwrap();

        let config = BoothConfig::load(&path).unwrap();
        assert_eq!(config.overlays, vec!["x.png"]);
        assert_eq!(config.countdown_secs, 0);

        let err = BoothConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_global_config_roundtrip() {
        reset_booth_config();
        set_countdown_secs(42);
        assert_eq!(get_countdown_secs(), MAX_COUNTDOWN_SECS);

        set_output_size(OutputSize::Vga);
        assert_eq!(get_booth_config().output, OutputSize::Vga);

        set_booth_config(BoothConfig {
            countdown_secs: 2,
            ..BoothConfig::default()
        });
        assert_eq!(get_countdown_secs(), 2);

        reset_booth_config();
        assert_eq!(get_booth_config(), BoothConfig::default());
    }
}
