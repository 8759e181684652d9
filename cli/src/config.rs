// Configuration management for the qrshare CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/qrshare/config.json
// - Linux: ~/.config/qrshare/config.json
// - Windows: %APPDATA%\qrshare\config.json

use anyhow::{Context, Result};
use qrshare_core::qr::Scale;
use qrshare_core::{ErrorCorrection, RenderOptions, Rgba};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Largest module size accepted for SVG output; a version 40 symbol at
/// this size stays under the renderer's image limit
pub const MAX_MODULE_PX: u32 = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// QR foreground color, `#rrggbb`
    pub foreground: String,

    /// QR background color, `#rrggbb`
    pub background: String,

    /// Module size in pixels for SVG output
    pub module_px: u32,

    /// Draw the four-module quiet zone around SVG output
    pub quiet_zone: bool,

    /// Quiet period in `live` mode before re-encoding
    pub debounce_ms: u64,

    /// Preference store location
    pub prefs_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            foreground: Rgba::BLACK.to_hex_rgb(),
            background: Rgba::WHITE.to_hex_rgb(),
            module_px: 8,
            quiet_zone: true,
            debounce_ms: 250,
            prefs_path: None, // Data directory
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("qrshare");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the data directory path (cross-platform)
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to determine data directory")?
            .join("qrshare");

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        Ok(data_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    /// Load config from `path`, creating it with defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            debug!(path = %path.display(), "Loaded config");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            debug!(path = %path.display(), "Created default config");
            Ok(config)
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Resolved preference store path
    pub fn prefs_path(&self) -> Result<PathBuf> {
        match &self.prefs_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(Self::data_dir()?.join("prefs")),
        }
    }

    pub fn colors(&self) -> Result<(Rgba, Rgba)> {
        let fg = Rgba::from_hex(&self.foreground).context("Invalid foreground color")?;
        let bg = Rgba::from_hex(&self.background).context("Invalid background color")?;
        Ok((fg, bg))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Options for file output at a given error-correction level
    pub fn render_options(&self, error_correction: ErrorCorrection) -> RenderOptions {
        RenderOptions {
            error_correction,
            scale: Scale::ModulePx(self.module_px),
            quiet_zone: self.quiet_zone,
        }
    }

    /// Set a config value in memory; the caller saves
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "foreground" => {
                Rgba::from_hex(value).context("Invalid color, expected #rrggbb")?;
                self.foreground = value.to_string();
            }
            "background" => {
                Rgba::from_hex(value).context("Invalid color, expected #rrggbb")?;
                self.background = value.to_string();
            }
            "module_px" => {
                let px: u32 = value.parse().context("Invalid number")?;
                anyhow::ensure!(
                    (1..=MAX_MODULE_PX).contains(&px),
                    "module_px must be between 1 and {}",
                    MAX_MODULE_PX
                );
                self.module_px = px;
            }
            "quiet_zone" => {
                self.quiet_zone = value.parse().context("Invalid boolean value")?;
            }
            "debounce_ms" => {
                self.debounce_ms = value.parse().context("Invalid number")?;
            }
            "prefs_path" => {
                self.prefs_path = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "foreground" => Some(self.foreground.clone()),
            "background" => Some(self.background.clone()),
            "module_px" => Some(self.module_px.to_string()),
            "quiet_zone" => Some(self.quiet_zone.to_string()),
            "debounce_ms" => Some(self.debounce_ms.to_string()),
            "prefs_path" => self.prefs_path.clone(),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("foreground".to_string(), self.foreground.clone()),
            ("background".to_string(), self.background.clone()),
            ("module_px".to_string(), self.module_px.to_string()),
            ("quiet_zone".to_string(), self.quiet_zone.to_string()),
            ("debounce_ms".to_string(), format!("{}ms", self.debounce_ms)),
            (
                "prefs_path".to_string(),
                self.prefs_path.clone().unwrap_or_else(|| "(auto)".to_string()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.foreground, "#000000");
        assert_eq!(config.background, "#ffffff");
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert!(config.quiet_zone);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"module_px": 4}"#).unwrap();
        assert_eq!(config.module_px, 4);
        assert_eq!(config.debounce_ms, 250);
    }

    #[test]
    fn test_set_validates() {
        let mut config = Config::default();
        config.set("foreground", "#112233").unwrap();
        assert_eq!(config.get("foreground").unwrap(), "#112233");

        assert!(config.set("foreground", "red").is_err());
        assert!(config.set("module_px", "0").is_err());
        assert!(config.set("quiet_zone", "maybe").is_err());
        assert!(config.set("listen_port", "1").is_err());
    }

    #[test]
    fn test_module_px_bounded() {
        let mut config = Config::default();
        config.set("module_px", &MAX_MODULE_PX.to_string()).unwrap();
        assert_eq!(config.module_px, MAX_MODULE_PX);

        assert!(config.set("module_px", "33").is_err());
        assert!(config.set("module_px", &u32::MAX.to_string()).is_err());
        assert_eq!(config.module_px, MAX_MODULE_PX);

        // Largest symbol at the largest module size still renders
        let text = "x".repeat(2000);
        let options = config.render_options(ErrorCorrection::Low);
        assert!(qrshare_core::qr::render_svg(&text, Rgba::BLACK, Rgba::WHITE, &options).is_ok());
    }

    #[test]
    fn test_load_creates_then_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::load_from(&path).unwrap();
        assert!(path.exists());

        config.set("debounce_ms", "400").unwrap();
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.debounce_ms, 400);
    }

    #[test]
    fn test_render_options_from_config() {
        let mut config = Config::default();
        config.set("module_px", "3").unwrap();
        config.set("quiet_zone", "false").unwrap();

        let options = config.render_options(ErrorCorrection::High);
        assert_eq!(options.scale, Scale::ModulePx(3));
        assert!(!options.quiet_zone);
        assert_eq!(options.error_correction, ErrorCorrection::High);
    }
}
