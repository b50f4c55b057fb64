use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::presentation::{AspectRatio, Mode};
use crate::presenter::NotesDisplay;
use crate::theme::{THEME_NAMES, Theme};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "bigshow";

pub const KEYS: &[&str] = &[
    "defaults.theme",
    "defaults.aspect_ratio",
    "defaults.start_mode",
    "presenter.notes_display",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter: Option<PresenterConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_display: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| Error::NoDirectory("config").into())
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `bigshow config show` to see defaults.")
            } else {
                Error::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
                .into()
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# bigshow configuration\n{yaml}");
        std::fs::write(path, contents).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.theme" => {
                if Theme::from_name(value).is_none() {
                    return Err(invalid(key, value, "Must be 'dark', 'light', or 'white'."));
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            "defaults.aspect_ratio" => {
                value.parse::<AspectRatio>().map_err(|_| {
                    invalid(key, value, "Must be a positive number or 'false'.")
                })?;
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .aspect_ratio = Some(value.to_string());
            }
            "defaults.start_mode" => {
                value
                    .parse::<Mode>()
                    .map_err(|_| invalid(key, value, "Must be 'talk', 'print', or 'jump'."))?;
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .start_mode = Some(value.to_string());
            }
            "presenter.notes_display" => {
                value
                    .parse::<NotesDisplay>()
                    .map_err(|_| invalid(key, value, "Must be 'fit' or 'scroll'."))?;
                self.presenter
                    .get_or_insert_with(PresenterConfig::default)
                    .notes_display = Some(value.to_string());
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {}", KEYS.join(", ")),
        }
        Ok(())
    }

    pub fn theme(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.theme.as_deref())
    }

    /// Values are validated on `set`; a hand-edited bad value is ignored.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        let raw = self.defaults.as_ref()?.aspect_ratio.as_deref()?;
        parse_or_warn("defaults.aspect_ratio", raw)
    }

    pub fn start_mode(&self) -> Option<Mode> {
        let raw = self.defaults.as_ref()?.start_mode.as_deref()?;
        parse_or_warn("defaults.start_mode", raw)
    }

    pub fn notes_display(&self) -> Option<NotesDisplay> {
        let raw = self.presenter.as_ref()?.notes_display.as_deref()?;
        parse_or_warn("presenter.notes_display", raw)
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> anyhow::Error {
    Error::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        log::warn!("ignoring config {key}: {raw:?}");
    }
    parsed
}

/// Every valid theme name, for help texts.
pub fn theme_names() -> String {
    THEME_NAMES.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        config.set("defaults.theme", "white").unwrap();
        config.set("defaults.aspect_ratio", "false").unwrap();
        config.set("defaults.start_mode", "jump").unwrap();
        config.set("presenter.notes_display", "scroll").unwrap();

        assert_eq!(config.theme(), Some("white"));
        assert_eq!(config.aspect_ratio(), Some(AspectRatio::Free));
        assert_eq!(config.start_mode(), Some(Mode::Jump));
        assert_eq!(config.notes_display(), Some(NotesDisplay::Scroll));

        assert!(config.set("defaults.theme", "sepia").is_err());
        assert!(config.set("defaults.aspect_ratio", "-1").is_err());
        assert!(config.set("defaults.start_mode", "overview").is_err());
        assert!(config.set("defaults.transition", "fade").is_err());
        assert_eq!(config.theme(), Some("white"));
    }

    #[test]
    fn test_invalid_value_message() {
        let mut config = Config::default();
        let err = config.set("presenter.notes_display", "tiny").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid presenter.notes_display: tiny. Must be 'fit' or 'scroll'."
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);
        let mut config = Config::default();
        config.set("defaults.theme", "light").unwrap();
        config.set("defaults.aspect_ratio", "1.333").unwrap();
        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# bigshow configuration\n"));
        assert!(!contents.contains("presenter"));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_mentions_config_show() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("bigshow config show"));
    }

    #[test]
    fn test_hand_edited_bad_value_is_ignored() {
        let config: Config =
            serde_yaml::from_str("defaults:\n  start_mode: overview\n  theme: dark\n").unwrap();
        assert_eq!(config.start_mode(), None);
        assert_eq!(config.theme(), Some("dark"));
    }
}
