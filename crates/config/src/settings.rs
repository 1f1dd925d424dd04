// User settings
// Loaded from ~/.config/newsmerge/settings.json

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use newsmerge_core::search::DEFAULT_THRESHOLD;
use newsmerge_core::session::SessionOptions;
use newsmerge_core::{Composition, EmptyTagPolicy, LabelRule, SearchOptions};

#[derive(Debug)]
pub enum SettingsError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Invalid(String),
    Write { path: PathBuf, message: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "invalid JSON in {}: {message}", path.display()),
            Self::Invalid(message) => write!(f, "invalid setting: {message}"),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Search
    #[serde(rename = "search.threshold")]
    pub threshold: f64,

    // Tags
    #[serde(rename = "tags.empty")]
    pub empty_tags: EmptyTagPolicy,

    // View
    #[serde(rename = "view.composition")]
    pub composition: Composition,

    #[serde(rename = "view.labeling")]
    pub labeling: LabelRule,

    // Output
    #[serde(rename = "output.json")]
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            empty_tags: EmptyTagPolicy::default(),
            composition: Composition::default(),
            labeling: LabelRule::default(),
            json: false,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsmerge")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults.
    ///
    /// A missing file is not an error. A broken one is logged and ignored.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from `path`. Lines starting with `//` are treated as comments.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings = serde_json::from_str(&cleaned).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SettingsError::Invalid(format!(
                "search.threshold must be between 0 and 1, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |message: String| SettingsError::Write {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, json).map_err(|e| write_err(e.to_string()))
    }

    /// Session options for a run that has no manifest.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            search: SearchOptions { threshold: self.threshold },
            empty_tags: self.empty_tags,
            composition: self.composition,
            ..SessionOptions::default()
        }
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
