use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pdf::ViewerConfig;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfpane";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Pixels of host chrome reserved below the page; hosts supply their own
    /// default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_height: Option<u32>,

    /// Re-render after a render that swallowed a resize
    #[serde(default)]
    pub rerender_missed_resize: bool,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            chrome_height: None,
            rerender_missed_resize: false,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Viewer configuration, with `default_chrome` used unless the file
    /// sets `chrome_height`
    #[must_use]
    pub fn viewer_config(&self, default_chrome: u32) -> ViewerConfig {
        ViewerConfig {
            chrome_height: self.chrome_height.unwrap_or(default_chrome),
            rerender_missed_resize: self.rerender_missed_resize,
        }
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// The configured level, or `None` when `log_level` is not a level name
    #[must_use]
    pub fn parse_log_level(&self) -> Option<log::LevelFilter> {
        self.log_level.parse().ok()
    }

    /// The configured level, falling back to info
    #[must_use]
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.parse_log_level().unwrap_or_else(|| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            log::LevelFilter::Info
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `path`, or from the default location when `None`.
///
/// A missing file is created with defaults; an unreadable or malformed file
/// is logged and defaults are used.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return Settings::default();
            }
        },
    };

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings_to_file(&settings, &path);
        return settings;
    }

    load_settings_from_path(&path).unwrap_or_default()
}

fn load_settings_from_path(path: &Path) -> Option<Settings> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            return None;
        }
    };

    match serde_yaml::from_str::<Settings>(&content) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");
            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, path);
            }
            Some(settings)
        }
        Err(e) => {
            error!("Failed to parse settings file {path:?}: {e}");
            None
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(yaml) => format!("{SETTINGS_HEADER}{yaml}"),
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# pdfpane settings
#
# chrome_height:          pixels below the page reserved for host controls
# rerender_missed_resize: re-render once when a resize lands mid-render
# fetch_timeout_secs:     timeout for http(s) document sources
# log_level:              off | error | warn | info | debug | trace

"#;
