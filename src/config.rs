//! Connection settings for Plex and Sonarr, read from an INI file.
//!
//! ```ini
//! [plex]
//! url = http://localhost:32400
//! token = xxxx
//! library = TV Shows
//!
//! [sonarr]
//! url = http://localhost:8989
//! apikey = xxxx
//! tagsToSyncToPlex = anime, kids
//! ```
//!
//! Any value can be overridden from the environment, e.g.
//! `LABELARR_SONARR__APIKEY`.
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.ini";
pub const CONFIG_PATH_ENV: &str = "LABELARR_CONFIG";
const ENV_PREFIX: &str = "LABELARR";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub plex: PlexSettings,
    pub sonarr: SonarrSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexSettings {
    pub url: String,
    pub token: String,
    pub library: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SonarrSettings {
    pub url: String,
    pub apikey: String,
    #[serde(default, rename = "tagsToSyncToPlex", alias = "tagstosynctoplex")]
    pub tags_to_sync_to_plex: String,
}

impl SonarrSettings {
    /// Allow-listed Sonarr tags, trimmed and lowercased, empties dropped.
    pub fn tags_to_sync(&self) -> Vec<String> {
        parse_tag_list(&self.tags_to_sync_to_plex)
    }
}

impl Settings {
    /// Loads from `$LABELARR_CONFIG`, falling back to `./config.ini`.
    pub fn from_default_location() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file {} not found", path.display());
        }
        let raw = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut settings: Settings = raw
            .try_deserialize()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    fn normalize(&mut self) {
        self.plex.url = self.plex.url.trim().trim_end_matches('/').to_string();
        self.sonarr.url = self.sonarr.url.trim().trim_end_matches('/').to_string();
        self.plex.library = self.plex.library.trim().to_string();
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("plex.url", &self.plex.url),
            ("plex.token", &self.plex.token),
            ("plex.library", &self.plex.library),
            ("sonarr.url", &self.sonarr.url),
            ("sonarr.apikey", &self.sonarr.apikey),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("Missing required setting: {}", key);
            }
        }
        Ok(())
    }
}

pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
