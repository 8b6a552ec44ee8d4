use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::logging::init_tracing;
use crate::plex::{PlexApi, PlexClient};
use crate::sonarr::{SonarrApi, SonarrClient};

#[derive(Clone)]
pub struct AppState {
    pub plex: Arc<dyn PlexApi>,
    pub sonarr: Arc<dyn SonarrApi>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let plex: Arc<dyn PlexApi> = Arc::new(PlexClient::new(&settings.plex)?);
        let sonarr: Arc<dyn SonarrApi> = Arc::new(SonarrClient::new(&settings.sonarr)?);
        Ok(Self {
            plex,
            sonarr,
            settings: Arc::new(settings),
        })
    }
}

/// Shared start-up for both jobs: `.env`, logging, config, clients.
pub fn bootstrap(log_file: &str) -> Result<AppState> {
    let dotenv = dotenvy::dotenv();
    init_tracing(Path::new(log_file))?;
    match dotenv {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => debug!("No .env file loaded ({})", e),
    }

    let settings = Settings::from_default_location()?;
    info!(
        "Using Plex library '{}' at {}, Sonarr at {}",
        settings.plex.library, settings.plex.url, settings.sonarr.url
    );
    if settings.sonarr.tags_to_sync().is_empty() {
        warn!("No tags configured in tagsToSyncToPlex");
    }
    AppState::from_settings(settings)
}

/// The optional single positional argument: a TVDB id restricting the run to
/// one show.
pub fn parse_target_id<I>(args: I) -> Result<Option<u32>>
where
    I: IntoIterator<Item = String>,
{
    let Some(raw) = args.into_iter().next() else {
        return Ok(None);
    };
    let id = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Expected a numeric TVDB id, got '{}'", raw))?;
    info!("TVDB ID \"{}\" passed as argument", id);
    Ok(Some(id))
}
