use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::SonarrSettings;

const API_PREFIX: &str = "api/v3";

#[async_trait]
pub trait SonarrApi: Send + Sync {
    async fn all_series(&self) -> Result<Vec<Series>>;
    /// `Ok(None)` when Sonarr does not track the show.
    async fn series_by_tvdb(&self, tvdb_id: u32) -> Result<Option<Series>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: i32,
    pub title: String,
    pub tvdb_id: u32,
    pub status: SeriesStatus,
    pub next_airing: Option<DateTime<Utc>>,
    pub season_count: u32,
    pub seasons: Vec<Season>,
    /// Tag labels, resolved from Sonarr's tag ids.
    pub tags: Vec<String>,
}

impl Series {
    pub fn latest_season_number(&self) -> Option<u32> {
        self.seasons.iter().map(|s| s.season_number).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStatus {
    Continuing,
    Ended,
    Upcoming,
    Unknown,
}

impl SeriesStatus {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("continuing") => Self::Continuing,
            Some("ended") => Self::Ended,
            Some("upcoming") => Self::Upcoming,
            _ => Self::Unknown,
        }
    }

    /// Whether new episodes may still be added to the latest season.
    pub fn is_airing(self) -> bool {
        !matches!(self, Self::Ended)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Season {
    pub season_number: u32,
    pub monitored: bool,
    pub episode_file_count: u32,
    pub total_episode_count: u32,
    pub percent_of_episodes: f64,
}

#[derive(Debug, Clone)]
pub struct SonarrClient {
    client: Client,
    base_url: String,
    /// Tag id to label, fetched once per client.
    tags: OnceCell<HashMap<i32, String>>,
}

impl SonarrClient {
    pub fn new(settings: &SonarrSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key =
            HeaderValue::from_str(&settings.apikey).context("Sonarr API key is not a valid header")?;
        key.set_sensitive(true);
        headers.insert("X-Api-Key", key);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(format!("labelarr/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("Failed to build Sonarr HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.url.clone(),
            tags: OnceCell::new(),
        })
    }

    async fn tag_labels(&self) -> Result<&HashMap<i32, String>> {
        self.tags.get_or_try_init(|| self.fetch_tags()).await
    }

    async fn fetch_tags(&self) -> Result<HashMap<i32, String>> {
        let url = format!("{}/{API_PREFIX}/tag", self.base_url);
        let tags: Vec<TagResource> = self.get_json(&url).await?;
        Ok(tags.into_iter().map(|t| (t.id, t.label)).collect())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("Sonarr request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading Sonarr body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        serde_json::from_str(&text).with_context(|| format!("Sonarr JSON parse failed for {url}"))
    }
}

#[async_trait]
impl SonarrApi for SonarrClient {
    async fn all_series(&self) -> Result<Vec<Series>> {
        let tags = self.tag_labels().await?;
        let url = format!("{}/{API_PREFIX}/series", self.base_url);
        let series: Vec<SeriesResource> = self.get_json(&url).await?;
        Ok(series.into_iter().map(|s| s.into_series(tags)).collect())
    }

    async fn series_by_tvdb(&self, tvdb_id: u32) -> Result<Option<Series>> {
        let url = format!("{}/{API_PREFIX}/series?tvdbId={tvdb_id}", self.base_url);
        let series: Vec<SeriesResource> = self.get_json(&url).await?;
        // Older Sonarr builds ignore the filter and return every series.
        let Some(found) = series.into_iter().find(|s| s.tvdb_id == tvdb_id) else {
            return Ok(None);
        };
        let tags = self.tag_labels().await?;
        Ok(Some(found.into_series(tags)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResource {
    id: i32,
    title: String,
    #[serde(default)]
    tvdb_id: u32,
    status: Option<String>,
    next_airing: Option<DateTime<Utc>>,
    #[serde(default)]
    seasons: Vec<SeasonResource>,
    #[serde(default)]
    tags: Vec<i32>,
    statistics: Option<SeriesStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesStatistics {
    #[serde(default)]
    season_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeasonResource {
    season_number: u32,
    #[serde(default)]
    monitored: bool,
    statistics: Option<SeasonStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeasonStatistics {
    #[serde(default)]
    episode_file_count: u32,
    #[serde(default)]
    total_episode_count: u32,
    #[serde(default)]
    percent_of_episodes: f64,
}

#[derive(Debug, Deserialize)]
struct TagResource {
    id: i32,
    label: String,
}

impl SeriesResource {
    fn into_series(self, tags: &HashMap<i32, String>) -> Series {
        let season_count = self
            .statistics
            .map(|s| s.season_count)
            .filter(|c| *c > 0)
            .unwrap_or_else(|| self.seasons.iter().filter(|s| s.season_number > 0).count() as u32);
        let seasons = self
            .seasons
            .into_iter()
            .map(|s| {
                let stats = s.statistics.unwrap_or_default();
                Season {
                    season_number: s.season_number,
                    monitored: s.monitored,
                    episode_file_count: stats.episode_file_count,
                    total_episode_count: stats.total_episode_count,
                    percent_of_episodes: stats.percent_of_episodes,
                }
            })
            .collect();
        let tags = self
            .tags
            .iter()
            .filter_map(|id| tags.get(id).cloned())
            .collect();
        Series {
            id: self.id,
            title: self.title,
            tvdb_id: self.tvdb_id,
            status: SeriesStatus::parse(self.status.as_deref()),
            next_airing: self.next_airing,
            season_count,
            seasons,
            tags,
        }
    }
}
