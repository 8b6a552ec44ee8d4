use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::PlexSettings;

#[async_trait]
pub trait PlexApi: Send + Sync {
    async fn fetch_shows(&self, library: &str) -> Result<Vec<PlexShow>>;
    async fn fetch_seasons(&self, show: &PlexShow) -> Result<Vec<PlexSeason>>;
    /// Replaces the item's labels with `labels`.
    async fn set_labels(&self, item: &LabelTarget, labels: &[String]) -> Result<()>;
    async fn remove_label(&self, item: &LabelTarget, label: &str) -> Result<()>;
}

/// Plex metadata type ids used by the label edit endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Show,
    Season,
}

impl ItemKind {
    fn type_id(self) -> u8 {
        match self {
            ItemKind::Show => 2,
            ItemKind::Season => 3,
        }
    }
}

/// Everything needed to edit the labels of one show or season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTarget {
    pub section_id: String,
    pub rating_key: String,
    pub kind: ItemKind,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlexShow {
    pub section_id: String,
    pub rating_key: String,
    pub title: String,
    pub guids: Vec<String>,
    pub labels: Vec<String>,
}

impl PlexShow {
    pub fn target(&self) -> LabelTarget {
        LabelTarget {
            section_id: self.section_id.clone(),
            rating_key: self.rating_key.clone(),
            kind: ItemKind::Show,
            display: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlexSeason {
    pub section_id: String,
    pub rating_key: String,
    pub season_number: u32,
    pub title: String,
    pub show_title: String,
    pub labels: Vec<String>,
}

impl PlexSeason {
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.show_title, self.title)
    }

    pub fn target(&self) -> LabelTarget {
        LabelTarget {
            section_id: self.section_id.clone(),
            rating_key: self.rating_key.clone(),
            kind: ItemKind::Season,
            display: self.display_title(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlexClient {
    client: Client,
    base_url: String,
}

impl PlexClient {
    pub fn new(settings: &PlexSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut token =
            HeaderValue::from_str(&settings.token).context("Plex token is not a valid header")?;
        token.set_sensitive(true);
        headers.insert("X-Plex-Token", token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(format!("labelarr/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("Failed to build Plex HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.url.clone(),
        })
    }

    async fn section_id(&self, library: &str) -> Result<String> {
        let url = format!("{}/library/sections", self.base_url);
        let data: Envelope<DirectoryContainer> = self.get_json(&url).await?;
        data.media_container
            .directory
            .into_iter()
            .find(|d| d.title.eq_ignore_ascii_case(library))
            .map(|d| d.key)
            .ok_or_else(|| anyhow!("Plex library '{}' not found", library))
    }

    async fn edit_labels(&self, item: &LabelTarget, edit: &str) -> Result<()> {
        let url = label_edit_url(&self.base_url, item, edit);
        debug!("Editing labels for '{}': {}", item.display, edit);
        let res = self
            .client
            .put(&url)
            .send()
            .await
            .context("Plex label request failed")?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Failed to edit labels for '{}'. Status: {} {}",
                item.display,
                status,
                text
            ));
        }
        Ok(())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("Plex request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading Plex body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        serde_json::from_str(&text).with_context(|| format!("Plex JSON parse failed for {url}"))
    }
}

#[async_trait]
impl PlexApi for PlexClient {
    async fn fetch_shows(&self, library: &str) -> Result<Vec<PlexShow>> {
        let section_id = self.section_id(library).await?;
        let url = format!(
            "{}/library/sections/{}/all?includeGuids=1",
            self.base_url, section_id
        );
        let data: Envelope<MetadataContainer> = self.get_json(&url).await?;
        let shows: Vec<PlexShow> = data
            .media_container
            .metadata
            .into_iter()
            .map(|m| m.into_show(&section_id))
            .collect();
        debug!("Fetched {} shows from library '{}'", shows.len(), library);
        Ok(shows)
    }

    async fn fetch_seasons(&self, show: &PlexShow) -> Result<Vec<PlexSeason>> {
        let url = format!(
            "{}/library/metadata/{}/children",
            self.base_url, show.rating_key
        );
        let data: Envelope<MetadataContainer> = self.get_json(&url).await?;
        Ok(data
            .media_container
            .metadata
            .into_iter()
            .filter_map(|m| m.into_season(show))
            .collect())
    }

    async fn set_labels(&self, item: &LabelTarget, labels: &[String]) -> Result<()> {
        self.edit_labels(item, &set_labels_edit(labels)).await
    }

    async fn remove_label(&self, item: &LabelTarget, label: &str) -> Result<()> {
        self.edit_labels(item, &remove_label_edit(label)).await
    }
}

fn label_edit_url(base_url: &str, item: &LabelTarget, edit: &str) -> String {
    format!(
        "{}/library/sections/{}/all?type={}&id={}&{}&label.locked=1",
        base_url,
        item.section_id,
        item.kind.type_id(),
        item.rating_key,
        edit
    )
}

/// Plex treats the indexed `label[i]` list as the item's complete label set.
fn set_labels_edit(labels: &[String]) -> String {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("label%5B{}%5D.tag.tag={}", i, urlencoding::encode(label)))
        .collect::<Vec<_>>()
        .join("&")
}

fn remove_label_edit(label: &str) -> String {
    format!("label%5B%5D.tag.tag-={}", urlencoding::encode(label))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct DirectoryContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<Directory>,
}

#[derive(Debug, Deserialize)]
struct Directory {
    key: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    rating_key: String,
    title: String,
    /// Legacy agent guid, e.g. `com.plexapp.agents.thetvdb://81189?lang=en`.
    guid: Option<String>,
    index: Option<u32>,
    parent_title: Option<String>,
    #[serde(rename = "Guid", default)]
    guids: Vec<GuidTag>,
    #[serde(rename = "Label", default)]
    labels: Vec<LabelTag>,
}

#[derive(Debug, Deserialize)]
struct GuidTag {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LabelTag {
    tag: String,
}

impl Metadata {
    fn into_show(self, section_id: &str) -> PlexShow {
        let guids = self
            .guids
            .into_iter()
            .map(|g| g.id)
            .chain(self.guid)
            .collect();
        PlexShow {
            section_id: section_id.to_string(),
            rating_key: self.rating_key,
            title: self.title,
            guids,
            labels: self.labels.into_iter().map(|l| l.tag).collect(),
        }
    }

    fn into_season(self, show: &PlexShow) -> Option<PlexSeason> {
        let season_number = self.index?;
        Some(PlexSeason {
            section_id: show.section_id.clone(),
            rating_key: self.rating_key,
            season_number,
            title: self.title,
            show_title: self.parent_title.unwrap_or_else(|| show.title.clone()),
            labels: self.labels.into_iter().map(|l| l.tag).collect(),
        })
    }
}
