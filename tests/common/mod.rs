#![allow(dead_code)]

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use labelarr::app::AppState;
use labelarr::config::{PlexSettings, Settings, SonarrSettings};
use labelarr::plex::{LabelTarget, PlexApi, PlexSeason, PlexShow};
use labelarr::sonarr::{Season, Series, SeriesStatus, SonarrApi};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SECTION: &str = "2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Set(String, Vec<String>),
    Remove(String, String),
}

#[derive(Default)]
pub struct FakePlex {
    pub shows: Mutex<Vec<PlexShow>>,
    pub seasons: Mutex<HashMap<String, Vec<PlexSeason>>>,
    pub edits: Mutex<Vec<Edit>>,
}

impl FakePlex {
    pub fn with_show(self, show: PlexShow, seasons: Vec<PlexSeason>) -> Self {
        self.seasons
            .lock()
            .unwrap()
            .insert(show.rating_key.clone(), seasons);
        self.shows.lock().unwrap().push(show);
        self
    }

    pub fn labels_of(&self, rating_key: &str) -> Vec<String> {
        if let Some(show) = self
            .shows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.rating_key == rating_key)
        {
            return show.labels.clone();
        }
        self.seasons
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|s| s.rating_key == rating_key)
            .map(|s| s.labels.clone())
            .unwrap_or_default()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.lock().unwrap().len()
    }

    fn mutate_labels(&self, rating_key: &str, f: impl Fn(&mut Vec<String>)) {
        for show in self.shows.lock().unwrap().iter_mut() {
            if show.rating_key == rating_key {
                f(&mut show.labels);
            }
        }
        for season in self.seasons.lock().unwrap().values_mut().flatten() {
            if season.rating_key == rating_key {
                f(&mut season.labels);
            }
        }
    }
}

#[async_trait::async_trait]
impl PlexApi for FakePlex {
    async fn fetch_shows(&self, library: &str) -> anyhow::Result<Vec<PlexShow>> {
        assert_eq!(library, "TV Shows");
        Ok(self.shows.lock().unwrap().clone())
    }

    async fn fetch_seasons(&self, show: &PlexShow) -> anyhow::Result<Vec<PlexSeason>> {
        Ok(self
            .seasons
            .lock()
            .unwrap()
            .get(&show.rating_key)
            .cloned()
            .unwrap_or_default())
    }

    // Like Plex, a set replaces the whole label list.
    async fn set_labels(&self, item: &LabelTarget, new_labels: &[String]) -> anyhow::Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push(Edit::Set(item.rating_key.clone(), new_labels.to_vec()));
        self.mutate_labels(&item.rating_key, |labels| *labels = new_labels.to_vec());
        Ok(())
    }

    async fn remove_label(&self, item: &LabelTarget, label: &str) -> anyhow::Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push(Edit::Remove(item.rating_key.clone(), label.to_string()));
        self.mutate_labels(&item.rating_key, |labels| labels.retain(|l| l != label));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSonarr {
    pub series: Vec<Series>,
    pub failing_tvdb: Vec<u32>,
}

#[async_trait::async_trait]
impl SonarrApi for FakeSonarr {
    async fn all_series(&self) -> anyhow::Result<Vec<Series>> {
        Ok(self.series.clone())
    }

    async fn series_by_tvdb(&self, tvdb_id: u32) -> anyhow::Result<Option<Series>> {
        if self.failing_tvdb.contains(&tvdb_id) {
            anyhow::bail!("Sonarr returned 500 for tvdb {}", tvdb_id);
        }
        Ok(self.series.iter().find(|s| s.tvdb_id == tvdb_id).cloned())
    }
}

pub fn settings(tags: &str) -> Settings {
    Settings {
        plex: PlexSettings {
            url: "http://plex.test:32400".to_string(),
            token: "plex-token".to_string(),
            library: "TV Shows".to_string(),
        },
        sonarr: SonarrSettings {
            url: "http://sonarr.test:8989".to_string(),
            apikey: "sonarr-key".to_string(),
            tags_to_sync_to_plex: tags.to_string(),
        },
    }
}

pub fn app_with_fakes(plex: FakePlex, sonarr: FakeSonarr, tags: &str) -> (AppState, Arc<FakePlex>) {
    let plex = Arc::new(plex);
    let state = AppState {
        plex: plex.clone(),
        sonarr: Arc::new(sonarr),
        settings: Arc::new(settings(tags)),
    };
    (state, plex)
}

pub fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn plex_show(rating_key: &str, title: &str, tvdb_id: Option<u32>, current: &[&str]) -> PlexShow {
    let mut guids = vec!["imdb://tt0000001".to_string()];
    if let Some(id) = tvdb_id {
        guids.push(format!("tvdb://{id}"));
    }
    PlexShow {
        section_id: SECTION.to_string(),
        rating_key: rating_key.to_string(),
        title: title.to_string(),
        guids,
        labels: labels(current),
    }
}

pub fn plex_season(rating_key: &str, show_title: &str, number: u32, current: &[&str]) -> PlexSeason {
    PlexSeason {
        section_id: SECTION.to_string(),
        rating_key: rating_key.to_string(),
        season_number: number,
        title: format!("Season {number}"),
        show_title: show_title.to_string(),
        labels: labels(current),
    }
}

pub fn season(number: u32, monitored: bool, files: u32, total: u32, percent: f64) -> Season {
    Season {
        season_number: number,
        monitored,
        episode_file_count: files,
        total_episode_count: total,
        percent_of_episodes: percent,
    }
}

pub fn series(tvdb_id: u32, title: &str, status: SeriesStatus, seasons: Vec<Season>) -> Series {
    let season_count = seasons.iter().filter(|s| s.season_number > 0).count() as u32;
    Series {
        id: tvdb_id as i32,
        title: title.to_string(),
        tvdb_id,
        status,
        next_airing: None,
        season_count,
        seasons,
        tags: vec![],
    }
}

pub fn noon_local(date: NaiveDate) -> DateTime<Utc> {
    Local
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).expect("valid time"))
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}
