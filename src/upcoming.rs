use anyhow::Result;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::app::AppState;
use crate::ids::extract_tvdb_id;
use crate::labels::{apply_plan, plan_prefixed, LabelPlan};
use crate::schedule::{
    bucket, local_air_date, AirWindow, NEW_SEASON_LABEL, UPCOMING_LABEL, UPCOMING_PREFIX,
};
use crate::sonarr::Series;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingShow {
    pub title: String,
    pub tvdb_id: u32,
    pub air_date: NaiveDate,
    pub window: AirWindow,
    pub season_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpcomingReport {
    pub upcoming: usize,
    pub labels_added: usize,
    pub labels_removed: usize,
}

impl UpcomingReport {
    fn record(&mut self, plan: &LabelPlan) {
        self.labels_added += plan.add.len();
        self.labels_removed += plan.remove.len();
    }
}

/// Series airing within the labelled windows, grouped by local air date.
pub fn collect_upcoming(series: &[Series], today: NaiveDate) -> BTreeMap<NaiveDate, Vec<UpcomingShow>> {
    let mut upcoming: BTreeMap<NaiveDate, Vec<UpcomingShow>> = BTreeMap::new();
    for s in series {
        let Some(next_airing) = s.next_airing else {
            continue;
        };
        let air_date = local_air_date(next_airing);
        debug!("{} upcoming {}", s.title, next_airing);
        let Some(window) = bucket(today, air_date) else {
            continue;
        };
        let Some(season_number) = s.latest_season_number() else {
            continue;
        };
        upcoming.entry(air_date).or_default().push(UpcomingShow {
            title: s.title.clone(),
            tvdb_id: s.tvdb_id,
            air_date,
            window,
            season_number,
        });
    }
    upcoming
}

/// Labels shows airing soon and clears `Upcoming*` labels that no longer
/// apply, so a repeat run on the same day changes nothing.
pub async fn run_upcoming(
    state: &AppState,
    today: NaiveDate,
    only_tvdb: Option<u32>,
) -> Result<UpcomingReport> {
    let series = state.sonarr.all_series().await?;
    let upcoming = collect_upcoming(&series, today);

    // Earliest air date wins when a show shows up twice.
    let mut by_tvdb: HashMap<u32, &UpcomingShow> = HashMap::new();
    for (date, shows) in &upcoming {
        for show in shows {
            info!("{} {} airs {}", show.window.label(), show.title, date);
            by_tvdb.entry(show.tvdb_id).or_insert(show);
        }
    }

    let library = &state.settings.plex.library;
    debug!("Using library {}", library);
    let shows = state.plex.fetch_shows(library).await?;
    let mut report = UpcomingReport {
        upcoming: by_tvdb.len(),
        ..Default::default()
    };

    for show in &shows {
        let tvdb_id = extract_tvdb_id(&show.guids);
        if only_tvdb.is_some_and(|id| Some(id) != tvdb_id) {
            continue;
        }
        let entry = tvdb_id.and_then(|id| by_tvdb.get(&id).copied());
        let seasons = state.plex.fetch_seasons(show).await?;

        let airing_season = entry.and_then(|u| {
            seasons
                .iter()
                .find(|s| s.season_number == u.season_number)
                .map(|s| (s.season_number, u.window.label()))
        });
        let show_labels = match (entry, &airing_season) {
            (None, _) => vec![],
            (Some(_), Some(_)) => vec![UPCOMING_LABEL.to_string()],
            (Some(_), None) => vec![NEW_SEASON_LABEL.to_string()],
        };

        let plan = plan_prefixed(&show.labels, UPCOMING_PREFIX, &show_labels);
        log_plan(&show.title, &plan);
        apply_plan(state.plex.as_ref(), &show.target(), &show.labels, &plan).await?;
        report.record(&plan);

        for season in &seasons {
            let desired: Vec<String> = match &airing_season {
                Some((number, label)) if *number == season.season_number => vec![label.clone()],
                _ => vec![],
            };
            let plan = plan_prefixed(&season.labels, UPCOMING_PREFIX, &desired);
            log_plan(&season.display_title(), &plan);
            apply_plan(state.plex.as_ref(), &season.target(), &season.labels, &plan).await?;
            report.record(&plan);
        }
    }

    info!(
        "Upcoming labels finished: {} shows upcoming, {} labels added, {} removed",
        report.upcoming, report.labels_added, report.labels_removed
    );
    Ok(report)
}

fn log_plan(title: &str, plan: &LabelPlan) {
    for label in &plan.remove {
        info!("Removing label {} from {}", label, title);
    }
    for label in &plan.add {
        info!("Adding label {} to {}", label, title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sonarr::{Season, SeriesStatus};
    use chrono::{TimeZone, Utc};

    fn series(tvdb_id: u32, next_airing: Option<chrono::DateTime<Utc>>) -> Series {
        Series {
            id: tvdb_id as i32,
            title: format!("Show {tvdb_id}"),
            tvdb_id,
            status: SeriesStatus::Continuing,
            next_airing,
            season_count: 2,
            seasons: vec![
                Season {
                    season_number: 1,
                    monitored: true,
                    episode_file_count: 8,
                    total_episode_count: 8,
                    percent_of_episodes: 100.0,
                },
                Season {
                    season_number: 2,
                    monitored: true,
                    episode_file_count: 1,
                    total_episode_count: 8,
                    percent_of_episodes: 100.0,
                },
            ],
            tags: vec![],
        }
    }

    fn noon_local(date: NaiveDate) -> chrono::DateTime<Utc> {
        chrono::Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).expect("valid time"))
            .single()
            .expect("unambiguous local time")
            .with_timezone(&Utc)
    }

    #[test]
    fn groups_by_air_date_and_skips_far_future() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date");
        let tomorrow = today.succ_opt().expect("valid date");
        let all = vec![
            series(1, Some(noon_local(tomorrow))),
            series(2, Some(noon_local(today))),
            series(3, None),
            series(4, Some(noon_local(today + chrono::Duration::days(60)))),
            series(5, Some(noon_local(tomorrow))),
        ];
        let grouped = collect_upcoming(&all, today);
        let keys: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(keys, vec![today, tomorrow]);
        assert_eq!(grouped[&today][0].window, AirWindow::LaterToday);
        assert_eq!(grouped[&tomorrow].len(), 2);
        assert!(grouped[&tomorrow]
            .iter()
            .all(|u| u.window == AirWindow::Tomorrow && u.season_number == 2));
    }
}
