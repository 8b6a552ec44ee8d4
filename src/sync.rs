use anyhow::Result;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::completion::{classify_season, classify_series, is_countable, CompletionStatus};
use crate::ids::extract_tvdb_id;
use crate::labels::{apply_plan, plan_status, plan_synced_tags, LabelPlan};
use crate::plex::{LabelTarget, PlexShow};
use crate::sonarr::Series;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub processed: usize,
    pub skipped: usize,
    pub labels_added: usize,
    pub labels_removed: usize,
}

impl SyncReport {
    fn record(&mut self, plan: &LabelPlan) {
        self.labels_added += plan.add.len();
        self.labels_removed += plan.remove.len();
    }
}

/// One pass over the Plex library: completion labels on every season and the
/// show, plus allow-listed Sonarr tags on the show.
pub async fn run_label_sync(state: &AppState, only_tvdb: Option<u32>) -> Result<SyncReport> {
    let library = &state.settings.plex.library;
    debug!("Using library {}", library);
    let shows = state.plex.fetch_shows(library).await?;
    let allow_list = state.settings.sonarr.tags_to_sync();
    let mut report = SyncReport::default();

    for show in &shows {
        let Some(tvdb_id) = extract_tvdb_id(&show.guids) else {
            warn!("No TVDB id found for '{}', skipping", show.title);
            report.skipped += 1;
            continue;
        };
        if only_tvdb.is_some_and(|id| id != tvdb_id) {
            continue;
        }

        let series = match state.sonarr.series_by_tvdb(tvdb_id).await {
            Ok(Some(series)) => series,
            Ok(None) => {
                warn!("{} not found on Sonarr", show.title);
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("{} could not be looked up on Sonarr: {:#}", show.title, e);
                report.skipped += 1;
                continue;
            }
        };

        info!("Processing {}", series.title);
        let show_labels = sync_completion(state, show, &series, &mut report).await?;
        sync_tags(state, show, &show_labels, &series, &allow_list, &mut report).await?;
        report.processed += 1;
    }

    info!(
        "Label sync finished: {} processed, {} skipped, {} labels added, {} removed",
        report.processed, report.skipped, report.labels_added, report.labels_removed
    );
    Ok(report)
}

/// Returns the show's labels after its status label has been reconciled.
async fn sync_completion(
    state: &AppState,
    show: &PlexShow,
    series: &Series,
    report: &mut SyncReport,
) -> Result<Vec<String>> {
    let plex_seasons = state.plex.fetch_seasons(show).await?;
    let countable: Vec<_> = series.seasons.iter().filter(|s| is_countable(s)).collect();
    debug!("Found {} seasons with episodes", countable.len());

    let mut statuses = Vec::with_capacity(countable.len());
    for season in countable {
        let status = classify_season(series, season);
        statuses.push(status);

        let Some(plex_season) = plex_seasons
            .iter()
            .find(|p| p.season_number == season.season_number)
        else {
            debug!(
                "Season {} of '{}' is not in Plex",
                season.season_number, show.title
            );
            continue;
        };
        let plan = plan_status(&plex_season.labels, status);
        apply_status(state, &plex_season.target(), &plex_season.labels, status, &plan, report)
            .await?;
    }

    let Some(status) = classify_series(&statuses) else {
        debug!("'{}' has no episodes to check against", show.title);
        return Ok(show.labels.clone());
    };
    let plan = plan_status(&show.labels, status);
    apply_status(state, &show.target(), &show.labels, status, &plan, report).await
}

async fn apply_status(
    state: &AppState,
    target: &LabelTarget,
    current: &[String],
    status: CompletionStatus,
    plan: &LabelPlan,
    report: &mut SyncReport,
) -> Result<Vec<String>> {
    info!("{} {} {}", status.icon(), status.label(), target.display);
    if plan.is_empty() {
        return Ok(current.to_vec());
    }
    debug!("Setting {} as \"{}\"", target.display, status.label());
    let after = apply_plan(state.plex.as_ref(), target, current, plan).await?;
    report.record(plan);
    Ok(after)
}

async fn sync_tags(
    state: &AppState,
    show: &PlexShow,
    current: &[String],
    series: &Series,
    allow_list: &[String],
    report: &mut SyncReport,
) -> Result<()> {
    if series.tags.is_empty() || allow_list.is_empty() {
        return Ok(());
    }
    let plan = plan_synced_tags(current, &series.tags, allow_list);
    for tag in &plan.add {
        info!("Added {} to {}", tag, series.title);
    }
    apply_plan(state.plex.as_ref(), &show.target(), current, &plan).await?;
    report.record(&plan);
    Ok(())
}
