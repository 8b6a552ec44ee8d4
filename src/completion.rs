use tracing::debug;

use crate::sonarr::{Season, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Complete,
    Incomplete,
    InProgress,
}

impl CompletionStatus {
    pub const ALL: [CompletionStatus; 3] = [
        CompletionStatus::Complete,
        CompletionStatus::Incomplete,
        CompletionStatus::InProgress,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CompletionStatus::Complete => "Complete",
            CompletionStatus::Incomplete => "Incomplete",
            CompletionStatus::InProgress => "InProgress",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            CompletionStatus::Complete => "🟢",
            CompletionStatus::Incomplete => "🔴",
            CompletionStatus::InProgress => "🔵",
        }
    }
}

/// Sonarr reports 100% for unmonitored seasons regardless of what is on
/// disk, so those are recomputed from the file count.
pub fn effective_percent(season: &Season) -> f64 {
    if season.monitored {
        return season.percent_of_episodes;
    }
    if season.total_episode_count == 0 {
        return 0.0;
    }
    let percent =
        season.episode_file_count as f64 / season.total_episode_count as f64 * 100.0;
    debug!(
        "Season {} not monitored, using {:.1}% instead of {:.1}%",
        season.season_number, percent, season.percent_of_episodes
    );
    percent
}

/// Season numbering can have gaps (8 jumps to 11) which leaves `season_count`
/// below the highest number, hence `>=`.
pub fn is_latest_season(season_number: u32, season_count: u32) -> bool {
    season_number >= season_count
}

/// Specials and seasons without any episodes say nothing about completeness.
pub fn is_countable(season: &Season) -> bool {
    season.season_number > 0 && season.total_episode_count > 0
}

pub fn classify_season(series: &Series, season: &Season) -> CompletionStatus {
    if effective_percent(season) < 100.0 {
        return CompletionStatus::Incomplete;
    }
    // 100% of the aired episodes, but the season may still be airing.
    if series.status.is_airing() && is_latest_season(season.season_number, series.season_count) {
        return CompletionStatus::InProgress;
    }
    CompletionStatus::Complete
}

/// `None` when no season could be classified.
pub fn classify_series(statuses: &[CompletionStatus]) -> Option<CompletionStatus> {
    if statuses.is_empty() {
        return None;
    }
    if statuses.contains(&CompletionStatus::Incomplete) {
        Some(CompletionStatus::Incomplete)
    } else if statuses.contains(&CompletionStatus::InProgress) {
        Some(CompletionStatus::InProgress)
    } else {
        Some(CompletionStatus::Complete)
    }
}
