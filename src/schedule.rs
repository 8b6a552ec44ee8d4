use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc, Weekday};

/// Weeks run Monday through Sunday.
pub const WEEK_START: Weekday = Weekday::Mon;

pub const UPCOMING_PREFIX: &str = "Upcoming";
pub const UPCOMING_LABEL: &str = "Upcoming";
pub const NEW_SEASON_LABEL: &str = "Upcoming_NewSeason";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirWindow {
    LaterToday,
    Tomorrow,
    Day(Weekday),
    NextWeek,
}

impl AirWindow {
    pub fn label(self) -> String {
        let suffix = match self {
            AirWindow::LaterToday => "LaterToday",
            AirWindow::Tomorrow => "Tomorrow",
            AirWindow::Day(day) => day_name(day),
            AirWindow::NextWeek => "NextWeek",
        };
        format!("{UPCOMING_PREFIX}_{suffix}")
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Last day of the current week. When today already is the last day the
/// following one is used, so day names always cover the days ahead.
pub fn end_of_week(today: NaiveDate) -> NaiveDate {
    let last = WEEK_START.pred().num_days_from_monday() as i64;
    let current = today.weekday().num_days_from_monday() as i64;
    let mut days_ahead = (last - current).rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    today + Duration::days(days_ahead)
}

/// `None` for dates in the past or beyond next week.
pub fn bucket(today: NaiveDate, air_date: NaiveDate) -> Option<AirWindow> {
    let tomorrow = today + Duration::days(1);
    let week_end = end_of_week(today);
    let next_week_end = week_end + Duration::days(7);

    if air_date == today {
        Some(AirWindow::LaterToday)
    } else if air_date == tomorrow {
        Some(AirWindow::Tomorrow)
    } else if air_date > tomorrow && air_date <= week_end {
        Some(AirWindow::Day(air_date.weekday()))
    } else if air_date > week_end && air_date <= next_week_end {
        Some(AirWindow::NextWeek)
    } else {
        None
    }
}

/// Sonarr reports air times in UTC; windows are judged on the local calendar.
pub fn local_air_date(next_airing: DateTime<Utc>) -> NaiveDate {
    next_airing.with_timezone(&Local).date_naive()
}
