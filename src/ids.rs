use once_cell::sync::Lazy;
use regex::Regex;

const TVDB_PREFIX: &str = "tvdb";
// Guids written by the legacy Plex TheTVDB agent.
const LEGACY_TVDB_AGENT: &str = "com.plexapp.agents.thetvdb://";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex is valid"));

/// Pulls the TVDB id out of a Plex item's guids (`tvdb://392256`).
/// `None` when no tvdb guid is present or it carries no digits.
pub fn extract_tvdb_id<S: AsRef<str>>(guids: &[S]) -> Option<u32> {
    let guid = guids.iter().map(|g| g.as_ref()).find(|g| is_tvdb_guid(g))?;
    DIGITS.find(guid)?.as_str().parse().ok()
}

pub fn tvdb_guid(id: u32) -> String {
    format!("{TVDB_PREFIX}://{id}")
}

fn is_tvdb_guid(guid: &str) -> bool {
    guid.starts_with(TVDB_PREFIX) || guid.starts_with(LEGACY_TVDB_AGENT)
}
