pub mod app;
pub mod completion;
pub mod config;
pub mod ids;
pub mod labels;
pub mod logging;
pub mod plex;
pub mod schedule;
pub mod sonarr;
pub mod sync;
#[cfg(test)]
mod testing;
pub mod upcoming;
