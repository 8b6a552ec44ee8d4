use anyhow::Result;
use chrono::Local;
use labelarr::app::{bootstrap, parse_target_id};
use labelarr::upcoming::run_upcoming;
use std::env;
use tracing::info;

const LOG_FILE: &str = "upcoming_shows.log";

#[tokio::main]
async fn main() -> Result<()> {
    let state = bootstrap(LOG_FILE)?;
    let target = parse_target_id(env::args().skip(1))?;
    let today = Local::now().date_naive();
    run_upcoming(&state, today, target).await?;
    info!("Done");
    Ok(())
}
