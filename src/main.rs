use anyhow::Result;
use labelarr::app::{bootstrap, parse_target_id};
use labelarr::sync::run_label_sync;
use std::env;
use tracing::info;

const LOG_FILE: &str = "log.txt";

#[tokio::main]
async fn main() -> Result<()> {
    let state = bootstrap(LOG_FILE)?;
    let target = parse_target_id(env::args().skip(1))?;
    run_label_sync(&state, target).await?;
    info!("Done");
    Ok(())
}
