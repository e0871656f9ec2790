pub mod config;
pub mod error;
pub mod events;
pub mod generate;
pub mod logging;
pub mod publish;

use chrono::{Local, NaiveDate};
use reqwest::Client;
use tracing::{error, info, warn};

use config::{AppConfig, CliArgs, Credentials, Tunables};
use error::BotError;
use events::fetch_events;
use generate::generate_post;
use publish::publish_post;

/// One-shot entry point: startup (logging, config, client, wall-clock
/// date), then a single pipeline run. `Ok(false)` means a stage aborted
/// the run; `Err` means the process never got to run at all.
pub async fn run(cli: CliArgs) -> Result<bool, BotError> {
    logging::init_logging()?;

    let AppConfig {
        credentials,
        tunables,
    } = cli.resolve()?;

    let client = Client::builder().user_agent("otdbot/0.1").build()?;

    let date = Local::now().date_naive();
    Ok(run_pipeline(&client, &credentials, &tunables, date).await)
}

/// Drives one run for an injected date: fetch, generate, publish, in
/// strict order. Any stage failure or empty event list logs and aborts.
pub async fn run_pipeline(
    client: &Client,
    credentials: &Credentials,
    tunables: &Tunables,
    date: NaiveDate,
) -> bool {
    info!(%date, "starting on-this-day run");

    let events = match fetch_events(client, tunables, date).await {
        Ok(events) => events,
        Err(err) => {
            error!(error = %err, "event fetch failed");
            return false;
        }
    };
    if events.is_empty() {
        warn!("no events fetched, aborting");
        return false;
    }

    let text = match generate_post(client, credentials, tunables, date, &events).await {
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "post generation failed");
            return false;
        }
    };

    match publish_post(client, credentials, tunables, &text).await {
        Ok(result) => {
            info!(url = %result.url, "run completed successfully");
            true
        }
        Err(err) => {
            error!(error = %err, "publish failed");
            false
        }
    }
}
