mod cli;

use crate::cli::{Command, Options};
use battlerite_api::BattleriteApi;
use log::{debug, error};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const API_KEY_VAR: &str = "BATTLERITE_API_KEY";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(options) = cli::parse_args(std::env::args().skip(1)) else {
        return Ok(());
    };

    better_panic::install();
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let api_key = std::env::var(API_KEY_VAR).unwrap_or_default();
    let api = BattleriteApi::new(api_key)?;

    if let Err(e) = run(&api, options).await {
        error!("{e}");
        return Err(e);
    }
    Ok(())
}

async fn run(api: &BattleriteApi, options: Options) -> anyhow::Result<()> {
    match options.command {
        Command::Matches { full } => {
            let query = options.match_query();
            debug!("fetching matches with {query:?}");
            let matches = if full {
                api.get_full_matches(&query).await?
            } else {
                api.get_matches(&query).await?
            };
            print_json(&matches)
        }
        Command::Match { id } => print_json(&api.get_match(&id).await?),
        Command::Player { id } => print_json(&api.get_player(&id).await?),
        Command::Telemetry { reference } => print_json(&api.get_telemetry(&reference).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
