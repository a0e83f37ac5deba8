mod calendar;
mod domain;
mod error;
mod fetcher;
mod library;
mod scraper;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use clap::Parser;

use crate::calendar::TournamentCalendar;
use crate::library::MediaLibrary;
use crate::scraper::nhk::NhkSumoRepo;

/// Archives NHK World's Grand Sumo Highlights episodes as they are broadcast.
#[derive(Parser, Debug)]
#[command(name = "sumodl", version)]
struct Args {
    /// Base media directory the archive lives under
    #[arg(long, env = "MEDIA_DIRECTORY")]
    media_dir: PathBuf,

    /// Log filter, tracing env-filter syntax (e.g. "info" or "sumodl=debug")
    #[arg(long, default_value = "info")]
    log: String,

    /// Run the browser with a visible window instead of headless
    #[arg(long)]
    debug_browser: bool,

    /// Port chromedriver is started on
    #[arg(long, default_value_t = 9515)]
    driver_port: u16,

    /// Keep running and re-check once per day at --at
    #[arg(long)]
    watch: bool,

    /// Local time of day for --watch checks, HH:MM
    #[arg(long, default_value = "05:00")]
    at: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log))
        .init();

    let calendar = TournamentCalendar::default();
    let library = MediaLibrary::new(args.media_dir.clone(), calendar.clone());
    let nhk = NhkSumoRepo::new(calendar.clone(), args.driver_port, !args.debug_browser);

    if !args.watch {
        return fetcher::update_episodes(&library, &nhk, &calendar, Local::now().date_naive())
            .await;
    }

    let check_at = NaiveTime::parse_from_str(&args.at, "%H:%M")
        .with_context(|| format!("--at must be HH:MM, got {:?}", args.at))?;
    loop {
        if let Err(e) =
            fetcher::update_episodes(&library, &nhk, &calendar, Local::now().date_naive()).await
        {
            tracing::error!("Update run failed: {:#}", e);
        }

        let wait = duration_until_next(check_at);
        tracing::info!("Next check in {:?}", wait);
        tokio::time::sleep(wait).await;
    }
}

/// Time until the next occurrence of `at`: later today, or else tomorrow.
fn duration_until_next(at: NaiveTime) -> std::time::Duration {
    let now = Local::now().naive_local();
    let mut target = now.date().and_time(at);
    if target <= now {
        target += chrono::Duration::days(1);
    }
    (target - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(1))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn next_check_is_within_a_day() {
        let at = NaiveTime::parse_from_str("05:00", "%H:%M").unwrap();
        let wait = duration_until_next(at);

        assert!(wait > std::time::Duration::ZERO);
        assert!(wait <= std::time::Duration::from_secs(24 * 60 * 60));
    }
}
