//! Orchestration of one archive-update run.
//!
//! Diff the season's expected episodes against the archive once, then resolve
//! and download each missing episode in turn. Strictly sequential by design;
//! one stubborn episode must never stop the rest of the sweep.

use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::calendar::TournamentCalendar;
use crate::domain::missing_episodes;
use crate::error::EpisodeError;
use crate::library::MediaLibrary;
use crate::scraper::descriptor;
use crate::scraper::nhk::NhkSumoRepo;

/// Resolve and download everything the current season should have but the
/// archive does not.
///
/// `NoEpisode` failures are the normal "day not broadcast yet" case and only
/// get logged. Anything else (page structure drift, undecodable descriptors,
/// download failures) is also skipped, but counted; if any occurred the run
/// returns an error after the sweep so schedulers exit non-zero and someone
/// looks at the site.
pub async fn update_episodes(
    library: &MediaLibrary,
    nhk: &NhkSumoRepo,
    calendar: &TournamentCalendar,
    today: NaiveDate,
) -> Result<()> {
    let season_id = calendar.current_season_id(today);
    let expected = calendar.expected_episodes(season_id);
    let archived = library.list_archived();
    let missing = missing_episodes(&expected, &archived);

    if missing.is_empty() {
        tracing::info!("Season {} fully archived, nothing to do", season_id);
        return Ok(());
    }
    tracing::info!(
        "Season {}: {} of {} episodes not archived yet",
        season_id,
        missing.len(),
        expected.len()
    );

    let mut failures = 0u32;
    for episode in &missing {
        let tag = format!("s{:02}e{:02}", episode.season_id, episode.episode);

        let located = match nhk.locate(episode).await {
            Ok(located) => located,
            Err(EpisodeError::NoEpisode { reason }) => {
                tracing::info!("{}: not published yet ({})", tag, reason);
                continue;
            }
            Err(e) => {
                tracing::warn!("{}: {}", tag, e);
                failures += 1;
                continue;
            }
        };

        let film = match descriptor::decode(&located).await {
            Ok(film) => film,
            Err(e) => {
                tracing::error!("{}: {}", tag, e);
                failures += 1;
                continue;
            }
        };

        if let Err(e) = library.pull(&film).await {
            tracing::error!("{}: download failed: {:#}", tag, e);
            failures += 1;
            continue;
        }
        tracing::info!("{}: archived ({}, day {})", tag, film.season, film.episode);
    }

    if failures > 0 {
        bail!(
            "{} of {} missing episode(s) failed with unexpected errors; \
             the site format may have changed",
            failures,
            missing.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::Episode;
    use std::collections::HashSet;
    use std::fs;

    // The resolution half needs a live browser (covered by the ignored test in
    // scraper::nhk); what matters here is that a run attempts exactly the
    // episodes the diff produces, computed from a real directory tree.
    #[test]
    fn run_attempts_exactly_the_unarchived_episodes() {
        let tmp = tempfile::tempdir().unwrap();
        let season_dir = tmp.path().join("Grand Sumo (1926 - )").join("Season 03");
        fs::create_dir_all(&season_dir).unwrap();
        fs::write(season_dir.join("01.mkv"), b"").unwrap();

        let calendar = TournamentCalendar::default();
        let library = MediaLibrary::new(tmp.path().to_path_buf(), calendar.clone());

        let expected = calendar.expected_episodes(3);
        let missing = missing_episodes(&expected, &library.list_archived());

        let wanted: HashSet<Episode> = (2..=15).map(|day| Episode::new(3, day)).collect();
        assert_eq!(missing, wanted);
    }
}
