//! The on-disk episode archive.
//!
//! Layout the media server expects:
//! `<base>/Grand Sumo (1926 - )/Season NN/EE.mkv` with an `EE-thumb.jpg`
//! next to each episode. The directory tree itself is the record of what has
//! been downloaded; every run re-scans it instead of trusting a database.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::calendar::TournamentCalendar;
use crate::domain::{Episode, SumoFilm};
use crate::scraper::http_client;

const SHOW_DIR: &str = "Grand Sumo (1926 - )";
const MEDIA_EXTENSION: &str = "mkv";

pub struct MediaLibrary {
    base_path: PathBuf,
    calendar: TournamentCalendar,
}

impl MediaLibrary {
    pub fn new(base_path: PathBuf, calendar: TournamentCalendar) -> Self {
        MediaLibrary {
            base_path,
            calendar,
        }
    }

    /// Every episode already present on disk.
    ///
    /// A missing show directory means nothing has been archived yet, not an
    /// error. Files that are not episode media, and names that do not encode
    /// a season/episode number, are skipped.
    pub fn list_archived(&self) -> HashSet<Episode> {
        let show_dir = self.base_path.join(SHOW_DIR);
        if !show_dir.is_dir() {
            return HashSet::new();
        }

        WalkDir::new(&show_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| episode_from_path(entry.path()))
            .collect()
    }

    /// Idempotently download one resolved episode: thumbnail via HTTP, media
    /// via yt-dlp merged into a single mkv. Files already on disk are left
    /// alone, so re-running after a partial failure only fetches what's left.
    pub async fn pull(&self, film: &SumoFilm) -> Result<()> {
        let season_id = self
            .calendar
            .season_id_from_label(&film.season)
            .with_context(|| format!("cannot place season {:?} on disk", film.season))?;
        let season_dir = self
            .base_path
            .join(SHOW_DIR)
            .join(format!("Season {:02}", season_id));
        tokio::fs::create_dir_all(&season_dir)
            .await
            .with_context(|| format!("Failed to create {}", season_dir.display()))?;

        let thumbnail_path = season_dir.join(format!("{:02}-thumb.jpg", film.episode));
        if thumbnail_path.exists() {
            tracing::debug!("Thumbnail already present: {}", thumbnail_path.display());
        } else {
            let bytes = http_client()
                .get(&film.thumbnail_url)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await
                .with_context(|| format!("Failed to fetch thumbnail {}", film.thumbnail_url))?;
            tokio::fs::write(&thumbnail_path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", thumbnail_path.display()))?;
            tracing::info!("Saved thumbnail {}", thumbnail_path.display());
        }

        let episode_path = season_dir.join(format!("{:02}.{}", film.episode, MEDIA_EXTENSION));
        if episode_path.exists() {
            tracing::debug!("Episode already present: {}", episode_path.display());
            return Ok(());
        }

        tracing::info!("Downloading episode to {}", episode_path.display());
        let status = Command::new("yt-dlp")
            .arg("-f")
            .arg("bestvideo+bestaudio/best")
            .arg("--merge-output-format")
            .arg(MEDIA_EXTENSION)
            .arg("-o")
            .arg(&episode_path)
            .arg(&film.hd_video_url)
            .status()
            .await
            .context("Failed to run yt-dlp; is it installed?")?;

        if !status.success() {
            bail!(
                "yt-dlp exited with {} for episode {} of {}",
                status,
                film.episode,
                film.season
            );
        }
        Ok(())
    }
}

/// Episode identity encoded in an archived file's path, if any.
///
/// The season directory name ends in the season number ("Season 03"), the
/// filename starts with the episode number ("02.mkv").
fn episode_from_path(path: &Path) -> Option<Episode> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(MEDIA_EXTENSION) {
        return None;
    }

    let season_dir = path.parent()?.file_name()?.to_str()?;
    let season_id = trailing_number(season_dir)?;

    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    let episode: u32 = digits.parse().ok()?;

    if season_id < 1 || episode < 1 {
        return None;
    }
    Some(Episode::new(season_id, episode))
}

fn trailing_number(name: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+)\s*$").ok()?;
    re.captures(name)?.get(1)?.as_str().parse().ok()
}
