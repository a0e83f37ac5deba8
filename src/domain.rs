//! Core value types shared across the pipeline.
//!
//! An `Episode` identifies one broadcast day within one tournament; a `SumoFilm`
//! is the fully resolved record the downloader consumes. Both are plain values,
//! built fresh each run and never mutated.

use std::collections::HashSet;

/// Identity of a single broadcast: which tournament, which day.
///
/// Used as a set member on both sides of the expected-vs-archived diff, so
/// equality and hashing are by value. Both fields are always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Episode {
    pub season_id: u32,
    pub episode: u32,
}

impl Episode {
    pub fn new(season_id: u32, episode: u32) -> Self {
        debug_assert!(season_id >= 1 && episode >= 1);
        Episode { season_id, episode }
    }
}

/// A fully resolved episode, ready to hand to the downloader.
///
/// `season` is the human-readable "<year> - <month name>" label derived from the
/// descriptor's own publication date; it parses back to the same season id the
/// calendar used to request the episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumoFilm {
    pub season: String,
    pub episode: u32,
    pub hd_video_url: String,
    pub thumbnail_url: String,
}

/// Episodes we expect to exist but have not archived yet.
///
/// Pure set difference; iteration order of the result is unspecified.
pub fn missing_episodes(
    expected: &HashSet<Episode>,
    archived: &HashSet<Episode>,
) -> HashSet<Episode> {
    expected.difference(archived).copied().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn season(season_id: u32, episodes: impl IntoIterator<Item = u32>) -> HashSet<Episode> {
        episodes
            .into_iter()
            .map(|e| Episode::new(season_id, e))
            .collect()
    }

    #[test]
    fn missing_is_set_subtraction() {
        let expected = season(3, 1..=15);
        let archived = season(3, [1]);

        let missing = missing_episodes(&expected, &archived);

        assert_eq!(missing.len(), 14);
        assert!(!missing.contains(&Episode::new(3, 1)));
        for day in 2..=15 {
            assert!(missing.contains(&Episode::new(3, day)));
        }
    }

    #[test]
    fn nothing_missing_when_everything_archived() {
        let expected = season(1, 1..=15);
        assert!(missing_episodes(&expected, &expected).is_empty());
    }

    #[test]
    fn everything_missing_when_archive_empty() {
        let expected = season(2, 1..=15);
        let missing = missing_episodes(&expected, &HashSet::new());
        assert_eq!(missing, expected);
    }

    #[test]
    fn other_seasons_in_archive_do_not_count() {
        let expected = season(4, 1..=3);
        let archived = season(3, 1..=15);
        assert_eq!(missing_episodes(&expected, &archived), expected);
    }
}
