//! Tournament calendar arithmetic.
//!
//! Maps wall-clock time to the currently running tournament, a tournament to the
//! episode range it should contain, and a season id to/from the year+month the
//! NHK site and the archive use to address it. All cadence constants live in an
//! explicit [`TournamentCalendar`] value so tests can vary them freely.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};

use crate::domain::Episode;

/// Release-cadence configuration for the series.
///
/// The defaults describe Grand Sumo Highlights: six tournaments a year, fifteen
/// days each, counted from the May 2025 basho.
#[derive(Debug, Clone)]
pub struct TournamentCalendar {
    /// First day of the first tournament we model (season 1).
    pub starting_tournament: NaiveDate,
    pub tournaments_per_year: u32,
    pub episodes_per_season: u32,
    /// Length of one season cycle in days, used by the current-season heuristic.
    pub cycle_days: i64,
}

impl Default for TournamentCalendar {
    fn default() -> Self {
        TournamentCalendar {
            starting_tournament: NaiveDate::from_ymd_opt(2025, 5, 1)
                .expect("valid starting tournament date"),
            tournaments_per_year: 6,
            episodes_per_season: 15,
            cycle_days: 31,
        }
    }
}

impl TournamentCalendar {
    /// Which season is running right now.
    ///
    /// Whole `cycle_days` periods elapsed since the starting tournament, plus
    /// one. A coarse heuristic: real tournaments start on the first or second
    /// Sunday of every other month, not on a fixed 31-day cycle. Good enough to
    /// pick a season to probe, and isolated here so it can be corrected without
    /// touching the rest of the pipeline.
    pub fn current_season_id(&self, today: NaiveDate) -> u32 {
        let days = today
            .signed_duration_since(self.starting_tournament)
            .num_days();
        if days < 0 {
            return 1;
        }
        (days / self.cycle_days) as u32 + 1
    }

    /// Every episode the given season should eventually contain: days
    /// `1..=episodes_per_season`. No historical backlog, only the one season.
    pub fn expected_episodes(&self, season_id: u32) -> HashSet<Episode> {
        (1..=self.episodes_per_season)
            .map(|episode| Episode::new(season_id, episode))
            .collect()
    }

    /// The year and month the site files a season under.
    ///
    /// Steps one calendar month per season from the starting tournament,
    /// wrapping to the next year after `tournaments_per_year` seasons.
    fn season_year_month(&self, season_id: u32) -> (i32, u32) {
        let year = self.starting_tournament.year()
            + ((season_id - 1) / self.tournaments_per_year) as i32;
        let month = self.starting_tournament.month() + (season_id - 1) % self.tournaments_per_year;
        (year, month)
    }

    /// Path fragment of an episode page on the source site, relative to the
    /// tournament index: `"<year><month>/day<N>.html"`.
    pub fn episode_path(&self, episode: &Episode) -> String {
        let (year, month) = self.season_year_month(episode.season_id);
        format!("{}{:02}/day{}.html", year, month, episode.episode)
    }

    /// Season id for a decoded `"<year> - <month name>"` label.
    ///
    /// Exact algebraic inverse of [`season_year_month`], so an episode archived
    /// under this id is reconstructed with the id that was used to fetch it.
    ///
    /// [`season_year_month`]: TournamentCalendar::season_year_month
    pub fn season_id_from_label(&self, label: &str) -> Result<u32> {
        // chrono needs a full date, so pin the label to the first of the month.
        let first_of_month = NaiveDate::parse_from_str(&format!("{} 1", label), "%Y - %B %d")
            .with_context(|| format!("unparsable season label: {:?}", label))?;

        let epoch = self.starting_tournament;
        let months = (first_of_month.year() - epoch.year()) * self.tournaments_per_year as i32
            + first_of_month.month() as i32
            - epoch.month() as i32;
        if months < 0 {
            bail!("season label {:?} predates the starting tournament", label);
        }
        Ok(months as u32 + 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn season_id_is_always_positive() {
        let calendar = TournamentCalendar::default();

        // Well before the starting tournament.
        let ancient = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert_eq!(calendar.current_season_id(ancient), 1);

        let opening_day = calendar.starting_tournament;
        assert_eq!(calendar.current_season_id(opening_day), 1);
    }

    #[test]
    fn season_advances_after_one_cycle() {
        let calendar = TournamentCalendar::default();
        let later = calendar.starting_tournament + chrono::Days::new(31);
        assert_eq!(calendar.current_season_id(later), 2);

        let mid_third = calendar.starting_tournament + chrono::Days::new(70);
        assert_eq!(calendar.current_season_id(mid_third), 3);
    }

    #[test]
    fn expected_episodes_cover_the_whole_season() {
        let calendar = TournamentCalendar::default();
        let expected = calendar.expected_episodes(4);

        assert_eq!(expected.len(), 15);
        for episode in &expected {
            assert_eq!(episode.season_id, 4);
            assert!(episode.episode >= 1 && episode.episode <= 15);
        }
    }

    #[test]
    fn episode_path_matches_site_layout() {
        let calendar = TournamentCalendar::default();

        assert_eq!(
            calendar.episode_path(&Episode::new(1, 1)),
            "202505/day1.html"
        );
        assert_eq!(
            calendar.episode_path(&Episode::new(2, 13)),
            "202506/day13.html"
        );
        // Seventh season wraps into the next year.
        assert_eq!(
            calendar.episode_path(&Episode::new(7, 1)),
            "202605/day1.html"
        );
    }

    #[test]
    fn label_round_trips_for_every_season() {
        let calendar = TournamentCalendar::default();

        for season_id in 1..=24 {
            let (year, month) = calendar.season_year_month(season_id);
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .unwrap()
                .format("%Y - %B")
                .to_string();
            assert_eq!(
                calendar.season_id_from_label(&label).unwrap(),
                season_id,
                "label {:?} did not round-trip",
                label
            );
        }
    }

    #[test]
    fn label_parsing() {
        let calendar = TournamentCalendar::default();

        assert_eq!(calendar.season_id_from_label("2025 - May").unwrap(), 1);
        assert_eq!(calendar.season_id_from_label("2025 - July").unwrap(), 3);

        assert!(calendar.season_id_from_label("May 2025").is_err());
        assert!(calendar.season_id_from_label("2025 - Maybe").is_err());
        // Before the first modeled tournament.
        assert!(calendar.season_id_from_label("2024 - May").is_err());
    }
}
