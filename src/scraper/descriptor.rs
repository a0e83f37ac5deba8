//! Media descriptor decoding.
//!
//! The descriptor endpoint returns JSON whose textual fields are not entirely
//! consistent: the episode title carries the day number in two different
//! shapes, and the tournament itself is never named directly. The decoder
//! normalizes all of that into a [`SumoFilm`], deriving the tournament start
//! (and with it the season label) from the publication date and day number, so
//! the label is correct no matter which day's page was fetched.

use chrono::{Datelike, Days, NaiveDateTime};
use serde::Deserialize;

use crate::domain::SumoFilm;
use crate::error::EpisodeError;
use crate::scraper::http_client;
use crate::scraper::nhk::LocatedMedia;

const PUBLICATION_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct MediaDescriptor {
    meta: Vec<MetaEntry>,
}

#[derive(Debug, Deserialize)]
struct MetaEntry {
    title: String,
    publication_date: String,
    movie_url: MovieUrls,
}

#[derive(Debug, Deserialize)]
struct MovieUrls {
    mb_hd: String,
}

/// Fetch the media descriptor and normalize it into a film record.
pub async fn decode(located: &LocatedMedia) -> Result<SumoFilm, EpisodeError> {
    let body = http_client()
        .get(&located.descriptor_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    decode_descriptor(&body, &located.thumbnail_url)
}

/// Pure decoding core over the fetched descriptor body.
fn decode_descriptor(body: &str, thumbnail_url: &str) -> Result<SumoFilm, EpisodeError> {
    let descriptor: MediaDescriptor =
        serde_json::from_str(body).map_err(|e| EpisodeError::decode("meta", e))?;
    let entry = descriptor
        .meta
        .into_iter()
        .next()
        .ok_or_else(|| EpisodeError::decode("meta", "empty meta array"))?;

    let day = parse_day(&entry.title)?;

    let published = NaiveDateTime::parse_from_str(&entry.publication_date, PUBLICATION_DATE_FORMAT)
        .map_err(|e| EpisodeError::decode("publication_date", e))?;

    // Each day airs one day after the previous, so day N's publication date
    // walks back to the tournament's first day. The site's own day count is
    // ground truth for the season label, not whichever page we asked for.
    let tournament_start = published
        .date()
        .checked_sub_days(Days::new(u64::from(day - 1)))
        .ok_or_else(|| EpisodeError::decode("publication_date", "date underflow"))?;

    Ok(SumoFilm {
        season: format!(
            "{} - {}",
            tournament_start.year(),
            tournament_start.format("%B")
        ),
        episode: day,
        hd_video_url: entry.movie_url.mb_hd,
        thumbnail_url: thumbnail_url.to_string(),
    })
}

/// Day-of-tournament number out of the descriptor title.
///
/// Two shapes exist in the wild: `"Day 1 <winner>"` on the first day and
/// `"Day 2: <headline>"` on every other day. Try the space-delimited form
/// first, fall back to the colon-delimited one.
fn parse_day(title: &str) -> Result<u32, EpisodeError> {
    let (_, rest) = title
        .split_once("Day")
        .ok_or_else(|| EpisodeError::decode("title", format!("no \"Day\" in {:?}", title)))?;
    let rest = rest.trim();

    let day: u32 = match rest.split_whitespace().next().and_then(|t| t.parse().ok()) {
        Some(day) => day,
        None => rest
            .split(':')
            .next()
            .and_then(|t| t.trim().parse().ok())
            .ok_or_else(|| {
                EpisodeError::decode("title", format!("no day number in {:?}", title))
            })?,
    };
    if day == 0 {
        return Err(EpisodeError::decode("title", "day number must be >= 1"));
    }
    Ok(day)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::EpisodeError;

    #[test]
    fn parses_the_first_day_title_format() {
        assert_eq!(
            parse_day("GRAND SUMO Highlights - Day 1 Onosato Wins").unwrap(),
            1
        );
    }

    #[test]
    fn parses_the_colon_title_format() {
        assert_eq!(
            parse_day("GRAND SUMO Highlights - Day 2: Upsets in Tokyo").unwrap(),
            2
        );
        assert_eq!(parse_day("Day 15: The Final Bout").unwrap(), 15);
    }

    #[test]
    fn rejects_titles_without_a_day() {
        assert!(matches!(
            parse_day("GRAND SUMO Highlights - Digest"),
            Err(EpisodeError::Decode { field: "title", .. })
        ));
        assert!(matches!(
            parse_day("Day of Reckoning"),
            Err(EpisodeError::Decode { field: "title", .. })
        ));
    }

    fn descriptor(title: &str, publication_date: &str) -> String {
        format!(
            r#"{{"meta":[{{"title":"{}","publication_date":"{}","movie_url":{{"mb_hd":"https://stream.example/hd.m3u8"}}}}]}}"#,
            title, publication_date
        )
    }

    #[test]
    fn derives_tournament_start_from_day_and_publication_date() {
        let body = descriptor(
            "GRAND SUMO Highlights - Day 12: Leaders Collide",
            "2025/05/12 01:30:00",
        );
        let film = decode_descriptor(&body, "https://cache.example/thumb.jpg").unwrap();

        assert_eq!(film.season, "2025 - May");
        assert_eq!(film.episode, 12);
        assert_eq!(film.hd_video_url, "https://stream.example/hd.m3u8");
        assert_eq!(film.thumbnail_url, "https://cache.example/thumb.jpg");
    }

    #[test]
    fn tournament_start_can_fall_in_the_previous_month() {
        // Published July 2nd as day 5: the tournament started June 28th.
        let body = descriptor("Day 5: Midway", "2025/07/02 01:30:00");
        let film = decode_descriptor(&body, "https://cache.example/t.jpg").unwrap();
        assert_eq!(film.season, "2025 - June");
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            decode_descriptor("not json at all", "https://t.example/x.jpg"),
            Err(EpisodeError::Decode { field: "meta", .. })
        ));
        assert!(matches!(
            decode_descriptor(r#"{"meta":[]}"#, "https://t.example/x.jpg"),
            Err(EpisodeError::Decode { field: "meta", .. })
        ));
    }

    #[test]
    fn unparsable_publication_date_is_a_decode_error() {
        let body = descriptor("Day 3: Something", "May 12th 2025");
        assert!(matches!(
            decode_descriptor(&body, "https://t.example/x.jpg"),
            Err(EpisodeError::Decode {
                field: "publication_date",
                ..
            })
        ));
    }
}
