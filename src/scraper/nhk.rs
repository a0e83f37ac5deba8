//! Media resolution against the NHK World sumo tournament pages.
//!
//! The pages never expose the real media location in static markup; the
//! embedded player requests it itself after the page renders. So each lookup
//! drives one WebDriver session through the page, finds the player frame,
//! re-navigates to the frame's own URL, and reads the request URLs that
//! navigation generated out of the browser's performance resource timeline.
//! Extraction by observation, not a documented API, so every step is bounded
//! and defensive.

use thirtyfour::prelude::*;
use tokio::time::{Duration, Instant, sleep};

use crate::calendar::TournamentCalendar;
use crate::domain::Episode;
use crate::error::{EpisodeError, MissingSection};
use crate::scraper::raii_process_driver::DriverProcess;

const BASE_URL: &str = "https://www3.nhk.or.jp/nhkworld/en/tv/sumo/tournament";

/// The player's iframe carries this token in its `name` attribute.
const PLAYER_FRAME_NAME: &str = "moviePlayer";
/// The request the player issues for its media descriptor.
const MEDIA_REQUEST_MARKER: &str = "getMediaByParam";
/// NHK World's consent interstitial accept button.
const CONSENT_BUTTON: &str = "#onetrust-accept-btn-handler";

const DRIVER_STARTUP_DELAY: Duration = Duration::from_secs(1);
const PAGE_SETTLE_TIMEOUT: Duration = Duration::from_secs(20);
const CONSENT_TIMEOUT: Duration = Duration::from_secs(5);
const FRAME_TIMEOUT: Duration = Duration::from_secs(15);
const NETWORK_DEADLINE: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Consecutive polls with no new requests before the page counts as quiet.
const QUIET_POLLS: u32 = 3;
/// Upper bound on captured request URLs per observation window.
const NETWORK_LOG_CAP: usize = 512;

/// The two URLs recovered from one rendered episode page.
#[derive(Debug, Clone)]
pub struct LocatedMedia {
    pub descriptor_url: String,
    pub thumbnail_url: String,
}

/// Request URLs captured during one scoped observation window.
///
/// A bounded snapshot taken after the navigation quiesced; arrival order is
/// preserved but nothing beyond that is guaranteed.
#[derive(Debug)]
struct NetworkLog {
    requests: Vec<String>,
}

impl NetworkLog {
    fn media_descriptor_url(&self) -> Result<&str, EpisodeError> {
        self.requests
            .iter()
            .find(|url| url.contains(MEDIA_REQUEST_MARKER))
            .map(String::as_str)
            .ok_or(EpisodeError::BadEpisodeData(MissingSection::MediaRequest))
    }

    fn thumbnail_url(&self) -> Result<&str, EpisodeError> {
        self.requests
            .iter()
            .find(|url| url.contains("thumbnail") && url.contains(".jpg"))
            .map(String::as_str)
            .ok_or(EpisodeError::BadEpisodeData(MissingSection::Thumbnail))
    }
}

/// Among the page's iframes, the src of the one named like the player.
fn select_player_frame(frames: &[(Option<String>, Option<String>)]) -> Option<String> {
    frames
        .iter()
        .find(|(name, _)| {
            name.as_deref()
                .is_some_and(|n| n.contains(PLAYER_FRAME_NAME))
        })
        .and_then(|(_, src)| src.clone())
}

pub struct NhkSumoRepo {
    calendar: TournamentCalendar,
    webdriver_port: u16,
    headless: bool,
}

impl NhkSumoRepo {
    pub fn new(calendar: TournamentCalendar, webdriver_port: u16, headless: bool) -> Self {
        NhkSumoRepo {
            calendar,
            webdriver_port,
            headless,
        }
    }

    /// Resolve the hidden media-descriptor and thumbnail URLs for one episode.
    ///
    /// Opens exactly one browser session and quits it on every exit path.
    /// `NoEpisode` means the page never came up (usually: not published yet);
    /// `BadEpisodeData` means it rendered without an expected piece.
    pub async fn locate(&self, episode: &Episode) -> Result<LocatedMedia, EpisodeError> {
        let url = format!("{}/{}", BASE_URL, self.calendar.episode_path(episode));
        tracing::debug!("Locating media for {:?} at {}", episode, url);

        // Driver process dies on drop, even if the session below misbehaves.
        let driver_process = DriverProcess::new("chromedriver", self.webdriver_port)
            .map_err(EpisodeError::no_episode)?;
        sleep(DRIVER_STARTUP_DELAY).await;

        let mut caps = DesiredCapabilities::chrome();
        if self.headless {
            caps.set_headless().map_err(EpisodeError::no_episode)?;
        }
        let driver = WebDriver::new(&format!("http://localhost:{}", driver_process.port()), caps)
            .await
            .map_err(EpisodeError::no_episode)?;

        // All session-scoped work happens in sniff_page; the session is quit
        // here, once, before any result or error propagates.
        let located = sniff_page(&driver, &url).await;
        if let Err(e) = driver.quit().await {
            tracing::warn!("Failed to quit WebDriver session: {:?}", e);
        }
        located
    }
}

async fn sniff_page(driver: &WebDriver, url: &str) -> Result<LocatedMedia, EpisodeError> {
    driver.goto(url).await.map_err(EpisodeError::no_episode)?;
    wait_for_page_settle(driver).await?;
    dismiss_consent(driver).await;

    let frame_url = wait_for_player_frame(driver).await?;
    tracing::debug!("Player frame found at {}", frame_url);

    let log = observe_navigation(driver, &frame_url).await?;
    tracing::debug!("Observed {} requests from player frame", log.requests.len());

    let descriptor_url = log.media_descriptor_url()?.to_string();
    let thumbnail_url = log.thumbnail_url()?.to_string();
    Ok(LocatedMedia {
        descriptor_url,
        thumbnail_url,
    })
}

/// Bounded wait for `document.readyState == "complete"`.
async fn wait_for_page_settle(driver: &WebDriver) -> Result<(), EpisodeError> {
    let deadline = Instant::now() + PAGE_SETTLE_TIMEOUT;
    loop {
        let ret = driver
            .execute("return document.readyState;", vec![])
            .await
            .map_err(EpisodeError::no_episode)?;
        let state: String = ret.convert().map_err(EpisodeError::no_episode)?;
        if state == "complete" {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(EpisodeError::no_episode("page never finished loading"));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Best-effort dismissal of the consent interstitial. Its absence is normal.
async fn dismiss_consent(driver: &WebDriver) {
    let deadline = Instant::now() + CONSENT_TIMEOUT;
    while Instant::now() < deadline {
        if let Ok(button) = driver.find(By::Css(CONSENT_BUTTON)).await {
            if button.click().await.is_ok() {
                tracing::debug!("Dismissed consent interstitial");
            }
            return;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Bounded wait for an iframe named like the player; returns its src URL.
async fn wait_for_player_frame(driver: &WebDriver) -> Result<String, EpisodeError> {
    let deadline = Instant::now() + FRAME_TIMEOUT;
    loop {
        let elements = driver
            .find_all(By::Tag("iframe"))
            .await
            .unwrap_or_default();

        let mut frames = Vec::with_capacity(elements.len());
        for element in &elements {
            let name = element.attr("name").await.ok().flatten();
            let src = element.attr("src").await.ok().flatten();
            frames.push((name, src));
        }
        if let Some(src) = select_player_frame(&frames) {
            return Ok(src);
        }

        if Instant::now() >= deadline {
            return Err(EpisodeError::BadEpisodeData(MissingSection::PlayerFrame));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Navigate to the frame's own URL and capture the requests that navigation
/// generates, as a bounded snapshot taken once network activity quiesces.
async fn observe_navigation(driver: &WebDriver, frame_url: &str) -> Result<NetworkLog, EpisodeError> {
    driver
        .goto(frame_url)
        .await
        .map_err(EpisodeError::no_episode)?;

    let deadline = Instant::now() + NETWORK_DEADLINE;
    let mut last_count: u64 = 0;
    let mut quiet_polls = 0;
    while Instant::now() < deadline {
        sleep(POLL_INTERVAL).await;
        let ret = driver
            .execute(
                "return window.performance.getEntriesByType('resource').length;",
                vec![],
            )
            .await
            .map_err(EpisodeError::no_episode)?;
        let count: u64 = ret.convert().map_err(EpisodeError::no_episode)?;

        if count == last_count {
            quiet_polls += 1;
            if quiet_polls >= QUIET_POLLS {
                break;
            }
        } else {
            last_count = count;
            quiet_polls = 0;
        }
    }

    let ret = driver
        .execute(
            "return window.performance.getEntriesByType('resource')\
             .slice(0, arguments[0])\
             .map(function (entry) { return entry.name; });",
            vec![serde_json::json!(NETWORK_LOG_CAP)],
        )
        .await
        .map_err(EpisodeError::no_episode)?;
    let requests: Vec<String> = ret.convert().map_err(EpisodeError::no_episode)?;

    Ok(NetworkLog { requests })
}
