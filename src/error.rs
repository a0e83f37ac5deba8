//! Failure taxonomy for episode resolution.
//!
//! The orchestrator branches on these variants, so they stay distinct rather
//! than collapsing into one opaque error:
//! - `NoEpisode`: the page never came up. Normal for days that are not
//!   published yet; skip and retry on a later run.
//! - `BadEpisodeData`: the page rendered but a structural piece was missing.
//!   The site layout probably changed; an operator should hear about it.
//! - `Decode` / `DescriptorFetch`: the media descriptor could not be fetched
//!   or understood.

use std::fmt;

use thiserror::Error;

/// Which structural piece of a rendered episode page was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSection {
    PlayerFrame,
    MediaRequest,
    Thumbnail,
}

impl fmt::Display for MissingSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingSection::PlayerFrame => "frame",
            MissingSection::MediaRequest => "media request",
            MissingSection::Thumbnail => "thumbnail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EpisodeError {
    /// The episode page could not be reached or rendered at all.
    #[error("episode page could not be loaded: {reason}")]
    NoEpisode { reason: String },

    /// The page rendered, but an expected part of its structure never showed up.
    #[error("episode page is missing its {0}")]
    BadEpisodeData(MissingSection),

    /// The media descriptor was fetched but a field could not be understood.
    #[error("could not decode media descriptor field `{field}`: {reason}")]
    Decode { field: &'static str, reason: String },

    /// The media descriptor request itself failed.
    #[error("media descriptor request failed")]
    DescriptorFetch(#[from] reqwest::Error),
}

impl EpisodeError {
    pub fn no_episode(reason: impl fmt::Display) -> Self {
        EpisodeError::NoEpisode {
            reason: reason.to_string(),
        }
    }

    pub fn decode(field: &'static str, reason: impl fmt::Display) -> Self {
        EpisodeError::Decode {
            field,
            reason: reason.to_string(),
        }
    }
}
