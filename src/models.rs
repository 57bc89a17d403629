use chrono::{DateTime, Utc};
use twitch_api::helix;

use crate::twitch_utils::convert_ts;

/// A clip as returned by the listing endpoint, reduced to what the downloader needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clip {
    pub id: String,
    pub title: String,
    pub url: String,
    pub creator_id: String,
    pub creator_name: String,
    pub broadcaster_id: String,
    pub broadcaster_name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<helix::clips::Clip> for Clip {
    type Error = chrono::ParseError;

    fn try_from(clip: helix::clips::Clip) -> Result<Self, Self::Error> {
        Ok(Clip {
            created_at: convert_ts(&clip.created_at)?,
            id: clip.id.to_string(),
            title: clip.title,
            url: clip.url,
            creator_id: clip.creator_id.to_string(),
            creator_name: clip.creator_name.to_string(),
            broadcaster_id: clip.broadcaster_id.to_string(),
            broadcaster_name: clip.broadcaster_name.to_string(),
        })
    }
}

/// Clips accumulated over every listing page, in API order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipSet {
    pub clips: Vec<Clip>,
    /// Set when paging stopped because a page request failed rather than because the
    /// listing ran out of pages.
    pub interrupted: bool,
}

impl ClipSet {
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ClipQuery {
    pub broadcaster_id: String,
    pub creator_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub limit: Option<usize>,
}

/// One page of the listing endpoint, unfiltered.
#[derive(Debug)]
pub struct ClipPage<C> {
    pub clips: Vec<Clip>,
    pub cursor: Option<C>,
}
