//! Resolution of a clip's signed, short-lived media URL through the public GraphQL endpoint.

use std::fmt::Display;

use log::debug;
use percent_encoding::{NON_ALPHANUMERIC, percent_encode};
use reqwest::{Client, Url};
use serde_json::json;

use crate::{error::SourceError, video_source_response::VideoSourceResponse};

pub const GQL_URL: &str = "https://gql.twitch.tv/gql";

/// Public client id used by the twitch.tv web player. Unrelated to the user's application.
pub const GQL_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const OPERATION_NAME: &str = "VideoAccessToken_Clip";
const PERSISTED_QUERY_HASH: &str =
    "36b89d2507fce29e5ca551df756d27c1cfe079e2609642b4390aa4c35796eb11";

/// Signed media location for one clip. Expires quickly, so it is used once and dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub media_url: String,
    pub signature: String,
    pub token: String,
}

impl SourceDescriptor {
    pub fn download_url(&self) -> Result<Url, SourceError> {
        let encoded_token = percent_encode(self.token.as_bytes(), NON_ALPHANUMERIC);
        let url = format!(
            "{}?sig={}&token={encoded_token}",
            self.media_url, self.signature
        );
        Url::parse(&url).map_err(|err| SourceError::InvalidUrl(err.to_string()))
    }
}

impl Display for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.media_url)
    }
}

fn request_payload(clip_slug: &str) -> serde_json::Value {
    json!([{
        "operationName": OPERATION_NAME,
        "variables": {
            "slug": clip_slug
        },
        "extensions": {
            "persistedQuery": {
                "version": 1,
                "sha256Hash": PERSISTED_QUERY_HASH
            }
        }
    }])
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, SourceError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SourceError::Missing(field)),
    }
}

/// Picks the first quality's source URL and the playback token out of a batched response.
pub fn parse_source_response(body: &str) -> Result<SourceDescriptor, SourceError> {
    let responses: Vec<VideoSourceResponse> = serde_json::from_str(body)?;

    let clip = responses
        .into_iter()
        .next()
        .and_then(|response| response.data)
        .and_then(|data| data.clip)
        .ok_or(SourceError::Missing("data.clip"))?;

    let token = clip
        .playback_access_token
        .ok_or(SourceError::Missing("playbackAccessToken"))?;

    let media_url = clip
        .video_qualities
        .and_then(|qualities| qualities.into_iter().next())
        .and_then(|quality| quality.source_url);

    Ok(SourceDescriptor {
        media_url: non_empty(media_url, "videoQualities[0].sourceURL")?,
        signature: non_empty(token.signature, "playbackAccessToken.signature")?,
        token: non_empty(token.value, "playbackAccessToken.value")?,
    })
}

pub async fn resolve_source(
    client: &Client,
    endpoint: &str,
    clip_slug: &str,
) -> Result<SourceDescriptor, SourceError> {
    let response = client
        .post(endpoint)
        .header("Client-ID", GQL_CLIENT_ID)
        .json(&request_payload(clip_slug))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status));
    }

    let body = response.text().await?;
    debug!("Source response for {clip_slug}: {body}");
    parse_source_response(&body)
}
