use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use twitch_api::{
    HelixClient,
    helix::{Cursor, clips::get_clips},
    twitch_oauth2::AppAccessToken,
    types::UserId,
};
use twitch_types::Timestamp;

use crate::{
    config::TwitchCredentials,
    error::{DownloaderError, SourceError},
    models::{Clip, ClipPage, ClipQuery},
    platform::{ClipApi, Platform},
    source::{self, GQL_URL, SourceDescriptor},
};

/// Page size requested from the listing endpoint, the maximum Helix allows.
pub const PAGE_SIZE: usize = 100;

/// Renders a UTC instant the way Helix expects it: ISO-8601 with second precision.
pub fn convert_dt(input: &DateTime<Utc>) -> Result<Timestamp> {
    Ok(Timestamp::from_str(
        &input.to_rfc3339_opts(SecondsFormat::Secs, true),
    )?)
}

pub fn convert_ts(input: &Timestamp) -> Result<DateTime<Utc>, chrono::ParseError> {
    input.as_str().parse::<DateTime<Utc>>()
}

pub async fn get_token(
    client: &HelixClient<'static, reqwest::Client>,
    client_id: &str,
    client_secret: &str,
) -> Result<AppAccessToken> {
    Ok(AppAccessToken::get_app_access_token(
        client,
        client_id.into(),
        client_secret.into(),
        vec![/* scopes */],
    )
    .await?)
}

/// Entry point for the Twitch APIs; [`Platform::login`] yields an authenticated [`TwitchApi`].
#[derive(Default)]
pub struct TwitchPlatform {
    gql: reqwest::Client,
}

impl TwitchPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for TwitchPlatform {
    type Api = TwitchApi;

    async fn login(&self, credentials: &TwitchCredentials) -> Result<TwitchApi, DownloaderError> {
        let helix: HelixClient<'static, reqwest::Client> = HelixClient::default();
        let token = get_token(&helix, &credentials.client_id, &credentials.client_secret)
            .await
            .map_err(|err| DownloaderError::Auth(err.to_string()))?;

        debug!("Acquired application access token");
        Ok(TwitchApi {
            helix,
            token,
            gql: self.gql.clone(),
        })
    }
}

/// Authenticated session. The token is never refreshed; calls made after it expires fail.
pub struct TwitchApi {
    helix: HelixClient<'static, reqwest::Client>,
    token: AppAccessToken,
    gql: reqwest::Client,
}

impl ClipApi for TwitchApi {
    type Cursor = Cursor;

    async fn user_id(&self, login: &str) -> Result<Option<String>> {
        let login = login.to_string();
        let user_option = self.helix.get_user_from_login(&login, &self.token).await?;

        Ok(user_option.map(|user| user.id.to_string()))
    }

    async fn clip_page(&self, query: &ClipQuery, after: Option<Cursor>) -> Result<ClipPage<Cursor>> {
        let broadcaster_id: UserId = query.broadcaster_id.clone().into();
        let started_at = convert_dt(&query.started_at)?;
        let ended_at = convert_dt(&query.ended_at)?;

        let mut request = get_clips::GetClipsRequest::builder()
            .broadcaster_id(broadcaster_id.as_cow())
            .started_at(Some(started_at.as_cow()))
            .ended_at(Some(ended_at.as_cow()))
            .first(Some(PAGE_SIZE))
            .build();
        request.after = after.map(Into::into);

        let response = self.helix.req_get(request, &self.token).await?;

        let clips = response
            .data
            .into_iter()
            .filter_map(|clip| {
                let id = clip.id.to_string();
                match Clip::try_from(clip) {
                    Ok(clip) => Some(clip),
                    Err(err) => {
                        warn!("Skipping clip {id} with unreadable creation time ({err})");
                        None
                    }
                }
            })
            .collect();

        Ok(ClipPage {
            clips,
            cursor: response.pagination,
        })
    }

    async fn resolve_source(&self, clip_id: &str) -> Result<SourceDescriptor, SourceError> {
        source::resolve_source(&self.gql, GQL_URL, clip_id).await
    }
}
