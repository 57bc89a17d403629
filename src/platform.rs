//! Seams between the download session and the outside world.
//!
//! [`Platform`] hands out an authenticated [`ClipApi`], and [`ClipDownloader`] writes a
//! resolved clip to disk. The Twitch implementations live in [`crate::twitch_utils`] and
//! [`crate::download`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::Url;

use crate::{
    config::TwitchCredentials,
    error::{DownloadError, DownloaderError, SourceError},
    models::{Clip, ClipPage, ClipQuery},
    source::SourceDescriptor,
};

#[allow(async_fn_in_trait)]
pub trait Platform {
    type Api: ClipApi;

    /// Exchanges the application credentials for an access token. Called once per session.
    async fn login(&self, credentials: &TwitchCredentials) -> Result<Self::Api, DownloaderError>;
}

#[allow(async_fn_in_trait)]
pub trait ClipApi {
    type Cursor;

    async fn user_id(&self, login: &str) -> Result<Option<String>>;

    /// Fetches one unfiltered listing page scoped by broadcaster and time window.
    async fn clip_page(
        &self,
        query: &ClipQuery,
        after: Option<Self::Cursor>,
    ) -> Result<ClipPage<Self::Cursor>>;

    async fn resolve_source(&self, clip_id: &str) -> Result<SourceDescriptor, SourceError>;
}

#[allow(async_fn_in_trait)]
pub trait ClipDownloader {
    /// Downloads `url` into `output_dir` and returns the written path. Nothing is left on
    /// disk when this fails.
    async fn download<F>(
        &self,
        clip: &Clip,
        url: Url,
        output_dir: &Path,
        on_progress: F,
    ) -> Result<PathBuf, DownloadError>
    where
        F: FnMut(u64, u64, &str);
}
