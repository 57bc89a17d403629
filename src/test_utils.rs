//! In-memory stand-ins for the Twitch APIs and a one-shot HTTP responder.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{Result, anyhow};
use chrono::{TimeZone, Utc};
use reqwest::Url;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use crate::{
    config::TwitchCredentials,
    download::sanitize_filename,
    error::{DownloadError, DownloaderError, SourceError},
    models::{Clip, ClipPage, ClipQuery},
    platform::{ClipApi, ClipDownloader, Platform},
    session::CancelFlag,
    source::SourceDescriptor,
};

pub fn clip(id: &str, creator_id: &str) -> Clip {
    Clip {
        id: id.to_string(),
        title: format!("clip {id}"),
        url: format!("https://clips.twitch.tv/{id}"),
        creator_id: creator_id.to_string(),
        creator_name: format!("user{creator_id}"),
        broadcaster_id: "1000".to_string(),
        broadcaster_name: "channel".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

pub fn clip_titled(id: &str, title: &str) -> Clip {
    Clip {
        title: title.to_string(),
        ..clip(id, "42")
    }
}

pub fn query(creator_id: &str, limit: Option<usize>) -> ClipQuery {
    ClipQuery {
        broadcaster_id: "1000".to_string(),
        creator_id: creator_id.to_string(),
        started_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        ended_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        limit,
    }
}

#[derive(Default)]
struct ApiState {
    users: HashMap<String, String>,
    pages: Vec<Result<Vec<Clip>, &'static str>>,
    unresolvable: HashSet<String>,
    cursors_seen: Vec<Option<usize>>,
    lookups: Vec<String>,
}

/// Serves canned listing pages; the cursor is simply the index of the next page.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<ApiState>>,
}

impl FakeApi {
    pub fn with_pages(pages: Vec<Result<Vec<Clip>, &'static str>>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().pages = pages;
        api
    }

    pub fn user(self, login: &str, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(login.to_string(), id.to_string());
        self
    }

    pub fn unresolvable(self, clip_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unresolvable
            .insert(clip_id.to_string());
        self
    }

    pub fn page_requests(&self) -> usize {
        self.state.lock().unwrap().cursors_seen.len()
    }

    pub fn cursors_seen(&self) -> Vec<Option<usize>> {
        self.state.lock().unwrap().cursors_seen.clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }
}

impl ClipApi for FakeApi {
    type Cursor = usize;

    async fn user_id(&self, login: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(login.to_string());
        Ok(state.users.get(login).cloned())
    }

    async fn clip_page(&self, _query: &ClipQuery, after: Option<usize>) -> Result<ClipPage<usize>> {
        let mut state = self.state.lock().unwrap();
        state.cursors_seen.push(after);

        let index = after.unwrap_or(0);
        let clips = match state.pages.get(index) {
            Some(Ok(clips)) => clips.clone(),
            Some(Err(reason)) => return Err(anyhow!(*reason)),
            None => Vec::new(),
        };
        let cursor = (index + 1 < state.pages.len()).then_some(index + 1);
        Ok(ClipPage { clips, cursor })
    }

    async fn resolve_source(&self, clip_id: &str) -> Result<SourceDescriptor, SourceError> {
        if self.state.lock().unwrap().unresolvable.contains(clip_id) {
            return Err(SourceError::Missing("data.clip"));
        }
        Ok(SourceDescriptor {
            media_url: format!("https://media.example/{clip_id}.mp4"),
            signature: "sig".to_string(),
            token: "{\"clip\":true}".to_string(),
        })
    }
}

pub struct FakePlatform {
    pub api: FakeApi,
    pub reject_login: bool,
}

impl Platform for FakePlatform {
    type Api = FakeApi;

    async fn login(&self, _credentials: &TwitchCredentials) -> Result<FakeApi, DownloaderError> {
        if self.reject_login {
            return Err(DownloaderError::Auth("invalid client secret".to_string()));
        }
        Ok(self.api.clone())
    }
}

/// Pretends to download; records which clips were attempted.
#[derive(Default)]
pub struct FakeDownloader {
    pub failing: HashSet<String>,
    /// Raises the flag while the n-th download (1-based) is in flight.
    pub cancel_during: Option<(usize, CancelFlag)>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn attempted(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ClipDownloader for FakeDownloader {
    async fn download<F>(
        &self,
        clip: &Clip,
        _url: Url,
        output_dir: &Path,
        mut on_progress: F,
    ) -> Result<PathBuf, DownloadError>
    where
        F: FnMut(u64, u64, &str),
    {
        let count = {
            let mut attempted = self.calls.lock().unwrap();
            attempted.push(clip.id.clone());
            attempted.len()
        };
        if let Some((n, flag)) = &self.cancel_during {
            if *n == count {
                flag.cancel();
            }
        }

        let filename = sanitize_filename(&clip.title);
        if self.failing.contains(&clip.id) {
            on_progress(500, 500, &filename);
            return Err(DownloadError::TooSmall {
                bytes: 500,
                floor: crate::download::MIN_CLIP_BYTES,
            });
        }
        on_progress(200_000, 200_000, &filename);
        Ok(output_dir.join(filename))
    }
}

/// Accepts one connection, waits for the request head, and replies with `response` verbatim.
pub async fn serve_once(response: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = socket.write_all(&response).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/clip.mp4")
}
