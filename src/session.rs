//! Drives one bulk download: token, user lookups, clip listing, then each clip in turn.
//!
//! The caller talks to a running session through two handles. Events flow out over an
//! unbounded channel ([`SessionEvent`]), and a [`CancelFlag`] flows in. The flag is only
//! read between clips, so a transfer that already started always runs to completion or
//! failure before the session stops.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    catalog::list_clips,
    config::TwitchCredentials,
    error::DownloaderError,
    models::{Clip, ClipQuery},
    platform::{ClipApi, ClipDownloader, Platform},
};

#[derive(Clone, Debug)]
pub struct SessionRequest {
    pub channel: String,
    pub creator: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub limit: Option<usize>,
    /// Directory the per-session output folder is created in.
    pub output_root: PathBuf,
}

impl SessionRequest {
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(output_dir_name(
            &self.channel,
            &self.creator,
            &self.started_at,
            &self.ended_at,
        ))
    }
}

pub fn output_dir_name(
    channel: &str,
    creator: &str,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> String {
    format!(
        "bulkdownload_{channel}_{creator}_{}_{}",
        start.format("%d-%m-%Y"),
        end.format("%d-%m-%Y")
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub output_dir: PathBuf,
    /// True when the session stopped before every clip was attempted.
    pub cancelled: bool,
}

impl SessionResult {
    pub fn attempted(&self) -> usize {
        self.successful + self.failed
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(SessionResult),
    Failed { message: String },
}

impl SessionOutcome {
    pub fn success(&self) -> bool {
        matches!(self, SessionOutcome::Completed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Message(String),
    FileProgress {
        downloaded: u64,
        total: u64,
        filename: String,
    },
    Overall {
        completed: usize,
        total: usize,
    },
    /// Always the last event of a session.
    Finished(SessionOutcome),
}

/// Cooperative cancellation shared between the caller and the session.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Notifier<'a> {
    events: &'a UnboundedSender<SessionEvent>,
}

impl Notifier<'_> {
    fn send(&self, event: SessionEvent) {
        // The receiver going away only means nobody is watching anymore.
        let _ = self.events.send(event);
    }

    fn message(&self, text: impl Into<String>) {
        let text = text.into();
        debug!("{text}");
        self.send(SessionEvent::Message(text));
    }
}

/// Runs a full session and returns its outcome, which is also sent as the final
/// [`SessionEvent::Finished`]. Errors never escape; they become [`SessionOutcome::Failed`].
pub async fn run<P, D>(
    platform: &P,
    downloader: &D,
    credentials: &TwitchCredentials,
    request: &SessionRequest,
    events: &UnboundedSender<SessionEvent>,
    cancel: &CancelFlag,
) -> SessionOutcome
where
    P: Platform,
    D: ClipDownloader,
{
    let notifier = Notifier { events };

    let outcome = match run_session(platform, downloader, credentials, request, &notifier, cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Session aborted: {err}");
            SessionOutcome::Failed {
                message: err.to_string(),
            }
        }
    };

    notifier.send(SessionEvent::Finished(outcome.clone()));
    outcome
}

async fn resolve_user<A: ClipApi>(api: &A, login: &str) -> Result<String, DownloaderError> {
    api.user_id(login)
        .await
        .map_err(|source| DownloaderError::Lookup {
            login: login.to_string(),
            source,
        })?
        .ok_or_else(|| DownloaderError::UserNotFound(login.to_string()))
}

async fn run_session<P, D>(
    platform: &P,
    downloader: &D,
    credentials: &TwitchCredentials,
    request: &SessionRequest,
    notifier: &Notifier<'_>,
    cancel: &CancelFlag,
) -> Result<SessionOutcome, DownloaderError>
where
    P: Platform,
    D: ClipDownloader,
{
    let api = platform.login(credentials).await?;

    notifier.message("Looking up user IDs...");
    let broadcaster_id = resolve_user(&api, &request.channel).await?;
    let creator_id = resolve_user(&api, &request.creator).await?;

    notifier.message("Searching for clips...");
    let query = ClipQuery {
        broadcaster_id,
        creator_id,
        started_at: request.started_at,
        ended_at: request.ended_at,
        limit: request.limit,
    };
    let clip_set = list_clips(&api, &query).await;

    if clip_set.interrupted {
        warn!("Clip listing was cut short by a failed request");
        notifier.message(format!(
            "Warning: clip listing stopped early after a failed request, continuing with {} clip(s)",
            clip_set.len()
        ));
    }

    if clip_set.is_empty() {
        return Ok(SessionOutcome::Failed {
            message: "No clips found for the requested period".to_string(),
        });
    }

    let total = clip_set.len();
    notifier.message(format!("Found {total} clip(s)"));

    let output_dir = request.output_dir();
    let mut successful = 0;
    let mut failed = 0;
    let mut cancelled = false;

    for (index, clip) in clip_set.clips.iter().enumerate() {
        if cancel.is_cancelled() {
            notifier.message("Download cancelled, skipping the remaining clips");
            cancelled = true;
            break;
        }

        let position = index + 1;
        notifier.message(format!("Processing clip {position}/{total}: {}", clip.title));

        if download_one(&api, downloader, clip, &output_dir, notifier).await {
            successful += 1;
        } else {
            failed += 1;
        }

        notifier.send(SessionEvent::Overall {
            completed: position,
            total,
        });
        notifier.message(format!("Total progress: {}%", position * 100 / total));
    }

    info!(
        "Session finished: {successful} downloaded, {failed} failed, {total} found{}",
        if cancelled { " (cancelled)" } else { "" }
    );

    Ok(SessionOutcome::Completed(SessionResult {
        total,
        successful,
        failed,
        output_dir,
        cancelled,
    }))
}

async fn download_one<A, D>(
    api: &A,
    downloader: &D,
    clip: &Clip,
    output_dir: &Path,
    notifier: &Notifier<'_>,
) -> bool
where
    A: ClipApi,
    D: ClipDownloader,
{
    let source = match api.resolve_source(&clip.id).await {
        Ok(source) => source,
        Err(err) => {
            notifier.message(format!("Could not resolve source for clip {}: {err}", clip.id));
            return false;
        }
    };
    debug!("Resolved clip {} to {source}", clip.id);

    let url = match source.download_url() {
        Ok(url) => url,
        Err(err) => {
            notifier.message(format!("Could not resolve source for clip {}: {err}", clip.id));
            return false;
        }
    };

    let on_progress = |downloaded: u64, total: u64, filename: &str| {
        notifier.send(SessionEvent::FileProgress {
            downloaded,
            total,
            filename: filename.to_string(),
        });
    };

    match downloader.download(clip, url, output_dir, on_progress).await {
        Ok(path) => {
            debug!("Saved clip {} to {}", clip.id, path.display());
            true
        }
        Err(err) => {
            notifier.message(format!("Failed to download clip {}: {err}", clip.id));
            false
        }
    }
}
