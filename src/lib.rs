pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod models;
pub mod platform;
pub mod progress;
pub mod session;
pub mod source;
pub mod twitch_utils;
mod video_source_response;

#[cfg(test)]
mod test_utils;

pub use download::HttpDownloader;
pub use session::{CancelFlag, SessionEvent, SessionOutcome, SessionRequest, SessionResult};
pub use twitch_utils::TwitchPlatform;
