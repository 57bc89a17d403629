//! Flat JSON file holding the application's Twitch credentials.
//!
//! Nothing here fails loudly: a missing file is created with empty values, and read,
//! parse, or write problems are logged and fall back to empty credentials.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CREDENTIALS_PATH: &str = "config.json";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TwitchCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl TwitchCredentials {
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: TwitchCredentials,
}

impl CredentialStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let credentials = load(&path);
        Self { path, credentials }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> &TwitchCredentials {
        &self.credentials
    }

    pub fn set(&mut self, client_id: impl Into<String>, client_secret: impl Into<String>) {
        self.credentials.client_id = client_id.into();
        self.credentials.client_secret = client_secret.into();
        save(&self.path, &self.credentials);
    }
}

fn load(path: &Path) -> TwitchCredentials {
    if !path.exists() {
        debug!("No credentials file at {}, creating one", path.display());
        let defaults = TwitchCredentials::default();
        save(path, &defaults);
        return defaults;
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!("Failed to read credentials file {}: {err}", path.display());
            return TwitchCredentials::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(credentials) => credentials,
        Err(err) => {
            warn!("Credentials file {} has invalid formatting: {err}", path.display());
            TwitchCredentials::default()
        }
    }
}

fn save(path: &Path, credentials: &TwitchCredentials) {
    let json = match serde_json::to_string_pretty(credentials) {
        Ok(json) => json,
        Err(err) => {
            warn!("Failed to serialize credentials: {err}");
            return;
        }
    };
    if let Err(err) = fs::write(path, json) {
        warn!("Failed to save credentials to {}: {err}", path.display());
    }
}
