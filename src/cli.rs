use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CREDENTIALS_PATH;

#[derive(Parser, Debug)]
#[command(name = "twbulk", version, about = "Bulk downloads the twitch clips one user made on a channel")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every clip `creator` made on `channel` within a date range
    Download(DownloadCommandArgs),

    /// Store the application's client id and secret in the credentials file
    Configure(ConfigureCommandArgs),
}

#[derive(Args, Debug)]
pub struct DownloadCommandArgs {
    #[arg(help = "Login of the channel the clips were made on")]
    pub channel: String,

    #[arg(help = "Login of the user who made the clips")]
    pub creator: String,

    #[arg(short = 's', long = "start", help = "Start of the date range, YYYY-MM-DD or any common datetime (defaults to one month ago)")]
    pub start: Option<String>,

    #[arg(short = 'e', long = "end", help = "End of the date range (defaults to now)")]
    pub end: Option<String>,

    #[arg(short = 'o', long = "output", default_value_t = String::from("."), help = "Directory in which the session folder is created")]
    pub output: String,

    #[arg(short = 'c', long = "credentials", default_value_t = String::from(DEFAULT_CREDENTIALS_PATH), help = "Path to a json file containing client_id and client_secret")]
    pub credentials: String,

    #[arg(long = "client-id", help = "Overrides the client id from the credentials file")]
    pub client_id: Option<String>,

    #[arg(long = "client-secret", help = "Overrides the client secret from the credentials file")]
    pub client_secret: Option<String>,

    #[arg(short = 'n', long = "limit", help = "Stop after this many matching clips")]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ConfigureCommandArgs {
    #[arg(short = 'c', long = "credentials", default_value_t = String::from(DEFAULT_CREDENTIALS_PATH), help = "Path to the json credentials file")]
    pub credentials: String,

    #[arg(long = "client-id", help = "Twitch application client id")]
    pub client_id: String,

    #[arg(long = "client-secret", help = "Twitch application client secret")]
    pub client_secret: String,
}
