use std::{path::PathBuf, process};

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{error, info, warn};
use tokio::sync::mpsc;
use twbulk::{
    CancelFlag, HttpDownloader, SessionEvent, SessionRequest, TwitchPlatform,
    cli::{Cli, Commands, ConfigureCommandArgs, DownloadCommandArgs},
    config::CredentialStore,
    progress::ProgressReporter,
    session,
};

fn init_logging(multi: &MultiProgress) {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let level = logger.filter();
    if let Err(err) = LogWrapper::new(multi.clone(), logger).try_init() {
        eprintln!("Failed to initialise logging: {err}");
    }
    log::set_max_level(level);
}

/// Accepts a bare `YYYY-MM-DD` as midnight UTC, anything else goes through dateparser.
fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    dateparser::parse(input)
}

fn date_range(start: Option<&str>, end: Option<&str>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let now = Utc::now();
    let end = match end {
        Some(end) => parse_datetime(end)?,
        None => now,
    };
    let start = match start {
        Some(start) => parse_datetime(start)?,
        None => end
            .checked_sub_months(Months::new(1))
            .unwrap_or(end - Duration::days(30)),
    };
    if start > end {
        bail!("Start of the date range ({start}) is after its end ({end})");
    }
    Ok((start, end))
}

/// How the event loop ended.
#[derive(Debug, PartialEq, Eq)]
enum LoopExit {
    /// The worker dropped its sender, so every event has been seen.
    Drained,
    /// A second interrupt arrived while the current clip was still being waited on.
    Aborted,
}

/// One long-lived Ctrl-C listener feeding a channel, so no press is lost between events.
fn forward_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {err}");
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

async fn pump_events<H>(
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    mut interrupts: mpsc::UnboundedReceiver<()>,
    cancel: &CancelFlag,
    mut handle: H,
) -> LoopExit
where
    H: FnMut(&SessionEvent),
{
    loop {
        tokio::select! {
            biased;

            Some(()) = interrupts.recv() => {
                if cancel.is_cancelled() {
                    warn!("Interrupted again, abandoning the current clip");
                    return LoopExit::Aborted;
                }
                warn!("Cancellation requested, waiting for the current clip to finish (press Ctrl-C again to abort)...");
                cancel.cancel();
            }
            event = events.recv() => match event {
                Some(event) => handle(&event),
                None => return LoopExit::Drained,
            },
        }
    }
}

fn handle_configure_subcommand(args: ConfigureCommandArgs) -> Result<bool> {
    let mut store = CredentialStore::open(&args.credentials);
    store.set(args.client_id, args.client_secret);
    info!("Credentials saved to {}", store.path().display());
    Ok(true)
}

async fn handle_download_subcommand(args: DownloadCommandArgs, multi: MultiProgress) -> Result<bool> {
    let store = CredentialStore::open(&args.credentials);
    let mut credentials = store.get().clone();
    if let Some(client_id) = args.client_id {
        credentials.client_id = client_id;
    }
    if let Some(client_secret) = args.client_secret {
        credentials.client_secret = client_secret;
    }
    if !credentials.is_complete() {
        bail!(
            "Missing client_id or client_secret in {}, run `twbulk configure` first",
            store.path().display()
        );
    }

    let (started_at, ended_at) = date_range(args.start.as_deref(), args.end.as_deref())?;
    let request = SessionRequest {
        channel: args.channel,
        creator: args.creator,
        started_at,
        ended_at,
        limit: args.limit,
        output_root: PathBuf::from(args.output),
    };

    let platform = TwitchPlatform::new();
    let downloader = HttpDownloader::new()?;
    let cancel = CancelFlag::default();
    let (tx, rx) = mpsc::unbounded_channel();

    let worker_cancel = cancel.clone();
    let worker = tokio::spawn(async move {
        session::run(&platform, &downloader, &credentials, &request, &tx, &worker_cancel).await
    });

    let reporter = ProgressReporter::new(&multi);
    let exit = pump_events(rx, forward_interrupts(), &cancel, |event| reporter.handle(event)).await;
    if exit == LoopExit::Aborted {
        worker.abort();
        return Ok(false);
    }

    // A panicking worker never sends `Finished`; the join error is the only report.
    match worker.await {
        Ok(outcome) => Ok(outcome.success()),
        Err(err) => bail!("Download worker stopped unexpectedly: {err}"),
    }
}

#[tokio::main]
async fn main() {
    let multi = MultiProgress::new();
    init_logging(&multi);

    let args = Cli::parse();
    let result = match args.command {
        Commands::Download(args) => handle_download_subcommand(args, multi).await,
        Commands::Configure(args) => handle_configure_subcommand(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    }
}
