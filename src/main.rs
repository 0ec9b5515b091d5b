//! Command line entry point
//!
//! Loads the persisted booking profile and drives one booking run, or
//! collects the profile interactively with `--generate`. Cookie
//! acquisition is delegated to an external helper command; see
//! [`impfbot::session::HelperCommandProvider`] for the invocation
//! contract.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impfbot::config::setup;
use impfbot::session::HelperCommandProvider;
use impfbot::{BookingMachine, Profile, RunOutcome, Settings};

#[derive(Parser)]
#[command(author, version, about = "Automated appointment finder and booker", long_about = None)]
#[command(name = "impfbot")]
struct Cli {
    /// Seconds to wait between appointment searches
    #[arg(short = 'd', long, default_value_t = 30.0)]
    delay: f64,

    /// Interactively collect the booking profile and write it to disk
    #[arg(short = 'g', long)]
    generate: bool,

    /// Path of the booking profile file
    #[arg(long, default_value = "kontaktdaten.json", value_name = "FILE")]
    profile: PathBuf,

    /// External helper command producing the anti-bot cookie set
    /// (falls back to the IMPFBOT_COOKIE_HELPER environment variable)
    #[arg(long, value_name = "COMMAND")]
    cookie_helper: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    init_logging(&cli, &settings);

    if cli.generate {
        setup::run_setup(&cli.profile)?;
        return Ok(());
    }

    let profile = match Profile::load(&cli.profile) {
        Ok(profile) => profile,
        Err(err) => {
            eprintln!("Could not load booking profile: {}", err);
            eprintln!("Use --generate to create {} interactively.", cli.profile.display());
            std::process::exit(1);
        }
    };
    tracing::info!("Profile loaded for postal code {}", profile.plz);

    let helper = match cli
        .cookie_helper
        .clone()
        .or_else(|| std::env::var("IMPFBOT_COOKIE_HELPER").ok())
    {
        Some(command) => command,
        None => {
            eprintln!(
                "No cookie helper configured; pass --cookie-helper or set IMPFBOT_COOKIE_HELPER"
            );
            std::process::exit(1);
        }
    };

    let mut settings = settings;
    settings.search.check_delay = Duration::try_from_secs_f64(cli.delay)
        .map_err(|_| anyhow::anyhow!("--delay must be a non-negative number of seconds"))?;

    let provider = Arc::new(HelperCommandProvider::new(helper));
    let machine = BookingMachine::new(profile, settings, provider);

    match machine.run().await? {
        RunOutcome::Booked(pair) => {
            tracing::info!(
                "Run finished: appointments on {} and {}",
                pair.first.begin_display(),
                pair.second.begin_display()
            );
        }
        RunOutcome::BookingFailed(_) => {
            tracing::error!("Run finished without a booking; restart to search again");
        }
    }

    Ok(())
}

/// Stderr subscriber so script-style invocations keep stdout clean
fn init_logging(cli: &Cli, settings: &Settings) {
    let default_filter = if cli.verbose || settings.logging.verbose {
        "debug".to_string()
    } else {
        settings.logging.level.clone()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
