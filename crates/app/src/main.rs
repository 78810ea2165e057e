mod cli;

use chrono::{Local, NaiveDate};
use companion_core::calendar::{RamadanWindow, moon_phase};
use companion_core::model::ProgressStore;
use companion_core::zakat::{Wealth, zakat_due};
use services::config::{ENV_PROGRESS_FILE, ENV_REMINDER_AT, settings_from_env_with};
use services::{AppServices, Clock, SoftWarning, SyncOutcome, side_by_side};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, ArgsError, Command, print_usage};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn warn_user(warning: Option<&SoftWarning>) {
    if let Some(warning) = warning {
        eprintln!("warning: {warning}");
    }
}

fn print_store(store: &ProgressStore) {
    if store.is_empty() {
        println!("No surahs marked as read yet.");
        return;
    }
    for record in store {
        println!("{:<24} {}", record.label().as_str(), record.timestamp_display());
    }
    println!("{} read", store.len());
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(ArgsError::HelpRequested) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    let reminder_at = match &parsed.command {
        Command::Remind { at } => at.clone(),
        _ => None,
    };
    let settings = settings_from_env_with(|key| match key {
        ENV_PROGRESS_FILE => parsed.file.clone(),
        ENV_REMINDER_AT => reminder_at.clone(),
        _ => None,
    })?;
    let services = AppServices::new(settings, Clock::default_clock());

    match parsed.command {
        Command::Mark { label } => {
            let loaded = services.progress().load().await;
            warn_user(loaded.warning.as_ref());
            let mut store = loaded.value;
            let report = services.recorder().record(&mut store, &label).await?;
            println!("{}", report.message());
            warn_user(report.warning.as_ref());
        }
        Command::List => {
            let loaded = services.progress().load().await;
            warn_user(loaded.warning.as_ref());
            print_store(&loaded.value);
        }
        Command::Remote { url } => {
            let url = url.or_else(|| {
                services
                    .settings()
                    .remote_csv_url()
                    .map(|u| u.to_string())
            });
            let Some(url) = url else {
                eprintln!("no remote sheet configured; pass --url or set COMPANION_REMOTE_CSV_URL");
                return Ok(());
            };
            let loaded = services.progress().load().await;
            warn_user(loaded.warning.as_ref());
            let fetched = services.remote().fetch(&url).await;
            warn_user(fetched.warning.as_ref());

            println!("{:<24} {:<18} {}", "Surah", "Local", "Remote");
            for row in side_by_side(&loaded.value, &fetched.value) {
                println!(
                    "{:<24} {:<18} {}",
                    row.label,
                    row.local.as_deref().unwrap_or("-"),
                    row.remote.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Sync => {
            let loaded = services.progress().load().await;
            warn_user(loaded.warning.as_ref());
            let report = services.sync().sync(&loaded.value).await;
            match &report.outcome {
                SyncOutcome::Disabled => println!("Sync is off."),
                SyncOutcome::ReadOnly { snapshot } => {
                    println!("Remote sheet has {} row(s):", snapshot.len());
                    for row in snapshot.iter() {
                        println!("{:<24} {}", row.label(), row.date().unwrap_or("-"));
                    }
                }
                SyncOutcome::OpenExternally { url } => {
                    println!("Open this sheet to edit it: {url}");
                }
                SyncOutcome::Overwritten { range, labels } => {
                    println!("Wrote {labels} label(s) to {range}.");
                }
                SyncOutcome::NotSynced => println!("Nothing was synced."),
            }
            warn_user(report.warning.as_ref());
        }
        Command::Zakat { amount } => {
            let wealth: Wealth = amount.parse()?;
            println!("Zakat due: {}", zakat_due(wealth));
        }
        Command::Moon { date } => {
            let date = date.unwrap_or_else(today);
            println!("{date}: {}", moon_phase(date));
        }
        Command::Ramadan { start, end, today: on } => {
            let window = RamadanWindow::new(start, end)?;
            let progress = window.progress(on.unwrap_or_else(today));
            println!(
                "Day {} of {} ({} left, {:.0}%)",
                progress.days_passed,
                progress.days_total,
                progress.days_left(),
                progress.fraction() * 100.0
            );
        }
        Command::Remind { .. } => {
            let at = services.settings().reminder_at();
            println!("Reminder set for {}. Press Ctrl-C to stop.", at.format("%H:%M"));
            let handle = services.reminder().spawn();
            tokio::signal::ctrl_c().await?;
            let last = handle.shutdown().await;
            tracing::info!(?last, "reminder stopped");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(2);
    }
}
