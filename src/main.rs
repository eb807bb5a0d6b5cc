use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sl_feeds::config::Config;
use sl_feeds::fetch::Fetcher;
use sl_feeds::sync;

#[derive(Parser, Debug)]
#[command(
    name = "sl-feeds",
    version,
    about = "Transform slackware ChangeLog.txt into RSS feeds"
)]
struct Args {
    /// Load configuration from FILE
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output RSS files to DIR (overrides the config's Dest)
    #[arg(short, long, value_name = "DIR")]
    dest: Option<String>,

    /// Less output
    #[arg(short, long)]
    quiet: bool,

    /// Do not validate server certificates
    #[arg(long)]
    insecure: bool,

    /// Additional CA certificate (PEM) to trust
    #[arg(long, value_name = "FILE")]
    ca: Option<PathBuf>,

    /// Output sample config file to stdout
    #[arg(long)]
    sample_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.sample_config {
        let sample = Config::sample()
            .to_toml()
            .context("Failed to serialize sample config")?;
        print!("{sample}");
        return Ok(());
    }

    init_tracing(args.quiet);

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => Config::default(),
    };
    if let Some(dest) = &args.dest {
        config.dest = dest.clone();
    }
    let quiet = args.quiet || config.quiet;

    let sources = config.sources().context("Invalid mirror configuration")?;
    let dest = config.dest_dir()?;
    ensure_writable_dir(&dest)?;

    if !quiet {
        tracing::info!(dest = %dest.display(), releases = sources.len(), "Writing feeds");
    }

    let client = build_client(&args, config.timeout_seconds)?;
    let report = sync::run(&Fetcher::new(client), &dest, &sources, quiet).await;

    if !quiet {
        tracing::info!(
            updated = report.updated(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            "Done"
        );
    }
    Ok(())
}

fn init_tracing(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "sl_feeds=info,warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Creates the destination root and checks that files can be created in it.
///
/// An unusable destination is the one failure that aborts the whole run.
fn ensure_writable_dir(dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create destination '{}'", dest.display()))?;

    let probe = dest.join(format!(".sl-feeds.probe.{}", std::process::id()));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .with_context(|| format!("Destination '{}' is not writable", dest.display()))?;
    std::fs::remove_file(&probe)
        .with_context(|| format!("Failed to remove probe file '{}'", probe.display()))?;
    Ok(())
}

fn build_client(args: &Args, timeout_seconds: u64) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("sl-feeds/", env!("CARGO_PKG_VERSION")));

    if timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_seconds));
    }

    if let Some(ca) = &args.ca {
        let pem = std::fs::read(ca)
            .with_context(|| format!("Failed to read CA certificate '{}'", ca.display()))?;
        match reqwest::Certificate::from_pem_bundle(&pem) {
            Ok(certs) if !certs.is_empty() => {
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
            Ok(_) => {
                tracing::warn!(ca = %ca.display(), "No certificates found, using system roots only");
            }
            Err(e) => {
                tracing::warn!(ca = %ca.display(), error = %e, "Unusable CA file, using system roots only");
            }
        }
    }

    if args.insecure {
        tracing::warn!("Server certificate validation is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().context("Failed to build HTTP client")
}
