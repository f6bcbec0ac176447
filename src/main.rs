//! `jobsnap` command line: a thin shim mapping flags onto `SnapshotConfig`.

use anyhow::{Context, Result};
use clap::Parser;
use jobsnap::{SiteProfile, SnapshotConfig, Viewport, DEFAULT_OUTPUT};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Save a job posting as a self-contained, print-friendly HTML file
#[derive(Parser, Debug)]
#[command(name = "jobsnap", version, about)]
struct Cli {
    /// Job posting URL; prompted for when omitted
    url: Option<String>,

    /// Output file
    output: Option<PathBuf>,

    /// JSON site profile overriding the built-in selectors
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Seconds to wait for the posting to render
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    ready_timeout: u64,

    /// Extra milliseconds to wait for late content
    #[arg(long, value_name = "MILLIS", default_value_t = 3000)]
    settle: u64,

    /// Per-asset download timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    asset_timeout: u64,

    /// Browser and download user agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Browser window size, e.g. 1920x1080
    #[arg(long, value_name = "WxH")]
    window_size: Option<Viewport>,

    /// Chrome/Chromium executable
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "jobsnap=debug,info"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for the URL and output name. `None` when no URL was entered.
fn prompt_for_target() -> Result<Option<(String, PathBuf)>> {
    println!("Job Posting Snapshot");
    println!("{}", "-".repeat(50));
    let url = prompt("Enter job posting URL: ")?;
    if url.is_empty() {
        return Ok(None);
    }
    let name = prompt(&format!("Output filename (press Enter for '{}'): ", DEFAULT_OUTPUT))?;
    let name = if name.is_empty() {
        DEFAULT_OUTPUT.to_string()
    } else {
        jobsnap::ensure_html_extension(&name)
    };
    Ok(Some((url, PathBuf::from(name))))
}

fn build_config(cli: &Cli) -> Result<SnapshotConfig> {
    let mut config = SnapshotConfig {
        ready_timeout_ms: cli.ready_timeout.saturating_mul(1000),
        settle_delay_ms: cli.settle,
        asset_timeout_ms: cli.asset_timeout.saturating_mul(1000),
        chrome_path: cli.chrome.clone(),
        ..Default::default()
    };
    if let Some(ua) = &cli.user_agent {
        config = config.with_user_agent(ua);
    }
    if let Some(viewport) = cli.window_size {
        config.viewport = viewport;
    }
    if let Some(path) = &cli.profile {
        config.profile = SiteProfile::from_json_file(path)
            .with_context(|| format!("loading site profile {}", path.display()))?;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<bool> {
    let config = build_config(&cli)?;

    let (url, output) = match cli.url.clone() {
        Some(url) => (url, cli.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))),
        None => match prompt_for_target()? {
            Some(target) => target,
            None => {
                eprintln!("\u{2717} No URL provided. Exiting.");
                return Ok(false);
            }
        },
    };
    println!();

    match jobsnap::snapshot_job_posting(&url, &output, &config) {
        Ok(snapshot) => {
            let failed = snapshot.assets.failures().count();
            if failed > 0 {
                eprintln!(
                    "\u{26a0} {} asset(s) could not be embedded and still reference the network",
                    failed
                );
            }
            println!(
                "\n\u{2713} File saved successfully! Open '{}' in your browser to view or print.",
                snapshot.path.display()
            );
            println!("\u{2713} To create a PDF: Open the HTML file \u{2192} Press Ctrl+P (Cmd+P on Mac) \u{2192} Save as PDF");
            Ok(true)
        }
        Err(jobsnap::Error::ContainerNotFound(selector)) => {
            eprintln!("\u{2717} Could not find job posting content (no element matches {})", selector);
            Ok(false)
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Error scraping job posting {}", url))),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\u{2717} {:#}", e);
            ExitCode::FAILURE
        }
    }
}
