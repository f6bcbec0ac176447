//! jobsnap
//!
//! Saves one dynamically rendered job posting as a self-contained,
//! print-friendly HTML file: stylesheets and images are embedded, scripts and
//! site chrome are removed, and a print stylesheet is added.
//!
//! The pipeline is strictly linear:
//!
//! 1. [`render`]: drive a headless browser until the posting has rendered
//! 2. [`inline`]: embed stylesheets and images
//! 3. [`extract`]: keep only the posting and the head metadata
//! 4. [`print_style`]: append the print stylesheet
//! 5. [`writer`]: write the indented document to disk
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = jobsnap::SnapshotConfig::default();
//! let snapshot = jobsnap::snapshot_job_posting(
//!     "https://www.indeed.com/viewjob?jk=0123456789abcdef",
//!     Path::new("job_posting.html"),
//!     &config,
//! )?;
//! println!("saved {}", snapshot.path.display());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod document;
pub mod extract;
pub mod fetch;
pub mod inline;
pub mod print_style;
pub mod profile;
pub mod render;
pub mod writer;

// CDP backend (headless Chrome)
#[cfg(feature = "cdp")]
pub mod cdp;

pub use document::PageDocument;
pub use extract::ExtractionReport;
pub use fetch::{AssetFetcher, FetchedAsset, HttpFetcher};
pub use inline::{AssetKind, AssetOutcome, AssetRef, InlineReport};
pub use profile::SiteProfile;
pub use render::{BrowserSession, PageDriver, RenderedPage};

/// User agent sent by the browser and with every asset request
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Output file used when none is given
pub const DEFAULT_OUTPUT: &str = "job_posting.html";

/// Configuration for one snapshot run
///
/// Defaults match a desktop browser on a typical job board: a 1920×1080
/// viewport, 10 s to wait for the posting and for each asset, and a 3 s
/// settle delay for content that loads after the posting appears.
///
/// # Examples
///
/// ```
/// let cfg = jobsnap::SnapshotConfig::default();
/// assert_eq!(cfg.ready_timeout_ms, 10_000);
/// assert!(cfg.headers.contains_key("User-Agent"));
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// User agent string for the browser
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// How long to wait for the ready marker, in milliseconds
    pub ready_timeout_ms: u64,
    /// Extra wait after the marker appears, in milliseconds
    pub settle_delay_ms: u64,
    /// Per-asset download timeout in milliseconds
    pub asset_timeout_ms: u64,
    /// HTTP headers sent with asset requests
    pub headers: HashMap<String, String>,
    /// Launch Chrome without its sandbox (needed in most containers)
    pub disable_sandbox: bool,
    /// Chrome executable; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Site-specific selectors
    pub profile: SiteProfile,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: Viewport::default(),
            ready_timeout_ms: 10_000,
            settle_delay_ms: 3_000,
            asset_timeout_ms: 10_000,
            headers,
            disable_sandbox: true,
            chrome_path: None,
            profile: SiteProfile::default(),
        }
    }
}

impl SnapshotConfig {
    /// Set the user agent for both the browser and asset requests.
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self.headers
            .insert("User-Agent".to_string(), user_agent.to_string());
        self
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl std::str::FromStr for Viewport {
    type Err = Error;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::Config(format!("expected WIDTHxHEIGHT, got {}", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Config(format!("invalid viewport dimension: {}", v)))
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

/// A successfully written snapshot
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Where the HTML was written
    pub path: PathBuf,
    /// Page URL after redirects; the logo links here
    pub final_url: String,
    pub assets: InlineReport,
    pub extraction: ExtractionReport,
}

/// Build the snapshot document from already-rendered markup.
///
/// Runs inlining, extraction and style augmentation; nothing is written.
pub fn build_snapshot_document<F: AssetFetcher>(
    page: &RenderedPage,
    fetcher: &F,
    config: &SnapshotConfig,
) -> Result<(PageDocument, InlineReport, ExtractionReport)> {
    let doc = PageDocument::parse(&page.markup);

    let assets = inline::AssetInliner::new(fetcher, config).inline(&doc, &page.final_url)?;
    let (doc, extraction) = extract::extract_job_posting(doc, &page.final_url, &config.profile)?;

    log::info!("Adding print-friendly styles...");
    print_style::append_print_styles(&doc)?;

    Ok((doc, assets, extraction))
}

/// Run the whole pipeline with the given browser driver and HTTP fetcher.
///
/// The driver is released as soon as the page is captured. No file is
/// created unless every stage succeeds.
pub fn snapshot_with<D: PageDriver, F: AssetFetcher>(
    driver: D,
    fetcher: &F,
    url: &str,
    output: &Path,
    config: &SnapshotConfig,
) -> Result<Snapshot> {
    let page = render::render_page(driver, url, config)?;
    let (doc, assets, extraction) = build_snapshot_document(&page, fetcher, config)?;
    let path = writer::write_document(&doc, output)?;

    Ok(Snapshot {
        path,
        final_url: page.final_url,
        assets,
        extraction,
    })
}

/// Snapshot `url` into `output` using headless Chrome and `reqwest`.
#[cfg(feature = "cdp")]
pub fn snapshot_job_posting(url: &str, output: &Path, config: &SnapshotConfig) -> Result<Snapshot> {
    config.profile.validate()?;
    let fetcher = HttpFetcher::new()?;
    let driver = cdp::CdpDriver::launch(config)?;
    snapshot_with(driver, &fetcher, url, output, config)
}

/// Append `.html` unless the name already ends with it.
pub fn ensure_html_extension(name: &str) -> String {
    if name.ends_with(".html") {
        name.to_string()
    } else {
        format!("{}.html", name)
    }
}
