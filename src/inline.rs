//! Asset inlining: external stylesheets become `<style>` blocks and images
//! become base64 `data:` URIs.
//!
//! Every asset is handled independently. A failed download is logged,
//! recorded in the [`InlineReport`] and the original reference is left
//! untouched, so the snapshot is still produced with that asset external.

use crate::document::{self, PageDocument};
use crate::fetch::AssetFetcher;
use crate::{Error, SnapshotConfig};
use base64::Engine as _;
use kuchikiki::NodeRef;
use log::{debug, info, warn};
use std::time::Duration;
use url::Url;

/// Kind of external resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `<link rel="stylesheet" href>`
    Stylesheet,
    /// `<img src>`
    Image,
}

impl AssetKind {
    /// Attribute holding the resource URL
    pub fn attribute(self) -> &'static str {
        match self {
            AssetKind::Stylesheet => "href",
            AssetKind::Image => "src",
        }
    }
}

/// One external reference found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    /// URL as written in the markup
    pub raw: String,
    /// Absolute URL, if `raw` could be resolved against the page URL
    pub resolved: Option<String>,
}

/// What happened to one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Embedded into the document
    Inlined { bytes: usize },
    /// Nothing to do (already inline, empty reference)
    Skipped { reason: String },
    /// Download failed; the external reference was kept
    Failed { reason: String },
}

/// Per-asset results of one inlining pass, in document order.
#[derive(Debug, Clone, Default)]
pub struct InlineReport {
    pub assets: Vec<(AssetRef, AssetOutcome)>,
}

impl InlineReport {
    fn count(&self, kind: AssetKind, pred: impl Fn(&AssetOutcome) -> bool) -> usize {
        self.assets
            .iter()
            .filter(|(a, o)| a.kind == kind && pred(o))
            .count()
    }

    pub fn stylesheets_inlined(&self) -> usize {
        self.count(AssetKind::Stylesheet, |o| matches!(o, AssetOutcome::Inlined { .. }))
    }

    pub fn images_inlined(&self) -> usize {
        self.count(AssetKind::Image, |o| matches!(o, AssetOutcome::Inlined { .. }))
    }

    /// Assets whose download failed, with the reason
    pub fn failures(&self) -> impl Iterator<Item = (&AssetRef, &str)> {
        self.assets.iter().filter_map(|(a, o)| match o {
            AssetOutcome::Failed { reason } => Some((a, reason.as_str())),
            _ => None,
        })
    }

    /// Number of fetch attempts made (inlined + failed)
    pub fn fetches(&self) -> usize {
        self.assets
            .iter()
            .filter(|(_, o)| !matches!(o, AssetOutcome::Skipped { .. }))
            .count()
    }
}

/// MIME subtype for an image URL, derived from the file extension.
///
/// Unknown or missing extensions fall back to `png`; the label is not checked
/// against the actual bytes.
pub fn image_mime_subtype(url: &str) -> &'static str {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let file = path.rsplit('/').next().unwrap_or_default();
    let ext = match file.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "png",
    };
    match ext.as_str() {
        "svg" => "svg+xml",
        "jpg" | "jpeg" => "jpeg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        "bmp" => "bmp",
        _ => "png",
    }
}

/// Build a `data:` URI for image bytes.
pub fn image_data_uri(url: &str, bytes: &[u8]) -> String {
    format!(
        "data:image/{};base64,{}",
        image_mime_subtype(url),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn resolve(base: Option<&Url>, raw: &str) -> Option<String> {
    match base {
        Some(base) => base.join(raw).ok().map(|u| u.to_string()),
        None => Url::parse(raw).ok().map(|u| u.to_string()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Inlines stylesheets and images of a document.
pub struct AssetInliner<'a, F: AssetFetcher> {
    fetcher: &'a F,
    config: &'a SnapshotConfig,
}

impl<'a, F: AssetFetcher> AssetInliner<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a SnapshotConfig) -> Self {
        Self { fetcher, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.asset_timeout_ms)
    }

    /// Inline every stylesheet, then every image, resolving against `base_url`.
    pub fn inline(&self, doc: &PageDocument, base_url: &str) -> crate::Result<InlineReport> {
        let base = Url::parse(base_url).ok();
        if base.is_none() {
            warn!("Page URL {} is not absolute; relative assets will be skipped", base_url);
        }

        let mut report = InlineReport::default();

        info!("Embedding CSS stylesheets...");
        for link in doc.select_all("link[rel~=\"stylesheet\"]")? {
            let entry = self.inline_stylesheet(&link, base.as_ref())?;
            report.assets.push(entry);
        }

        info!("Embedding images as Base64...");
        for img in doc.select_all("img")? {
            let entry = self.inline_image(&img, base.as_ref());
            report.assets.push(entry);
        }
        info!("  \u{2713} Embedded {} images", report.images_inlined());

        Ok(report)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        match self.fetcher.get(url, &self.config.headers, self.timeout()) {
            Ok(asset) if asset.is_ok() => Ok(asset.body),
            Ok(asset) => Err(format!("HTTP {}", asset.status)),
            Err(Error::AssetFetch { reason, .. }) => Err(reason),
            Err(e) => Err(e.to_string()),
        }
    }

    fn inline_stylesheet(
        &self,
        link: &NodeRef,
        base: Option<&Url>,
    ) -> crate::Result<(AssetRef, AssetOutcome)> {
        let raw = document::attr(link, AssetKind::Stylesheet.attribute()).unwrap_or_default();
        let resolved = if raw.trim().is_empty() {
            None
        } else {
            resolve(base, raw.trim())
        };
        let asset = AssetRef {
            kind: AssetKind::Stylesheet,
            raw: raw.clone(),
            resolved: resolved.clone(),
        };

        if raw.trim().is_empty() {
            return Ok((asset, AssetOutcome::Skipped { reason: "no href".into() }));
        }
        let Some(url) = resolved else {
            warn!("  \u{2717} Could not resolve stylesheet URL {}", raw);
            return Ok((asset, AssetOutcome::Failed { reason: "unresolvable URL".into() }));
        };

        let outcome = match self.fetch(&url) {
            Ok(bytes) => {
                let css = String::from_utf8_lossy(&bytes).into_owned();
                let style = document::create_element("style", &[])?;
                style.append(NodeRef::new_text(css));
                document::replace_node(link, style);
                info!("  \u{2713} Embedded CSS from {}", truncate(&url, 60));
                AssetOutcome::Inlined { bytes: bytes.len() }
            }
            Err(reason) => {
                warn!("  \u{2717} Could not download CSS from {}: {}", url, reason);
                AssetOutcome::Failed { reason }
            }
        };
        Ok((asset, outcome))
    }

    fn inline_image(&self, img: &NodeRef, base: Option<&Url>) -> (AssetRef, AssetOutcome) {
        let raw = document::attr(img, AssetKind::Image.attribute()).unwrap_or_default();
        let trimmed = raw.trim();
        let mut asset = AssetRef {
            kind: AssetKind::Image,
            raw: raw.clone(),
            resolved: None,
        };

        if trimmed.is_empty() {
            return (asset, AssetOutcome::Skipped { reason: "empty src".into() });
        }
        if trimmed.starts_with("data:") {
            return (asset, AssetOutcome::Skipped { reason: "already inline".into() });
        }

        asset.resolved = resolve(base, trimmed);
        let Some(url) = asset.resolved.clone() else {
            warn!("  \u{2717} Could not resolve image URL {}", raw);
            return (asset, AssetOutcome::Failed { reason: "unresolvable URL".into() });
        };

        let outcome = match self.fetch(&url) {
            Ok(bytes) => {
                document::set_attr(img, AssetKind::Image.attribute(), &image_data_uri(&url, &bytes));
                debug!("Embedded image {} ({} bytes)", url, bytes.len());
                AssetOutcome::Inlined { bytes: bytes.len() }
            }
            Err(reason) => {
                warn!("  \u{2717} Could not download image from {}: {}", url, reason);
                AssetOutcome::Failed { reason }
            }
        };
        (asset, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedAsset;
    use base64::Engine as _;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned responses and records every requested URL.
    struct CannedFetcher {
        responses: HashMap<String, (u16, Vec<u8>)>,
        requested: RefCell<Vec<String>>,
    }

    impl CannedFetcher {
        fn new(responses: &[(&str, u16, &[u8])]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(u, s, b)| (u.to_string(), (*s, b.to_vec())))
                    .collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl AssetFetcher for CannedFetcher {
        fn get(
            &self,
            url: &str,
            _headers: &HashMap<String, String>,
            _timeout: Duration,
        ) -> crate::Result<FetchedAsset> {
            self.requested.borrow_mut().push(url.to_string());
            match self.responses.get(url) {
                Some((status, body)) => Ok(FetchedAsset {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(Error::AssetFetch {
                    url: url.to_string(),
                    reason: "connection refused".into(),
                }),
            }
        }
    }

    const BASE: &str = "https://jobs.example.com/viewjob?jk=42";

    #[test]
    fn test_mime_subtype_mapping() {
        assert_eq!(image_mime_subtype("https://x/a.svg"), "svg+xml");
        assert_eq!(image_mime_subtype("https://x/a.JPG"), "jpeg");
        assert_eq!(image_mime_subtype("https://x/a.jpeg"), "jpeg");
        assert_eq!(image_mime_subtype("https://x/a.png?v=3"), "png");
        assert_eq!(image_mime_subtype("https://x/a.gif#frag"), "gif");
        assert_eq!(image_mime_subtype("https://x/a.webp"), "webp");
        assert_eq!(image_mime_subtype("https://x/a.bmp"), "bmp");
        assert_eq!(image_mime_subtype("https://x/a.tiff"), "png");
        assert_eq!(image_mime_subtype("https://x/avatar"), "png");
        assert_eq!(image_mime_subtype("https://x.example/pic?format=svg"), "png");
    }

    #[test]
    fn test_stylesheet_replaced_by_style() {
        let doc = PageDocument::parse(
            r#"<html><head><link rel="stylesheet" href="/s.css"><link rel="icon" href="/f.ico"></head><body></body></html>"#,
        );
        let fetcher = CannedFetcher::new(&[("https://jobs.example.com/s.css", 200, &b"body{color:red}"[..])]);
        let config = SnapshotConfig::default();

        let report = AssetInliner::new(&fetcher, &config).inline(&doc, BASE).unwrap();

        assert_eq!(report.stylesheets_inlined(), 1);
        let html = doc.to_html();
        assert!(html.contains("<style>body{color:red}</style>"));
        assert!(!html.contains("s.css"));
        // non-stylesheet links are left alone
        assert!(html.contains("f.ico"));
    }

    #[test]
    fn test_failed_stylesheet_keeps_link() {
        let doc = PageDocument::parse(
            r#"<html><head><link rel="stylesheet" href="missing.css"><link rel="stylesheet" href="/gone.css"></head></html>"#,
        );
        let fetcher = CannedFetcher::new(&[("https://jobs.example.com/gone.css", 404, &b""[..])]);
        let config = SnapshotConfig::default();

        let report = AssetInliner::new(&fetcher, &config).inline(&doc, BASE).unwrap();

        let failures: Vec<_> = report.failures().map(|(a, r)| (a.raw.clone(), r.to_string())).collect();
        assert_eq!(
            failures,
            vec![
                ("missing.css".to_string(), "connection refused".to_string()),
                ("/gone.css".to_string(), "HTTP 404".to_string()),
            ]
        );
        assert_eq!(doc.select_all("link[rel=stylesheet]").unwrap().len(), 2);
    }

    #[test]
    fn test_image_becomes_data_uri() {
        let bytes: &[u8] = &[0x89, b'P', b'N', b'G', 1, 2, 3, 4, 5, 6];
        let doc = PageDocument::parse(r#"<body><img src="/logo.png"></body>"#);
        let fetcher = CannedFetcher::new(&[("https://jobs.example.com/logo.png", 200, bytes)]);
        let config = SnapshotConfig::default();

        let report = AssetInliner::new(&fetcher, &config).inline(&doc, BASE).unwrap();

        assert_eq!(report.images_inlined(), 1);
        let img = doc.select_first("img").unwrap().unwrap();
        let src = document::attr(&img, "src").unwrap();
        let payload = src.strip_prefix("data:image/png;base64,").expect("png data uri");
        let decoded = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_noscript_image_is_inlined() {
        let fetcher = CannedFetcher::new(&[("https://t.example/px.gif", 200, &b"GIF89a"[..])]);
        let config = SnapshotConfig::default();
        let doc = PageDocument::parse(
            r#"<html><body><noscript><img src="https://t.example/px.gif"></noscript></body></html>"#,
        );

        let report = AssetInliner::new(&fetcher, &config).inline(&doc, BASE).unwrap();

        assert_eq!(report.images_inlined(), 1);
        let img = doc.select_first("noscript img").unwrap().unwrap();
        assert!(document::attr(&img, "src").unwrap().starts_with("data:image/gif;base64,"));
    }

    #[test]
    fn test_skips_empty_and_inline_images() {
        let doc = PageDocument::parse(
            r#"<body><img src=""><img><img src="data:image/gif;base64,R0lGOD"></body>"#,
        );
        let fetcher = CannedFetcher::new(&[]);
        let config = SnapshotConfig::default();

        let report = AssetInliner::new(&fetcher, &config).inline(&doc, BASE).unwrap();

        assert!(fetcher.requested.borrow().is_empty());
        assert_eq!(report.assets.len(), 3);
        assert!(report
            .assets
            .iter()
            .all(|(_, o)| matches!(o, AssetOutcome::Skipped { .. })));
    }

    #[test]
    fn test_failed_image_keeps_src() {
        let doc = PageDocument::parse(r#"<body><img src="https://cdn.example.com/a.jpg"></body>"#);
        let fetcher = CannedFetcher::new(&[("https://cdn.example.com/a.jpg", 500, &b"oops"[..])]);
        let config = SnapshotConfig::default();

        let report = AssetInliner::new(&fetcher, &config).inline(&doc, BASE).unwrap();

        assert_eq!(report.images_inlined(), 0);
        assert_eq!(report.failures().count(), 1);
        let img = doc.select_first("img").unwrap().unwrap();
        assert_eq!(document::attr(&img, "src").as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_second_pass_fetches_nothing() {
        let doc = PageDocument::parse(
            r#"<html><head><link rel="stylesheet" href="/s.css"></head><body><img src="/a.svg"><img src="b.gif"></body></html>"#,
        );
        let fetcher = CannedFetcher::new(&[
            ("https://jobs.example.com/s.css", 200, &b"p{}"[..]),
            ("https://jobs.example.com/a.svg", 200, &b"<svg/>"[..]),
            ("https://jobs.example.com/b.gif", 200, &b"GIF89a"[..]),
        ]);
        let config = SnapshotConfig::default();
        let inliner = AssetInliner::new(&fetcher, &config);

        inliner.inline(&doc, BASE).unwrap();
        assert_eq!(fetcher.requested.borrow().len(), 3);
        let first = doc.to_html();

        let again = inliner.inline(&doc, BASE).unwrap();
        assert_eq!(fetcher.requested.borrow().len(), 3);
        assert_eq!(again.fetches(), 0);
        assert_eq!(doc.to_html(), first);
    }

    #[test]
    fn test_truncate_long_urls() {
        let long = "x".repeat(80);
        assert_eq!(truncate(&long, 60).len(), 63);
        assert_eq!(truncate("short", 60), "short");
    }
}
