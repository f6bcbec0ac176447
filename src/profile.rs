//! Site profiles: the selector rules that adapt extraction to one job board.
//!
//! The defaults target the standalone job view of Indeed. A profile can be
//! loaded from JSON so that markup changes on the site only need a new
//! profile file, e.g.
//!
//! ```json
//! { "container_selector": "div.job-view", "search_form_class_hint": "search" }
//! ```
//!
//! Fields missing from the file keep their default value.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Selectors and hints used by the renderer and the content extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Element whose presence means the page finished rendering
    pub ready_selector: String,
    /// The job-posting container that is kept in the snapshot
    pub container_selector: String,
    /// Tag searched by the search-form heuristic
    pub search_form_tag: String,
    /// Substring looked for (case-insensitive) in class tokens of `search_form_tag` elements
    pub search_form_class_hint: String,
    /// Literal selector tried when the heuristic finds nothing
    pub search_form_fallback_selector: String,
    /// Decorative divider replaced by the logo
    pub divider_selector: String,
    /// Site logo, looked up anywhere in the page
    pub logo_selector: String,
    /// Graphic inside the logo that gets wrapped in a link
    pub logo_graphic_selector: String,
    /// Containers pruned when they carry no content
    pub empty_shell_tag: String,
    /// Descendants that count as content even without text
    pub content_media_selector: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            ready_selector: "#mosaic-aboveViewjobNav".to_string(),
            container_selector: "div.jobsearch-ViewJobLayout--standalone".to_string(),
            search_form_tag: "div".to_string(),
            search_form_class_hint: "form".to_string(),
            search_form_fallback_selector: "form[action=\"/jobs\"]".to_string(),
            divider_selector: "div#jobsearch-ViewJobLayout-rowSpacingLine".to_string(),
            logo_selector: "div.gnav-Logo-icon".to_string(),
            logo_graphic_selector: "svg".to_string(),
            empty_shell_tag: "div".to_string(),
            content_media_selector: "img, svg, input, button".to_string(),
        }
    }
}

impl SiteProfile {
    /// Parse a profile from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: SiteProfile = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid site profile: {}", e)))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Read and parse a profile file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read site profile {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Reject profiles with empty or unparseable selectors.
    pub fn validate(&self) -> Result<()> {
        let selectors = [
            ("ready_selector", &self.ready_selector),
            ("container_selector", &self.container_selector),
            ("search_form_fallback_selector", &self.search_form_fallback_selector),
            ("divider_selector", &self.divider_selector),
            ("logo_selector", &self.logo_selector),
            ("logo_graphic_selector", &self.logo_graphic_selector),
            ("empty_shell_tag", &self.empty_shell_tag),
            ("content_media_selector", &self.content_media_selector),
        ];
        let probe = kuchikiki::NodeRef::new_document();
        for (field, selector) in selectors {
            if selector.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", field)));
            }
            if probe.select(selector).is_err() {
                return Err(Error::Config(format!(
                    "{} is not a valid selector: {}",
                    field, selector
                )));
            }
        }
        if self.search_form_tag.trim().is_empty() {
            return Err(Error::Config("search_form_tag must not be empty".into()));
        }
        Ok(())
    }
}
