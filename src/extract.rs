//! Content extraction: keep the job posting, drop everything else.

use crate::document::{self, PageDocument};
use crate::profile::SiteProfile;
use crate::{Error, Result};
use kuchikiki::NodeRef;
use log::{debug, info};

/// What the extractor changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub scripts_removed: usize,
    pub search_form_removed: bool,
    pub logo_substituted: bool,
    pub empty_shells_removed: usize,
    pub head_elements_moved: usize,
}

/// Remove every `<script>` element. Returns how many were removed.
pub fn strip_scripts(doc: &PageDocument) -> Result<usize> {
    let scripts = doc.select_all("script")?;
    for script in &scripts {
        script.detach();
    }
    Ok(scripts.len())
}

fn has_class_containing(node: &NodeRef, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    document::class_tokens(node)
        .iter()
        .any(|c| c.to_lowercase().contains(&needle))
}

/// Remove the search form inside `container`: the first `search_form_tag`
/// whose class mentions the hint, else the first match of the literal
/// fallback selector.
pub fn remove_search_form(container: &NodeRef, profile: &SiteProfile) -> Result<bool> {
    let heuristic = container
        .descendants()
        .filter(|n| document::tag_name(n).as_deref() == Some(profile.search_form_tag.as_str()))
        .find(|n| has_class_containing(n, &profile.search_form_class_hint));

    let form = match heuristic {
        Some(form) => Some(form),
        None => document::select_first_within(container, &profile.search_form_fallback_selector)?
            .filter(|n| n != container),
    };

    match form {
        Some(form) => {
            form.detach();
            info!("  \u{2713} Removed search form");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Swap the decorative divider for the site logo, with the logo graphic
/// linking back to `page_url`. Does nothing unless both are present.
pub fn substitute_logo(
    doc: &PageDocument,
    container: &NodeRef,
    page_url: &str,
    profile: &SiteProfile,
) -> Result<bool> {
    let divider = document::select_first_within(container, &profile.divider_selector)?;
    let logo = doc.select_first(&profile.logo_selector)?;

    let (divider, logo) = match (divider, logo) {
        (Some(d), Some(l)) => (d, l),
        (d, l) => {
            debug!(
                "Logo substitution skipped (divider: {}, logo: {})",
                d.is_some(),
                l.is_some()
            );
            return Ok(false);
        }
    };
    // The logo may sit inside the divider; moving it there would lose it.
    if divider == logo || logo.ancestors().any(|a| a == divider) {
        return Ok(false);
    }

    if let Some(graphic) = document::select_first_within(&logo, &profile.logo_graphic_selector)?
        .filter(|g| *g != logo)
    {
        let link = document::create_element("a", &[("href", page_url), ("target", "_blank")])?;
        graphic.insert_before(link.clone());
        link.append(graphic);
    }

    logo.detach();
    document::replace_node(&divider, logo);
    info!("  \u{2713} Replaced spacing line with logo");
    Ok(true)
}

fn is_empty_shell(node: &NodeRef, profile: &SiteProfile) -> Result<bool> {
    if !node.text_contents().trim().is_empty() {
        return Ok(false);
    }
    let media = document::select_within(node, &profile.content_media_selector)?;
    Ok(media.iter().all(|m| m == node))
}

/// Remove descendant containers that hold neither text nor media.
pub fn prune_empty_shells(container: &NodeRef, profile: &SiteProfile) -> Result<usize> {
    let shells: Vec<NodeRef> = container
        .descendants()
        .filter(|n| document::tag_name(n).as_deref() == Some(profile.empty_shell_tag.as_str()))
        .collect();

    let mut removed = 0;
    for shell in shells {
        // Already gone with an emptied ancestor
        if !shell.ancestors().any(|a| a == *container) {
            continue;
        }
        if is_empty_shell(&shell, profile)? {
            shell.detach();
            removed += 1;
        }
    }
    info!("  \u{2713} Removed empty divs");
    Ok(removed)
}

/// Reduce `doc` to a fresh document holding its head metadata and the
/// job-posting container.
///
/// `doc` is consumed: nodes are moved out of it, not copied.
pub fn extract_job_posting(
    doc: PageDocument,
    page_url: &str,
    profile: &SiteProfile,
) -> Result<(PageDocument, ExtractionReport)> {
    let mut report = ExtractionReport::default();

    info!("Removing scripts...");
    report.scripts_removed = strip_scripts(&doc)?;

    info!("Extracting job posting content...");
    let container = doc
        .select_first(&profile.container_selector)?
        .ok_or_else(|| Error::ContainerNotFound(profile.container_selector.clone()))?;

    report.search_form_removed = remove_search_form(&container, profile)?;
    report.logo_substituted = substitute_logo(&doc, &container, page_url, profile)?;
    report.empty_shells_removed = prune_empty_shells(&container, profile)?;

    let output = PageDocument::empty_shell();
    if let (Some(old_head), Some(new_head)) = (doc.head(), output.head()) {
        for node in document::select_within(&old_head, "meta, title, style")? {
            node.detach();
            new_head.append(node);
            report.head_elements_moved += 1;
        }
    }

    let body = output
        .body()
        .ok_or_else(|| Error::Render("rebuilt document has no body".into()))?;
    container.detach();
    body.append(container);

    Ok((output, report))
}
