//! Print-friendly stylesheet appended to every snapshot.

use crate::document::{self, PageDocument};
use crate::Result;
use kuchikiki::NodeRef;

/// Hides site chrome when printing, centres the posting on screen and sets
/// paper margins.
pub const PRINT_STYLESHEET: &str = r#"
@media print {
    body { margin: 0; padding: 20px; }
    .no-print, nav, header, footer, .css-kyg8or, .css-1m4cuuf {
        display: none !important;
    }
}
body {
    max-width: 1200px;
    margin: 0 auto;
    padding: 20px;
}
.gnav-Logo-icon svg {
    height: 1.75rem;
    width: 7rem;
}
.jobsearch-InfoHeaderContainer {
    margin-inline-start: 0 !important;
}
@page {
    margin: 1cm;
}
"#;

/// Append [`PRINT_STYLESHEET`] as the last child of `<head>`.
///
/// Returns `false` when the document has no head.
pub fn append_print_styles(doc: &PageDocument) -> Result<bool> {
    let Some(head) = doc.head() else {
        return Ok(false);
    };
    let style = document::create_element("style", &[])?;
    style.append(NodeRef::new_text(PRINT_STYLESHEET));
    head.append(style);
    Ok(true)
}
