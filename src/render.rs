//! Page rendering through a browser driver.
//!
//! The browser is reached through the [`PageDriver`] trait; the pipeline owns
//! the driver through a [`BrowserSession`], which shuts it down when dropped so
//! that the browser process never outlives a run, whatever the exit path.

use crate::{Error, Result, SnapshotConfig};
use log::{debug, info, warn};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Minimal browser-automation surface needed to capture a rendered page
pub trait PageDriver {
    /// Navigate the current tab to `url`
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Block until an element matching `selector` exists, or fail after `timeout`
    fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Serialized markup of the live DOM
    fn rendered_markup(&self) -> Result<String>;

    /// URL of the current page after redirects
    fn current_url(&self) -> String;

    /// Release the browser. Must be safe to call more than once.
    fn shutdown(&mut self) -> Result<()>;
}

/// Scoped ownership of a driver; dropping the session shuts the driver down.
pub struct BrowserSession<D: PageDriver> {
    driver: D,
    released: bool,
}

impl<D: PageDriver> BrowserSession<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            released: false,
        }
    }

    /// Explicitly shut the driver down, surfacing any error.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.driver.shutdown()
    }
}

impl<D: PageDriver> Deref for BrowserSession<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.driver
    }
}

impl<D: PageDriver> DerefMut for BrowserSession<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: PageDriver> Drop for BrowserSession<D> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.driver.shutdown() {
            warn!("Browser shutdown failed: {}", e);
        } else {
            debug!("Browser released");
        }
    }
}

/// Markup captured from the browser
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub markup: String,
    /// Final URL after redirects
    pub final_url: String,
}

/// Render `url` with `driver` and release the driver before returning.
///
/// Fails with [`Error::Render`] when the ready marker does not show up within
/// `config.ready_timeout_ms`.
pub fn render_page<D: PageDriver>(
    driver: D,
    url: &str,
    config: &SnapshotConfig,
) -> Result<RenderedPage> {
    let mut session = BrowserSession::new(driver);

    info!("Loading job posting: {}", url);
    session.navigate(url)?;

    let ready = &config.profile.ready_selector;
    let timeout = Duration::from_millis(config.ready_timeout_ms);
    session.wait_for_element(ready, timeout).map_err(|e| match e {
        Error::Render(_) | Error::Timeout(_) => e,
        other => Error::Render(format!("page never showed {}: {}", ready, other)),
    })?;

    if config.settle_delay_ms > 0 {
        debug!("Waiting {}ms for late content", config.settle_delay_ms);
        std::thread::sleep(Duration::from_millis(config.settle_delay_ms));
    }

    let markup = session.rendered_markup()?;
    let final_url = session.current_url();
    session.close()?;

    info!("Processing page content...");
    Ok(RenderedPage { markup, final_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeDriver {
        markup: Option<String>,
        shutdowns: Rc<Cell<usize>>,
        visited: Option<String>,
    }

    impl PageDriver for FakeDriver {
        fn navigate(&mut self, url: &str) -> Result<()> {
            self.visited = Some(url.to_string());
            Ok(())
        }

        fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
            match &self.markup {
                Some(m) if m.contains(selector.trim_start_matches('#')) => Ok(()),
                _ => Err(Error::Timeout(timeout.as_millis() as u64)),
            }
        }

        fn rendered_markup(&self) -> Result<String> {
            Ok(self.markup.clone().unwrap_or_default())
        }

        fn current_url(&self) -> String {
            format!("{}&redirected=1", self.visited.clone().unwrap_or_default())
        }

        fn shutdown(&mut self) -> Result<()> {
            self.shutdowns.set(self.shutdowns.get() + 1);
            Ok(())
        }
    }

    fn config() -> SnapshotConfig {
        SnapshotConfig {
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_render_returns_markup_and_final_url() {
        let shutdowns = Rc::new(Cell::new(0));
        let driver = FakeDriver {
            markup: Some("<div id=\"mosaic-aboveViewjobNav\"></div>".into()),
            shutdowns: shutdowns.clone(),
            visited: None,
        };

        let page = render_page(driver, "https://x/viewjob?jk=1", &config()).unwrap();

        assert!(page.markup.contains("mosaic-aboveViewjobNav"));
        assert_eq!(page.final_url, "https://x/viewjob?jk=1&redirected=1");
        assert_eq!(shutdowns.get(), 1);
    }

    #[test]
    fn test_missing_marker_still_releases_browser() {
        let shutdowns = Rc::new(Cell::new(0));
        let driver = FakeDriver {
            markup: Some("<p>blocked</p>".into()),
            shutdowns: shutdowns.clone(),
            visited: None,
        };

        let err = render_page(driver, "https://x/", &config()).unwrap_err();

        assert!(matches!(err, Error::Timeout(10_000)));
        assert_eq!(shutdowns.get(), 1);
    }

    #[test]
    fn test_session_drop_on_panic() {
        let shutdowns = Rc::new(Cell::new(0));
        let counter = shutdowns.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _session = BrowserSession::new(FakeDriver {
                markup: None,
                shutdowns: counter,
                visited: None,
            });
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(shutdowns.get(), 1);
    }
}
