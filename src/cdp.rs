//! Chrome DevTools Protocol driver (uses the `headless_chrome` crate)

use crate::render::PageDriver;
use crate::{Error, Result, SnapshotConfig};
use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Headless Chrome driving a single tab.
///
/// Dropping the `Browser` kills the Chrome child process, so `shutdown` just
/// drops both handles.
pub struct CdpDriver {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl CdpDriver {
    /// Launch Chrome configured from `config` and open a tab.
    pub fn launch(config: &SnapshotConfig) -> Result<Self> {
        // `sandbox(false)` already passes --no-sandbox
        let args: Vec<&OsStr> = vec![OsStr::new("--disable-dev-shm-usage")];

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(!config.disable_sandbox)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .path(config.chrome_path.clone())
            .idle_browser_timeout(Duration::from_millis(
                config
                    .ready_timeout_ms
                    .saturating_add(config.settle_delay_ms)
                    .saturating_add(60_000),
            ))
            .args(args)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;

        debug!(
            "Launched headless Chrome ({}x{})",
            config.viewport.width, config.viewport.height
        );

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }

    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab
            .as_ref()
            .ok_or_else(|| Error::Render("browser already shut down".into()))
    }
}

// headless_chrome reports an expired wait as `util::Timeout`.
fn wait_error(err: anyhow::Error, selector: &str, timeout: Duration) -> Error {
    if err.downcast_ref::<headless_chrome::util::Timeout>().is_some() {
        Error::Timeout(timeout.as_millis() as u64)
    } else {
        Error::Render(format!("Waiting for {} failed: {}", selector, err))
    }
}

impl PageDriver for CdpDriver {
    fn navigate(&mut self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| Error::Render(format!("Navigation failed: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| Error::Render(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab()?
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| wait_error(e, selector, timeout))
    }

    fn rendered_markup(&self) -> Result<String> {
        Ok(self.tab()?.get_content()?)
    }

    fn current_url(&self) -> String {
        self.tab.as_ref().map(|t| t.get_url()).unwrap_or_default()
    }

    fn shutdown(&mut self) -> Result<()> {
        // Tab first: it borrows the browser's transport.
        drop(self.tab.take());
        if self.browser.take().is_some() {
            debug!("Headless Chrome terminated");
        }
        Ok(())
    }
}
