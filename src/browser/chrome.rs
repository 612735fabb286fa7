//! chromiumoxide-backed [`PageDriver`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{DriverError, ElementSnapshot, PageDriver};
use crate::user_agent::browser_user_agent_arg;

/// Environment variable naming the Chromium/Chrome executable to launch.
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

const BROWSER_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How to start the browser.
#[derive(Debug, Clone, Default)]
pub struct ChromeOptions {
    /// Show the browser window instead of running headless.
    pub headed: bool,
    /// Explicit executable; chromiumoxide's own lookup is used when `None`.
    pub executable: Option<PathBuf>,
}

impl ChromeOptions {
    /// Headless options, honouring [`CHROMIUM_PATH_ENV`] when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            headed: false,
            executable: std::env::var_os(CHROMIUM_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// A running browser with one main page and an optional auxiliary tab.
pub struct ChromeDriver {
    browser: Browser,
    handler: JoinHandle<()>,
    main: Page,
    aux: Option<Page>,
    /// Browser profile, removed when the driver is dropped.
    _profile: TempDir,
}

impl ChromeDriver {
    /// Launches the browser and opens a blank main page.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Launch`] if the configuration is rejected or the
    /// process cannot be started.
    #[instrument(level = "debug", skip(options), fields(headed = options.headed))]
    pub async fn launch(options: &ChromeOptions) -> Result<Self, DriverError> {
        let profile = profile_dir()?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(BROWSER_REQUEST_TIMEOUT)
            .window_size(1920, 1080)
            .user_data_dir(profile.path());
        builder = if options.headed {
            builder.with_head()
        } else {
            builder.headless_mode(HeadlessMode::default())
        };
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .arg(browser_user_agent_arg())
            .build()
            .map_err(DriverError::launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
            debug!("browser handler finished");
        });

        let main = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(DriverError::cdp("open main page", e));
            }
        };

        info!("browser started");
        Ok(Self {
            browser,
            handler,
            main,
            aux: None,
            _profile: profile,
        })
    }

    /// Closes every page and the browser process.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Cdp`] if the browser does not acknowledge the close.
    pub async fn close(mut self) -> Result<(), DriverError> {
        if let Some(aux) = self.aux.take() {
            if let Err(e) = aux.close().await {
                debug!(error = %e, "closing auxiliary tab failed");
            }
        }
        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "waiting for browser exit failed");
        }
        self.handler.abort();
        result.map_err(|e| DriverError::cdp("close", e))?;
        info!("browser closed");
        Ok(())
    }

    fn active(&self) -> &Page {
        self.aux.as_ref().unwrap_or(&self.main)
    }
}

/// Fresh browser profile directory under the system temp dir.
fn profile_dir() -> Result<TempDir, DriverError> {
    tempfile::Builder::new()
        .prefix("album_downloader_chrome_")
        .tempdir()
        .map_err(|e| DriverError::launch(format!("user data directory: {e}")))
}

/// Builds the snapshot script for `selector`.
///
/// The selector is embedded as a JSON string literal so quotes and
/// backslashes survive.
fn snapshot_script(selector: &str) -> String {
    let literal = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        r"(() => Array.from(document.querySelectorAll({literal})).map((el) => {{
    const attributes = {{}};
    for (const attr of Array.from(el.attributes)) {{
        attributes[attr.name] = attr.value;
    }}
    if (typeof el.href === 'string' && el.href) {{
        attributes.href = el.href;
    }}
    if (typeof el.src === 'string' && el.src) {{
        attributes.src = el.src;
    }}
    return {{ text: (el.innerText || el.textContent || '').trim(), attributes }};
}}))()"
    )
}

#[async_trait]
impl PageDriver for ChromeDriver {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.active()
            .goto(url)
            .await
            .map_err(|e| DriverError::navigation(url, e.to_string()))?;
        Ok(())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementSnapshot>, DriverError> {
        let value = self.eval_script(&snapshot_script(selector)).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|source| DriverError::Decode { source })
    }

    async fn eval_script(&mut self, script: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .active()
            .evaluate(script)
            .await
            .map_err(|e| DriverError::cdp("evaluate", e))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.active()
            .content()
            .await
            .map_err(|e| DriverError::cdp("read page source", e))
    }

    #[instrument(level = "debug", skip(self))]
    async fn open_tab(&mut self, url: &str) -> Result<(), DriverError> {
        if let Some(previous) = self.aux.take() {
            if let Err(e) = previous.close().await {
                warn!(error = %e, "closing previous auxiliary tab failed");
            }
        }
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| DriverError::cdp("open tab", e))?;
        self.aux = Some(page);
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), DriverError> {
        if let Some(aux) = self.aux.take() {
            aux.close()
                .await
                .map_err(|e| DriverError::cdp("close tab", e))?;
        }
        Ok(())
    }
}
