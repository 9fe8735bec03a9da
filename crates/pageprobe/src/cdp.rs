//! Chrome DevTools Protocol driver.
//!
//! Every [`PageDriver`] call becomes one `Runtime.evaluate` round trip: the
//! locator renders itself to a JavaScript expression (see
//! [`Locator::to_js`]) and the snippet reads or acts on its first match.
//! Nothing is cached between calls, so each read sees the live DOM.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::BrowserSettings;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// `{ found, value }` envelope returned by element reads
#[derive(Debug, Deserialize)]
struct Read<T> {
    found: bool,
    value: Option<T>,
}

/// Real browser driver over chromiumoxide
#[derive(Debug)]
pub struct CdpDriver {
    browser: Arc<Mutex<CdpBrowser>>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

impl CdpDriver {
    /// Launch chromium and open a blank page
    pub async fn launch(settings: &BrowserSettings) -> ProbeResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(settings.viewport_width, settings.viewport_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(agent) = &settings.user_agent {
            builder = builder.arg(format!("--user-agent={agent}"));
        }
        let config = builder
            .build()
            .map_err(|message| ProbeError::BrowserLaunch { message })?;

        let (browser, mut events) = CdpBrowser::launch(config)
            .await
            .map_err(|e| ProbeError::BrowserLaunch {
                message: e.to_string(),
            })?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::BrowserLaunch {
                message: e.to_string(),
            })?;
        info!(headless = settings.headless, "browser launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            page,
            handler,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ProbeError::evaluation(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| ProbeError::evaluation(e.to_string()))
    }

    /// Evaluate `body` with `el` bound to the locator's first match
    async fn read<T: DeserializeOwned>(&self, locator: &Locator, body: &str) -> ProbeResult<T> {
        let envelope: Read<T> = self
            .eval(format!(
                "(() => {{ const el = {}[0]; if (!el) return {{ found: false, value: null }}; \
                 return {{ found: true, value: (() => {{ {body} }})() }}; }})()",
                locator.to_js()
            ))
            .await?;
        if !envelope.found {
            return Err(ProbeError::not_found("driver", locator.to_string()));
        }
        envelope
            .value
            .ok_or_else(|| ProbeError::driver(format!("no value read from {locator}")))
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        debug!(url, "goto");
        let _ = self
            .page
            .goto(url)
            .await
            .map_err(|e| ProbeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.eval(format!("{}.length", locator.to_js())).await
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.eval(format!(
            "(() => {{ const el = {}[0]; if (!el) return false; \
             const s = getComputedStyle(el); const r = el.getBoundingClientRect(); \
             return s.display !== 'none' && s.visibility !== 'hidden' && (r.width > 0 || r.height > 0); }})()",
            locator.to_js()
        ))
        .await
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        debug!(%locator, "click");
        let _: bool = self
            .read(
                locator,
                "el.scrollIntoView({ block: 'center' }); el.click(); return true;",
            )
            .await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        debug!(%locator, "fill");
        let value = serde_json::to_string(text)?;
        let _: bool = self
            .read(
                locator,
                &format!(
                    "el.focus(); \
                     const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
                     Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, {value}); \
                     el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                     el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                     return true;"
                ),
            )
            .await?;
        Ok(())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let name = serde_json::to_string(name)?;
        // The inner Option distinguishes a missing attribute from a missing element.
        let value: Vec<String> = self
            .read(
                locator,
                &format!("const v = el.getAttribute({name}); return v === null ? [] : [v];"),
            )
            .await?;
        Ok(value.into_iter().next())
    }

    async fn text_content(&self, locator: &Locator) -> ProbeResult<String> {
        self.read(locator, "return el.textContent || '';").await
    }

    async fn all_text_contents(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        self.eval(format!(
            "{}.map(el => el.textContent || '')",
            locator.to_js()
        ))
        .await
    }

    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<Option<String>> {
        let property = serde_json::to_string(property)?;
        let value: String = self
            .read(
                locator,
                &format!("return getComputedStyle(el).getPropertyValue({property});"),
            )
            .await?;
        Ok(Some(value).filter(|v| !v.trim().is_empty()))
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut browser = self.browser.lock().await;
        let _ = browser
            .close()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        info!("browser closed");
        Ok(())
    }
}
