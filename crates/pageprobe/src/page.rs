//! Page objects.
//!
//! A page object names a page (its path and how to tell it has rendered) and
//! owns the components that live on it. [`ProductPage`] is a plain aggregate:
//! every component shares one driver handle and nothing inherits from a base
//! page.

use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::ProbeConfig;
use crate::disclosure::{DisclosurePanel, Gallery};
use crate::driver::PageDriver;
use crate::form::LeadForm;
use crate::locator::Locator;
use crate::location::LocationReadback;
use crate::markup::MarkupContract;
use crate::result::{ProbeError, ProbeResult};
use crate::slider::SliderSync;
use crate::wait::Condition;

/// A page the harness can navigate to
pub trait PageObject {
    /// Path below the base address
    fn path(&self) -> &str;

    /// Element whose visibility means the page is ready
    fn ready_locator(&self) -> Option<Locator> {
        None
    }

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The product detail page
#[derive(Debug)]
pub struct ProductPage<D: PageDriver> {
    driver: Arc<D>,
    config: ProbeConfig,
    markup: Arc<MarkupContract>,
    slider: SliderSync<D>,
    form: LeadForm<D>,
    reviews: DisclosurePanel<D>,
    location: LocationReadback<D>,
}

impl<D: PageDriver> PageObject for ProductPage<D> {
    fn path(&self) -> &str {
        &self.config.page_path
    }

    fn ready_locator(&self) -> Option<Locator> {
        Some(Locator::new(self.markup.main_carousel.clone()))
    }

    fn page_name(&self) -> &str {
        "product"
    }
}

impl<D: PageDriver> ProductPage<D> {
    /// Build the page and its components over a shared driver
    pub fn new(driver: Arc<D>, config: ProbeConfig) -> ProbeResult<Self> {
        config.validate()?;
        let markup = Arc::new(config.markup.clone());
        Ok(Self {
            slider: SliderSync::new(Arc::clone(&driver), Arc::clone(&markup), config.timeouts),
            form: LeadForm::new(Arc::clone(&driver), Arc::clone(&markup), &config)?,
            reviews: DisclosurePanel::new(Arc::clone(&driver), Arc::clone(&markup), &config)?,
            location: LocationReadback::new(Arc::clone(&driver), Arc::clone(&markup), &config),
            driver,
            config,
            markup,
        })
    }

    /// Navigate to the page and wait until it has rendered.
    ///
    /// Calling it again reloads the page and starts a fresh form session.
    #[instrument(skip(self))]
    pub async fn goto(&mut self) -> ProbeResult<()> {
        let url = self.config.url_for(self.path());
        info!(%url, page = self.page_name(), "navigating");
        self.driver.navigate(&url).await?;
        self.form.reset();
        if let Some(ready) = self.ready_locator() {
            let loaded = self
                .config
                .timeouts
                .waiter(self.config.timeouts.navigation_ms)
                .until(self.driver.as_ref(), &Condition::Visible(ready.clone()))
                .await?;
            if !loaded.success {
                return Err(ProbeError::not_found(self.page_name(), ready.to_string()));
            }
        }
        Ok(())
    }

    /// Shared driver handle
    #[must_use]
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Carousel pair
    #[must_use]
    pub const fn slider(&self) -> &SliderSync<D> {
        &self.slider
    }

    /// Lead form
    #[must_use]
    pub const fn form(&self) -> &LeadForm<D> {
        &self.form
    }

    /// Lead form, for filling
    pub fn form_mut(&mut self) -> &mut LeadForm<D> {
        &mut self.form
    }

    /// Reviews panel
    #[must_use]
    pub const fn reviews(&self) -> &DisclosurePanel<D> {
        &self.reviews
    }

    /// Gallery inside the reviews panel
    #[must_use]
    pub const fn gallery(&self) -> &Gallery<D> {
        self.reviews.gallery()
    }

    /// Location banner
    #[must_use]
    pub const fn location(&self) -> &LocationReadback<D> {
        &self.location
    }
}

/// The page a successful submission lands on
#[derive(Debug, Clone)]
pub struct ThankYouPage {
    path: String,
    pattern: Regex,
}

impl ThankYouPage {
    /// Describe the terminal page from configuration
    pub fn from_config(config: &ProbeConfig) -> ProbeResult<Self> {
        Ok(Self {
            path: "/thank-you".to_string(),
            pattern: config.terminal_pattern()?,
        })
    }

    /// Whether an address is this page
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Whether the browser is on this page now
    pub async fn is_current<D: PageDriver + ?Sized>(&self, driver: &D) -> ProbeResult<bool> {
        Ok(self.matches(&driver.current_url().await?))
    }
}

impl PageObject for ThankYouPage {
    fn path(&self) -> &str {
        &self.path
    }

    fn page_name(&self) -> &str {
        "thank-you"
    }
}
