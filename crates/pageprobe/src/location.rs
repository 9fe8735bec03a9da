//! Geolocated city readback.
//!
//! The page guesses the visitor's city and shows it in a banner such as
//! "Showing offers near Austin". This component reads the city back and checks
//! that the banner contains both the phrase and that city. Because the
//! expected city is read from the same page, a wrong guess still passes; the
//! check proves the banner renders, not that detection is right.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::{ProbeConfig, Timeouts};
use crate::driver::PageDriver;
use crate::locator::{resolve, Role};
use crate::markup::MarkupContract;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Condition;

const COMPONENT: &str = "location";

/// Reads the detected city and its banner
#[derive(Debug)]
pub struct LocationReadback<D: PageDriver> {
    driver: Arc<D>,
    markup: Arc<MarkupContract>,
    timeouts: Timeouts,
    phrase: String,
}

impl<D: PageDriver> LocationReadback<D> {
    /// Create the readback
    pub fn new(driver: Arc<D>, markup: Arc<MarkupContract>, config: &ProbeConfig) -> Self {
        Self {
            driver,
            markup,
            timeouts: config.timeouts,
            phrase: config.location_phrase.trim().to_string(),
        }
    }

    /// Trimmed text of the detected-city element
    pub async fn detected_city(&self) -> ProbeResult<String> {
        let locator = resolve(&self.markup, Role::DetectedCity);
        let shown = self
            .timeouts
            .waiter(self.timeouts.element_ms)
            .until(self.driver.as_ref(), &Condition::Visible(locator.clone()))
            .await?;
        if !shown.success {
            return Err(ProbeError::not_found(COMPONENT, locator.to_string()));
        }
        Ok(self.driver.text_content(&locator).await?.trim().to_string())
    }

    /// Banner contains the phrase and the detected city
    #[instrument(skip(self))]
    pub async fn assert_displayed(&self) -> ProbeResult<String> {
        let city = self.detected_city().await?;
        if city.is_empty() {
            return Err(ProbeError::mismatch(
                COMPONENT,
                "detected city",
                "a non-empty city name",
                "\"\"",
            ));
        }
        let banner = resolve(&self.markup, Role::LocationBanner);
        if self.driver.count(&banner).await? == 0 {
            return Err(ProbeError::not_found(COMPONENT, banner.to_string()));
        }
        let text = normalize(&self.driver.text_content(&banner).await?);
        if !text.contains(&normalize(&self.phrase)) {
            return Err(ProbeError::mismatch(COMPONENT, "banner phrase", &self.phrase, text));
        }
        if !text.contains(&normalize(&city)) {
            return Err(ProbeError::mismatch(COMPONENT, "banner city", city, text));
        }
        debug!(%city, "location banner displayed");
        Ok(city)
    }
}

/// Collapse runs of whitespace so markup line breaks don't split the phrase
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Showing offers\n   near  Austin "), "Showing offers near Austin");
    }
}
