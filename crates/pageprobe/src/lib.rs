//! pageprobe: component-level verification of product pages in a real browser
//!
//! Checks are written against page components ("the carousels agree", "the zip
//! step rejects malformed input", "the reviews panel toggles") instead of raw
//! DOM queries. Every component talks to the browser through one narrow
//! [`PageDriver`] and waits for asynchronous rendering with bounded polling.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ProductPage                                │
//! │  ┌────────────┐ ┌──────────┐ ┌─────────────────┐ ┌────────────┐ │
//! │  │ SliderSync │ │ LeadForm │ │ DisclosurePanel │ │ Location   │ │
//! │  └─────┬──────┘ └────┬─────┘ └───────┬─────────┘ └─────┬──────┘ │
//! │        └──── resolve(markup, role) ──┴── Waiter ───────┘        │
//! │                              │                                   │
//! │                    Arc<D: PageDriver>                           │
//! │             CdpDriver (chromium)  |  MockDriver (tests)          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let driver = Arc::new(CdpDriver::launch(&config.browser).await?);
//! let mut page = ProductPage::new(driver, config)?;
//! page.goto().await?;
//! page.slider().advance(Direction::Next).await?;
//! page.slider().assert_synchronized().await?;
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod assertion;
#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::significant_drop_tightening,
    clippy::redundant_closure_for_method_calls
)]
mod cdp;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod config;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod disclosure;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::significant_drop_tightening
)]
mod driver;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod form;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod location;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod locator;
#[allow(clippy::missing_errors_doc)]
mod markup;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod page;
mod result;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod slider;
#[allow(clippy::missing_errors_doc)]
mod suite;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod wait;

pub use assertion::{expect_contains, expect_eq, CheckMode, CheckOutcome, CheckReport};
#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
pub use config::{
    BrowserSettings, CapturePolicy, DisclosureLabels, ProbeConfig, Timeouts, ValidationRule,
    ENV_BASE_URL, ENV_HEADLESS,
};
pub use disclosure::{parse_counter, DisclosurePanel, DisclosureState, Gallery};
pub use driver::{FakeDom, FakeNode, MockDriver, NodeId, PageDriver};
pub use form::{
    CompletionAction, FieldShape, FormField, FormSession, FormStep, LeadDetails, LeadForm,
    StepOutcome,
};
pub use location::LocationReadback;
pub use locator::{resolve, AttrMatch, Locator, Role, Selector};
pub use markup::{has_class, MarkupContract};
pub use page::{PageObject, ProductPage, ThankYouPage};
pub use result::{ProbeError, ProbeResult};
pub use slider::{image_identity, wrap_step, Carousel, CarouselPair, Direction, Slide, SliderSync};
pub use suite::{run_suite, MALFORMED_ZIP};
pub use wait::{
    Condition, WaitOptions, WaitResult, Waiter, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Everything a check author usually needs
pub mod prelude {
    pub use super::assertion::*;
    #[cfg(feature = "browser")]
    pub use super::cdp::*;
    pub use super::config::*;
    pub use super::disclosure::*;
    pub use super::driver::*;
    pub use super::form::*;
    pub use super::location::*;
    pub use super::locator::*;
    pub use super::markup::*;
    pub use super::page::*;
    pub use super::result::*;
    pub use super::slider::*;
    pub use super::suite::*;
    pub use super::wait::*;
}
