//! Reviews disclosure panel and its image gallery.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::{ProbeConfig, Timeouts};
use crate::driver::PageDriver;
use crate::locator::{resolve, Role};
use crate::markup::{has_class, MarkupContract};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Condition;

const PANEL: &str = "disclosure";
const GALLERY: &str = "gallery";

/// Observed panel and gallery state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureState {
    /// Panel shows its detail region
    pub expanded: bool,
    /// Gallery overlay is showing
    pub gallery_open: bool,
    /// 1-based overlay position; 0 while closed
    pub gallery_index: usize,
    /// Images in the gallery; 0 while closed
    pub gallery_total: usize,
}

/// `<pos> / <total>` anywhere in the counter text
const COUNTER_PATTERN: &str = r"([0-9]+)\s*/\s*([0-9]+)";

/// Extract `(pos, total)` from counter text such as `"2 / 5"` or
/// `"Photo 2 / 5"`; `None` unless exactly one such pair is shown
#[must_use]
pub fn parse_counter(text: &str) -> Option<(usize, usize)> {
    if text.matches('/').count() != 1 {
        return None;
    }
    let pattern = Regex::new(COUNTER_PATTERN).ok()?;
    let caps = pattern.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

// =============================================================================
// GALLERY
// =============================================================================

/// Image gallery overlay opened from the panel's thumbnails
#[derive(Debug)]
pub struct Gallery<D: PageDriver> {
    driver: Arc<D>,
    markup: Arc<MarkupContract>,
    timeouts: Timeouts,
}

impl<D: PageDriver> Gallery<D> {
    /// Create the gallery controller
    pub fn new(driver: Arc<D>, markup: Arc<MarkupContract>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            markup,
            timeouts,
        }
    }

    async fn thumbnails(&self) -> ProbeResult<Vec<usize>> {
        let all = self
            .driver
            .count(&resolve(&self.markup, Role::GalleryThumbnails))
            .await?;
        let mut logical = Vec::with_capacity(all);
        for physical in 0..all {
            let class = self
                .driver
                .attribute(&resolve(&self.markup, Role::GalleryThumbnailAt(physical)), "class")
                .await?;
            if !has_class(class.as_deref(), &self.markup.clone_class) {
                logical.push(physical);
            }
        }
        Ok(logical)
    }

    /// Number of non-clone thumbnails
    pub async fn thumbnail_count(&self) -> ProbeResult<usize> {
        Ok(self.thumbnails().await?.len())
    }

    /// Whether the overlay carries its open class
    pub async fn is_open(&self) -> ProbeResult<bool> {
        Condition::HasClass(
            resolve(&self.markup, Role::GalleryOverlay),
            self.markup.overlay_open_class.clone(),
        )
        .check(self.driver.as_ref())
        .await
    }

    /// Click the thumbnail at a 0-based logical index and wait for the overlay
    #[instrument(skip(self))]
    pub async fn open_image(&self, index: usize) -> ProbeResult<usize> {
        let thumbnails = self.thumbnails().await?;
        let physical = *thumbnails.get(index).ok_or_else(|| ProbeError::InvalidState {
            message: format!(
                "gallery thumbnail {index} out of range ({} thumbnails)",
                thumbnails.len()
            ),
        })?;
        self.driver
            .click(&resolve(&self.markup, Role::GalleryThumbnailAt(physical)))
            .await?;

        let overlay = resolve(&self.markup, Role::GalleryOverlay);
        let opened = self
            .timeouts
            .waiter(self.timeouts.element_ms)
            .until(
                self.driver.as_ref(),
                &Condition::HasClass(overlay.clone(), self.markup.overlay_open_class.clone()),
            )
            .await?;
        if !opened.success {
            if self.driver.count(&overlay).await? == 0 {
                return Err(ProbeError::not_found(GALLERY, overlay.to_string()));
            }
            return Err(ProbeError::mismatch(GALLERY, "overlay state", "open", "closed"));
        }
        let position = self.current_position().await?;
        debug!(index, position, "gallery opened");
        Ok(position)
    }

    /// Read and check the counter; `(position, total)`, position 1-based
    pub async fn counter(&self) -> ProbeResult<(usize, usize)> {
        let locator = resolve(&self.markup, Role::GalleryCounter);
        if self.driver.count(&locator).await? == 0 {
            return Err(ProbeError::not_found(GALLERY, locator.to_string()));
        }
        let text = self.driver.text_content(&locator).await?;
        let (position, total) = parse_counter(&text).ok_or_else(|| {
            ProbeError::mismatch(GALLERY, "counter format", "\"<pos> / <total>\"", text.trim())
        })?;
        if position == 0 || position > total {
            return Err(ProbeError::mismatch(
                GALLERY,
                "counter position",
                format!("within 1..={total}"),
                position,
            ));
        }
        Ok((position, total))
    }

    /// 1-based position shown by the counter
    pub async fn current_position(&self) -> ProbeResult<usize> {
        Ok(self.counter().await?.0)
    }

    /// Total shown by the counter
    pub async fn total_count(&self) -> ProbeResult<usize> {
        Ok(self.counter().await?.1)
    }

    /// Click close and wait for the open class to go
    #[instrument(skip(self))]
    pub async fn close(&self) -> ProbeResult<()> {
        let button = resolve(&self.markup, Role::GalleryClose);
        if self.driver.count(&button).await? == 0 {
            return Err(ProbeError::not_found(GALLERY, button.to_string()));
        }
        self.driver.click(&button).await?;
        let closed = self
            .timeouts
            .waiter(self.timeouts.element_ms)
            .until(
                self.driver.as_ref(),
                &Condition::LacksClass(
                    resolve(&self.markup, Role::GalleryOverlay),
                    self.markup.overlay_open_class.clone(),
                ),
            )
            .await?;
        if closed.success {
            Ok(())
        } else {
            Err(ProbeError::mismatch(GALLERY, "overlay state", "closed", "open"))
        }
    }
}

// =============================================================================
// PANEL
// =============================================================================

/// Expand/collapse panel holding the reviews and the gallery
#[derive(Debug)]
pub struct DisclosurePanel<D: PageDriver> {
    driver: Arc<D>,
    markup: Arc<MarkupContract>,
    timeouts: Timeouts,
    expanded_label: Label,
    collapsed_label: Label,
    gallery: Gallery<D>,
}

/// Toggle label text and the pattern that accepts it
#[derive(Debug)]
struct Label {
    text: String,
    pattern: Regex,
}

impl Label {
    fn new(text: &str) -> ProbeResult<Self> {
        let text = text.trim().to_string();
        let pattern = Regex::new(&format!(r"^\s*{}\s*$", regex::escape(&text)))
            .map_err(|e| ProbeError::config(format!("disclosure label: {e}")))?;
        Ok(Self { text, pattern })
    }
}

impl<D: PageDriver> DisclosurePanel<D> {
    /// Create the panel controller
    pub fn new(driver: Arc<D>, markup: Arc<MarkupContract>, config: &ProbeConfig) -> ProbeResult<Self> {
        Ok(Self {
            gallery: Gallery::new(Arc::clone(&driver), Arc::clone(&markup), config.timeouts),
            expanded_label: Label::new(&config.labels.expanded)?,
            collapsed_label: Label::new(&config.labels.collapsed)?,
            driver,
            markup,
            timeouts: config.timeouts,
        })
    }

    /// The gallery inside the panel
    #[must_use]
    pub const fn gallery(&self) -> &Gallery<D> {
        &self.gallery
    }

    /// Read the container's state class
    pub async fn is_expanded(&self) -> ProbeResult<bool> {
        let container = resolve(&self.markup, Role::PanelContainer);
        if self.driver.count(&container).await? == 0 {
            return Err(ProbeError::not_found(PANEL, container.to_string()));
        }
        let class = self.driver.attribute(&container, "class").await?;
        if has_class(class.as_deref(), &self.markup.expanded_class) {
            Ok(true)
        } else if has_class(class.as_deref(), &self.markup.collapsed_class) {
            Ok(false)
        } else {
            Err(ProbeError::MalformedAttribute {
                locator: container.to_string(),
                attribute: "class".to_string(),
                value: class.unwrap_or_default(),
            })
        }
    }

    /// Click the toggle and wait for the state class to flip
    ///
    /// Returns the new expanded state.
    #[instrument(skip(self))]
    pub async fn toggle(&self) -> ProbeResult<bool> {
        let before = self.is_expanded().await?;
        let toggle = resolve(&self.markup, Role::PanelToggle);
        if self.driver.count(&toggle).await? == 0 {
            return Err(ProbeError::not_found(PANEL, toggle.to_string()));
        }
        self.driver.click(&toggle).await?;

        let container = resolve(&self.markup, Role::PanelContainer);
        let (gain, lose) = self.classes(!before);
        let flipped = self
            .timeouts
            .waiter(self.timeouts.element_ms)
            .until_all(
                self.driver.as_ref(),
                &[
                    Condition::HasClass(container.clone(), gain.to_string()),
                    Condition::LacksClass(container, lose.to_string()),
                ],
            )
            .await?;
        if !flipped.success {
            return Err(ProbeError::mismatch(
                PANEL,
                "panel state after toggle",
                describe(!before),
                describe(before),
            ));
        }
        debug!(expanded = !before, "panel toggled");
        Ok(!before)
    }

    fn classes(&self, expanded: bool) -> (&str, &str) {
        if expanded {
            (self.markup.expanded_class.as_str(), self.markup.collapsed_class.as_str())
        } else {
            (self.markup.collapsed_class.as_str(), self.markup.expanded_class.as_str())
        }
    }

    /// State class, toggle label and detail visibility all say collapsed
    pub async fn expect_collapsed(&self) -> ProbeResult<()> {
        self.expect_state(false).await
    }

    /// State class, toggle label and detail visibility all say expanded
    pub async fn expect_expanded(&self) -> ProbeResult<()> {
        self.expect_state(true).await
    }

    async fn expect_state(&self, expanded: bool) -> ProbeResult<()> {
        let container = resolve(&self.markup, Role::PanelContainer);
        let toggle = resolve(&self.markup, Role::PanelToggle);
        let detail = resolve(&self.markup, Role::PanelDetail);
        let (class, _) = self.classes(expanded);
        let label = if expanded {
            &self.expanded_label
        } else {
            &self.collapsed_label
        };
        let detail_condition = if expanded {
            Condition::Visible(detail.clone())
        } else {
            Condition::Hidden(detail.clone())
        };

        let settled = self
            .timeouts
            .waiter(self.timeouts.element_ms)
            .until_all(
                self.driver.as_ref(),
                &[
                    Condition::HasClass(container, class.to_string()),
                    Condition::TextMatches(toggle.clone(), label.pattern.clone()),
                    detail_condition,
                ],
            )
            .await?;
        if settled.success {
            return Ok(());
        }

        // Name the first signal that disagrees.
        let actual = self.is_expanded().await?;
        if actual != expanded {
            return Err(ProbeError::mismatch(
                PANEL,
                "state class",
                describe(expanded),
                describe(actual),
            ));
        }
        let shown = self.driver.all_text_contents(&toggle).await?;
        if !shown.iter().any(|text| label.pattern.is_match(text)) {
            let shown: Vec<&str> = shown.iter().map(|t| t.trim()).collect();
            return Err(ProbeError::mismatch(
                PANEL,
                "toggle label",
                format!("{:?}", label.text),
                shown.join(" | "),
            ));
        }
        let visible = self.driver.is_visible(&detail).await?;
        Err(ProbeError::mismatch(
            PANEL,
            "detail visibility",
            if expanded { "visible" } else { "hidden" },
            if visible { "visible" } else { "hidden" },
        ))
    }

    /// Read panel and gallery state together
    pub async fn state(&self) -> ProbeResult<DisclosureState> {
        let expanded = self.is_expanded().await?;
        let gallery_open = self.gallery.is_open().await?;
        let (gallery_index, gallery_total) = if gallery_open {
            self.gallery.counter().await?
        } else {
            (0, 0)
        };
        Ok(DisclosureState {
            expanded,
            gallery_open,
            gallery_index,
            gallery_total,
        })
    }
}

const fn describe(expanded: bool) -> &'static str {
    if expanded {
        "expanded"
    } else {
        "collapsed"
    }
}
