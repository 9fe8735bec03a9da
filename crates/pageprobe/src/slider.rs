//! Dual-carousel synchronization.
//!
//! A product page renders two carousels over the same images: a large "main"
//! slider and a strip of "preview" thumbnails. Both may be infinite-loop
//! widgets that insert clone slides at either end. [`SliderSync`] reads the
//! logical (non-clone) slide set of each, drives navigation, and asserts that
//! the two widgets agree on the active slide.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::Timeouts;
use crate::driver::PageDriver;
use crate::locator::{resolve, Role};
use crate::markup::{has_class, MarkupContract};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Condition;

const COMPONENT: &str = "slider";

/// Which of the two carousels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carousel {
    /// Large image slider
    Main,
    /// Thumbnail strip
    Preview,
}

impl fmt::Display for Carousel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Main => "main",
            Self::Preview => "preview",
        })
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Forward, wrapping from last to first
    Next,
    /// Backward, wrapping from first to last
    Previous,
}

/// A logical slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 0-based logical position (clones excluded)
    pub position: usize,
    /// Canonical image token, see [`image_identity`]
    pub image_identity: String,
}

/// Snapshot of both carousels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselPair {
    /// Main carousel slides, DOM order
    pub main: Vec<Slide>,
    /// Preview carousel slides, DOM order
    pub preview: Vec<Slide>,
    /// Active position in the main carousel
    pub active_main: usize,
    /// Active position in the preview carousel
    pub active_preview: usize,
}

impl CarouselPair {
    /// Both carousels mark the same position
    #[must_use]
    pub const fn is_synchronized(&self) -> bool {
        self.active_main == self.active_preview
    }

    /// The active slides of both carousels show the same image
    #[must_use]
    pub fn images_match(&self) -> bool {
        let main = self.main.iter().find(|s| s.position == self.active_main);
        let preview = self.preview.iter().find(|s| s.position == self.active_preview);
        match (main, preview) {
            (Some(m), Some(p)) => m.image_identity == p.image_identity,
            _ => false,
        }
    }
}

/// Canonicalize an image reference to a comparable token.
///
/// Takes the last path segment, drops query and fragment, then drops
/// everything from the first `.` on, so `/img/front.3fa9c1.jpg?w=640` and
/// `front.webp` both yield `front`. Image-proxy references of the form
/// `/_next/image?url=<encoded path>` are unwrapped first.
#[must_use]
pub fn image_identity(src: &str) -> String {
    let src = src.trim();
    let (path, query) = match src.find(&['?', '#'][..]) {
        Some(i) => (&src[..i], &src[i + 1..]),
        None => (src, ""),
    };
    if let Some(inner) = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("url="))
        .filter(|inner| !inner.is_empty())
    {
        return image_identity(&percent_decode(inner));
    }
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path);
    let segment = percent_decode(segment);
    segment.split('.').next().unwrap_or(&segment).to_string()
}

/// Decode `%XX` escapes; bytes that are not UTF-8 become U+FFFD
fn percent_decode(text: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(text.as_bytes())).into_owned()
}

/// Step a logical position one place in `direction`, wrapping at both ends.
///
/// Returns `None` for an empty carousel.
#[must_use]
pub const fn wrap_step(current: usize, total: usize, direction: Direction) -> Option<usize> {
    if total == 0 {
        return None;
    }
    let current = current % total;
    Some(match direction {
        Direction::Next => (current + 1) % total,
        Direction::Previous => (current + total - 1) % total,
    })
}

/// Slider synchronization engine
#[derive(Debug)]
pub struct SliderSync<D: PageDriver> {
    driver: Arc<D>,
    markup: Arc<MarkupContract>,
    timeouts: Timeouts,
}

impl<D: PageDriver> SliderSync<D> {
    /// Create the engine over a shared driver
    pub fn new(driver: Arc<D>, markup: Arc<MarkupContract>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            markup,
            timeouts,
        }
    }

    /// Physical (DOM order) indices of the non-clone slides of a carousel
    async fn logical_indices(&self, carousel: Carousel) -> ProbeResult<Vec<usize>> {
        let all = self
            .driver
            .count(&resolve(&self.markup, Role::Slides(carousel)))
            .await?;
        let mut logical = Vec::with_capacity(all);
        for physical in 0..all {
            let class = self
                .driver
                .attribute(&resolve(&self.markup, Role::SlideAt(carousel, physical)), "class")
                .await?;
            if !has_class(class.as_deref(), &self.markup.clone_class) {
                logical.push(physical);
            }
        }
        Ok(logical)
    }

    /// Number of non-clone slides in the main carousel
    #[instrument(skip(self))]
    pub async fn total_slides(&self) -> ProbeResult<usize> {
        let total = self.logical_indices(Carousel::Main).await?.len();
        debug!(total, "counted logical slides");
        Ok(total)
    }

    async fn read_index(&self, role: Role) -> ProbeResult<usize> {
        let locator = resolve(&self.markup, role);
        if self.driver.count(&locator).await? == 0 {
            return Err(ProbeError::not_found(COMPONENT, locator.to_string()));
        }
        let attr = &self.markup.slide_index_attribute;
        let raw = self.driver.attribute(&locator, attr).await?;
        raw.as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| ProbeError::MalformedAttribute {
                locator: locator.to_string(),
                attribute: attr.clone(),
                value: raw.unwrap_or_default(),
            })
    }

    async fn read_identity(&self, role: Role) -> ProbeResult<String> {
        let locator = resolve(&self.markup, role);
        if self.driver.count(&locator).await? == 0 {
            return Err(ProbeError::not_found(COMPONENT, locator.to_string()));
        }
        let src = self.driver.attribute(&locator, "src").await?;
        match src {
            Some(src) if !src.trim().is_empty() => Ok(image_identity(&src)),
            other => Err(ProbeError::MalformedAttribute {
                locator: locator.to_string(),
                attribute: "src".to_string(),
                value: other.unwrap_or_default(),
            }),
        }
    }

    /// Position of the slide carrying the current marker
    pub async fn active_index(&self, carousel: Carousel) -> ProbeResult<usize> {
        self.read_index(Role::ActiveSlide(carousel)).await
    }

    /// The slide carrying the current marker
    pub async fn active_slide(&self, carousel: Carousel) -> ProbeResult<Slide> {
        Ok(Slide {
            position: self.active_index(carousel).await?,
            image_identity: self.read_identity(Role::ActiveSlideImage(carousel)).await?,
        })
    }

    /// Logical slides of a carousel, DOM order
    pub async fn slides(&self, carousel: Carousel) -> ProbeResult<Vec<Slide>> {
        let mut slides = Vec::new();
        for physical in self.logical_indices(carousel).await? {
            slides.push(Slide {
                position: self.read_index(Role::SlideAt(carousel, physical)).await?,
                image_identity: self
                    .read_identity(Role::SlideImage(carousel, physical))
                    .await?,
            });
        }
        Ok(slides)
    }

    /// Read both carousels at once
    pub async fn snapshot(&self) -> ProbeResult<CarouselPair> {
        Ok(CarouselPair {
            main: self.slides(Carousel::Main).await?,
            preview: self.slides(Carousel::Preview).await?,
            active_main: self.active_index(Carousel::Main).await?,
            active_preview: self.active_index(Carousel::Preview).await?,
        })
    }

    /// Click next/previous and wait for the main carousel to settle on the
    /// wrapped neighbour of the current slide.
    #[instrument(skip(self))]
    pub async fn advance(&self, direction: Direction) -> ProbeResult<Slide> {
        let total = self.total_slides().await?;
        let current = self.active_index(Carousel::Main).await?;
        let expected = wrap_step(current, total, direction).ok_or_else(|| ProbeError::InvalidState {
            message: "main carousel has no slides".to_string(),
        })?;
        debug!(current, expected, total, "advancing");

        let button = resolve(&self.markup, Role::NavButton(direction));
        if self.driver.count(&button).await? == 0 {
            return Err(ProbeError::not_found(COMPONENT, button.to_string()));
        }
        self.driver.click(&button).await?;
        self.settle_on(expected).await
    }

    /// Click the preview thumbnail at a logical position and wait for the main
    /// carousel to settle on it.
    #[instrument(skip(self))]
    pub async fn jump_to(&self, position: usize) -> ProbeResult<Slide> {
        let logical = self.logical_indices(Carousel::Preview).await?;
        let physical = *logical.get(position).ok_or_else(|| ProbeError::InvalidState {
            message: format!(
                "preview position {position} out of range ({} slides)",
                logical.len()
            ),
        })?;
        self.driver
            .click(&resolve(&self.markup, Role::SlideAt(Carousel::Preview, physical)))
            .await?;
        self.settle_on(position).await
    }

    async fn settle_on(&self, expected: usize) -> ProbeResult<Slide> {
        let active = resolve(&self.markup, Role::ActiveSlide(Carousel::Main));
        let conditions = [
            Condition::AttributeEquals(
                active.clone(),
                self.markup.slide_index_attribute.clone(),
                expected.to_string(),
            ),
            Condition::StyleAtLeast(active, "opacity".to_string(), 1.0),
        ];
        let waiter = self.timeouts.waiter(self.timeouts.transition_ms);
        let result = waiter.until_all(self.driver.as_ref(), &conditions).await?;
        if !result.success {
            let observed = match self.active_index(Carousel::Main).await {
                Ok(index) => format!("active slide {index}"),
                Err(e) => e.to_string(),
            };
            return Err(ProbeError::TransitionTimeout {
                expected: format!("settled on slide {expected}"),
                observed,
                timeout_ms: waiter.options().timeout_ms,
            });
        }
        self.active_slide(Carousel::Main).await
    }

    /// Both carousels mark the same active position
    #[instrument(skip(self))]
    pub async fn assert_synchronized(&self) -> ProbeResult<()> {
        let main = self.active_index(Carousel::Main).await?;
        let preview = self.active_index(Carousel::Preview).await?;
        if main != preview {
            return Err(ProbeError::mismatch(
                COMPONENT,
                "preview active index (main is the reference)",
                main,
                preview,
            ));
        }
        Ok(())
    }

    /// Both active slides show the same image
    #[instrument(skip(self))]
    pub async fn assert_images_match(&self) -> ProbeResult<()> {
        let main = self.read_identity(Role::ActiveSlideImage(Carousel::Main)).await?;
        let preview = self
            .read_identity(Role::ActiveSlideImage(Carousel::Preview))
            .await?;
        if main != preview {
            return Err(ProbeError::mismatch(
                COMPONENT,
                "preview active image (main is the reference)",
                main,
                preview,
            ));
        }
        Ok(())
    }
}
