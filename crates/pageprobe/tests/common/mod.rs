//! In-memory product page shared by the integration tests.
//!
//! The page is rebuilt on every navigation and reacts to clicks the way the
//! real site does: the carousels loop with clone slides and fade in the new
//! main slide over a few ticks, the lead form reveals one step at a time and
//! redirects after submission, the reviews panel toggles and opens a gallery.
//! [`SiteOptions`] switches individual behaviours into known defects.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use pageprobe::{
    FakeDom, FieldShape, FormField, MockDriver, NodeId, ProbeConfig, ProductPage, Timeouts,
    ValidationRule,
};

pub const BASE_URL: &str = "https://dealer.test";
pub const PRODUCT_PATH: &str = "/cars/42";
pub const THANK_YOU_URL: &str = "https://dealer.test/thank-you?lead=1";

const ACTIVE: &str = "swiper-slide-active";
const CLONE: &str = "swiper-slide-duplicate";
const INDEX: &str = "data-swiper-slide-index";

#[derive(Debug, Clone)]
pub struct SiteOptions {
    /// Logical slides per carousel
    pub slides: usize,
    /// Ticks before a new main slide reaches full opacity
    pub transition_ticks: u32,
    /// Preview carousel follows main navigation
    pub preview_follows: bool,
    /// Preview images are shifted by this many slides
    pub preview_image_shift: usize,
    /// Email step renders a submit control instead of "continue"
    pub email_step_submits: bool,
    /// Successful submission changes the address
    pub redirects: bool,
    /// Overrides the zip error copy
    pub zip_error_copy: Option<String>,
    /// Ticks before an accepted value clears a shown error; `None` clears it at once
    pub error_clears_after: Option<u32>,
    /// Driver calls that fail while the thank-you page replaces the document
    pub redirect_lost_reads: u32,
    /// Images behind the gallery thumbnails
    pub gallery_images: usize,
    /// Text before the gallery counter, e.g. "Photo"
    pub counter_label: Option<String>,
    /// Toggle clicks do nothing
    pub toggle_inert: bool,
    /// Toggle keeps its initial label
    pub toggle_label_sticks: bool,
    /// Detail region stays visible after collapsing
    pub detail_stays_visible: bool,
    /// Gallery close control does nothing
    pub close_inert: bool,
    /// City shown in the location banner
    pub city: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            slides: 5,
            transition_ticks: 3,
            preview_follows: true,
            preview_image_shift: 0,
            email_step_submits: false,
            redirects: true,
            zip_error_copy: None,
            error_clears_after: None,
            redirect_lost_reads: 0,
            gallery_images: 4,
            counter_label: None,
            toggle_inert: false,
            toggle_label_sticks: false,
            detail_stays_visible: false,
            close_inert: false,
            city: "Austin".to_string(),
        }
    }
}

pub fn config() -> ProbeConfig {
    ProbeConfig::default()
        .with_base_url(BASE_URL)
        .with_page_path(PRODUCT_PATH)
        .with_timeouts(Timeouts {
            element_ms: 500,
            transition_ms: 500,
            settle_ms: 300,
            navigation_ms: 1_000,
            redirect_ms: 500,
            poll_interval_ms: 10,
        })
}

pub fn site(options: SiteOptions) -> Arc<MockDriver> {
    let mut dom = FakeDom::default();
    dom.on_navigate(move |dom, url| {
        dom.clear();
        if url.contains(PRODUCT_PATH) {
            build_product(dom, &options);
        }
    });
    Arc::new(MockDriver::new(dom))
}

/// A product page over the fake site, already loaded
pub async fn loaded_page(options: SiteOptions) -> ProductPage<MockDriver> {
    let mut page = ProductPage::new(site(options), config()).unwrap();
    page.goto().await.unwrap();
    page
}

fn build_product(dom: &mut FakeDom, options: &SiteOptions) {
    build_carousels(dom, options);
    build_form(dom, options);
    build_reviews(dom, options);
    build_location(dom, options);
}

// =============================================================================
// CAROUSELS
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct SlideNode {
    id: NodeId,
    index: usize,
}

fn build_carousel(
    dom: &mut FakeDom,
    class: &str,
    alt: &str,
    n: usize,
    src: impl Fn(usize) -> String,
) -> Vec<SlideNode> {
    let root = dom.append(None, "div", &[("class", class)], "");
    let wrapper = dom.append(Some(root), "div", &[("class", "swiper-wrapper")], "");
    // Loop mode: a clone of the last slide first, a clone of the first last.
    let order: Vec<(usize, bool)> = std::iter::once((n - 1, true))
        .chain((0..n).map(|i| (i, false)))
        .chain(std::iter::once((0, true)))
        .collect();
    let mut slides = Vec::new();
    for (index, is_clone) in order {
        let class = match (is_clone, index == 0) {
            (true, _) => format!("swiper-slide {CLONE}"),
            (false, true) => format!("swiper-slide {ACTIVE}"),
            (false, false) => "swiper-slide".to_string(),
        };
        let index_text = index.to_string();
        let id = dom.append(
            Some(wrapper),
            "div",
            &[("class", class.as_str()), (INDEX, index_text.as_str())],
            "",
        );
        let src = src(index);
        let _ = dom.append(Some(id), "img", &[("alt", alt), ("src", src.as_str())], "");
        slides.push(SlideNode { id, index });
    }
    slides
}

fn active_index(dom: &FakeDom, slides: &[SlideNode]) -> usize {
    slides
        .iter()
        .find(|s| dom.has_class(s.id, ACTIVE))
        .map_or(0, |s| s.index)
}

fn activate(dom: &mut FakeDom, slides: &[SlideNode], target: usize, fade_ticks: Option<u32>) {
    for slide in slides {
        dom.remove_class(slide.id, ACTIVE);
    }
    let Some(slide) = slides
        .iter()
        .find(|s| s.index == target && !dom.has_class(s.id, CLONE))
        .copied()
    else {
        return;
    };
    dom.add_class(slide.id, ACTIVE);
    if let Some(ticks) = fade_ticks {
        dom.set_style(slide.id, "opacity", "0");
        dom.defer(ticks, move |d| d.set_style(slide.id, "opacity", "1"));
    }
}

fn build_carousels(dom: &mut FakeDom, options: &SiteOptions) {
    let n = options.slides;
    let main = build_carousel(dom, "product-slider-main", "Main slide", n, |i| {
        format!("/img/cars/42/car-{i}.{:06x}.jpg?w=1200", i * 7919)
    });
    let shift = options.preview_image_shift;
    let preview = build_carousel(dom, "product-slider-preview", "Preview slide", n, move |i| {
        format!("/thumbs/car-{}.webp", (i + shift) % n)
    });
    let next = dom.append(None, "div", &[("class", "swiper-button-next")], "");
    let prev = dom.append(None, "div", &[("class", "swiper-button-prev")], "");

    let ticks = options.transition_ticks;
    let follows = options.preview_follows;
    for (button, forward) in [(next, true), (prev, false)] {
        let (main, preview) = (main.clone(), preview.clone());
        dom.on_click(button, move |d, _| {
            let current = active_index(d, &main);
            let target = if forward {
                (current + 1) % n
            } else {
                (current + n - 1) % n
            };
            activate(d, &main, target, Some(ticks));
            if follows {
                activate(d, &preview, target, None);
            }
        });
    }
    for thumb in &preview {
        let (main, preview) = (main.clone(), preview.clone());
        let target = thumb.index;
        dom.on_click(thumb.id, move |d, _| {
            activate(d, &preview, target, None);
            activate(d, &main, target, Some(ticks));
        });
    }
}

// =============================================================================
// LEAD FORM
// =============================================================================

fn build_form(dom: &mut FakeDom, options: &SiteOptions) {
    let rules = ValidationRule::defaults();
    let form = dom.append(None, "form", &[("class", "lead-form")], "");
    let mut steps = Vec::new();
    for field in FormField::ORDER {
        let step = dom.append(
            Some(form),
            "div",
            &[("class", "form-step"), ("data-step", field.name())],
            "",
        );
        dom.set_visible(step, field == FormField::Zip);
        let input = dom.append(Some(step), "input", &[("name", field.name()), ("type", "text")], "");
        let submits = field == FormField::Phone
            || (field == FormField::Email && options.email_step_submits);
        let button = if submits {
            dom.append(Some(step), "button", &[("type", "submit")], "Get my quote")
        } else {
            dom.append(
                Some(step),
                "button",
                &[("type", "button"), ("data-action", "next")],
                "Continue",
            )
        };
        let error = dom.append(Some(step), "span", &[("class", "error-message")], "");
        dom.set_visible(error, false);
        steps.push((field, step, input, button, error));
    }
    let thanks = dom.append(None, "div", &[("class", "thanks")], "Thank you! A dealer will contact you.");
    dom.set_visible(thanks, false);

    for (position, &(field, step, input, button, error)) in steps.iter().enumerate() {
        let next_step = steps.get(position + 1).map(|s| s.1);
        let rule = rules.iter().find(|r| r.field == field).cloned().unwrap();
        let shape: FieldShape = field.shape();
        let zip_copy = options.zip_error_copy.clone();
        let redirects = options.redirects;
        let clears_after = options.error_clears_after.unwrap_or(0);
        let lost_reads = options.redirect_lost_reads;
        dom.on_click(button, move |d, _| {
            let value = d.value(input).to_string();
            if shape.accepts(&value) {
                d.defer(clears_after, move |d| {
                    d.set_visible(error, false);
                    match next_step {
                        Some(next) => d.defer(1, move |d| {
                            d.set_visible(step, false);
                            d.set_visible(next, true);
                        }),
                        None if redirects => d.defer(2, move |d| {
                            d.set_url(THANK_YOU_URL);
                            d.lose_context(lost_reads);
                        }),
                        None => d.defer(1, move |d| d.set_visible(thanks, true)),
                    }
                });
            } else {
                let copy = match (&zip_copy, field) {
                    (Some(copy), FormField::Zip) => copy.clone(),
                    _ if value.is_empty() => rule.empty_message.clone(),
                    _ => rule.invalid_format_message.clone(),
                };
                d.set_text(error, &copy);
                d.set_visible(error, true);
            }
        });
    }
}

// =============================================================================
// REVIEWS AND GALLERY
// =============================================================================

fn build_reviews(dom: &mut FakeDom, options: &SiteOptions) {
    let panel = dom.append(None, "section", &[("class", "reviews-panel is-collapsed")], "");
    let toggle = dom.append(Some(panel), "button", &[("class", "reviews-toggle")], "Show reviews");
    let detail = dom.append(Some(panel), "div", &[("class", "reviews-detail")], "");
    dom.set_visible(detail, false);
    let _ = dom.append(Some(detail), "p", &[("class", "review")], "Smooth ride, great dealer.");

    let inert = options.toggle_inert;
    let label_sticks = options.toggle_label_sticks;
    let stays_visible = options.detail_stays_visible;
    dom.on_click(toggle, move |d, _| {
        if inert {
            return;
        }
        let expanding = !d.has_class(panel, "is-expanded");
        let (gain, lose, label) = if expanding {
            ("is-expanded", "is-collapsed", "Hide reviews")
        } else {
            ("is-collapsed", "is-expanded", "Show reviews")
        };
        d.remove_class(panel, lose);
        d.add_class(panel, gain);
        if !label_sticks {
            d.set_text(toggle, label);
        }
        if expanding || !stays_visible {
            d.defer(1, move |d| d.set_visible(detail, expanding));
        }
    });

    let m = options.gallery_images;
    let overlay = dom.append(None, "div", &[("class", "gallery-overlay")], "");
    dom.set_visible(overlay, false);
    let counter = dom.append(Some(overlay), "span", &[("class", "gallery-counter")], "");
    let close = dom.append(Some(overlay), "button", &[("class", "gallery-close")], "Close");

    // A leading clone of the last image, as a looping thumbnail strip renders it.
    let thumbs: Vec<(usize, &str)> = std::iter::once((m.saturating_sub(1), "gallery-thumb swiper-slide-duplicate"))
        .chain((0..m).map(|k| (k, "gallery-thumb")))
        .collect();
    let prefix = options
        .counter_label
        .as_ref()
        .map(|label| format!("{label} "))
        .unwrap_or_default();
    for (image, class) in thumbs {
        let thumb = dom.append(Some(detail), "img", &[("class", class), ("src", "/thumbs/x.jpg")], "");
        let prefix = prefix.clone();
        dom.on_click(thumb, move |d, _| {
            d.add_class(overlay, "is-open");
            d.set_visible(overlay, true);
            d.set_text(counter, &format!("{prefix}{} / {m}", image + 1));
        });
    }
    let close_inert = options.close_inert;
    dom.on_click(close, move |d, _| {
        if close_inert {
            return;
        }
        d.remove_class(overlay, "is-open");
        d.defer(1, move |d| d.set_visible(overlay, false));
    });
}

// =============================================================================
// LOCATION
// =============================================================================

fn build_location(dom: &mut FakeDom, options: &SiteOptions) {
    let banner = dom.append(None, "p", &[("class", "location-banner")], "Showing offers near ");
    let _ = dom.append(
        Some(banner),
        "span",
        &[("class", "detected-city")],
        &format!("  {}  ", options.city),
    );
}
