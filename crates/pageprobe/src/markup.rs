//! DOM/markup contract the components depend on.
//!
//! Every class name, attribute and selector a component reads lives here, so a
//! site that renders the same widgets with different markup is handled by
//! configuration rather than code.

use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};

/// Markup contract for the product page widgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupContract {
    /// Main carousel container
    pub main_carousel: Selector,
    /// Preview (thumbnail) carousel container
    pub preview_carousel: Selector,
    /// Slide element inside either carousel
    pub slide: Selector,
    /// Class marking the current slide
    pub current_slide_class: String,
    /// Class marking clone slides inserted for infinite looping
    pub clone_class: String,
    /// Attribute carrying a slide's logical index
    pub slide_index_attribute: String,
    /// `alt` value of main-slide images
    pub main_image_alt: String,
    /// `alt` value of preview-slide images
    pub preview_image_alt: String,
    /// Next navigation control
    pub next_button: Selector,
    /// Previous navigation control
    pub prev_button: Selector,

    /// Lead form container
    pub form: Selector,
    /// Step container inside the form
    pub form_step: Selector,
    /// Attribute naming the field a step belongs to
    pub step_attribute: String,
    /// Attribute naming an input's field
    pub field_name_attribute: String,
    /// "Continue" control of a step
    pub advance_button: Selector,
    /// Final submission control of a step
    pub finalize_button: Selector,
    /// Element carrying validation error text
    pub error_indicator: Selector,

    /// Disclosure panel container
    pub panel: Selector,
    /// Container class while expanded
    pub expanded_class: String,
    /// Container class while collapsed
    pub collapsed_class: String,
    /// Toggle control inside the panel
    pub panel_toggle: Selector,
    /// Detail region inside the panel
    pub panel_detail: Selector,
    /// Gallery thumbnail inside the panel
    pub gallery_thumbnail: Selector,
    /// Gallery overlay
    pub gallery_overlay: Selector,
    /// Overlay class while visible
    pub overlay_open_class: String,
    /// Counter inside the overlay
    pub gallery_counter: Selector,
    /// Close control inside the overlay
    pub gallery_close: Selector,

    /// Element carrying the detected city
    pub detected_city: Selector,
    /// Element containing the location phrase
    pub location_banner: Selector,
}

impl Default for MarkupContract {
    fn default() -> Self {
        Self {
            main_carousel: Selector::class("product-slider-main"),
            preview_carousel: Selector::class("product-slider-preview"),
            slide: Selector::class("swiper-slide"),
            current_slide_class: "swiper-slide-active".to_string(),
            clone_class: "swiper-slide-duplicate".to_string(),
            slide_index_attribute: "data-swiper-slide-index".to_string(),
            main_image_alt: "Main slide".to_string(),
            preview_image_alt: "Preview slide".to_string(),
            next_button: Selector::class("swiper-button-next"),
            prev_button: Selector::class("swiper-button-prev"),

            form: Selector::tag("form").with_class("lead-form"),
            form_step: Selector::class("form-step"),
            step_attribute: "data-step".to_string(),
            field_name_attribute: "name".to_string(),
            advance_button: Selector::tag("button").with_attr("data-action", "next"),
            finalize_button: Selector::tag("button").with_attr("type", "submit"),
            error_indicator: Selector::tag("span").with_class("error-message"),

            panel: Selector::class("reviews-panel"),
            expanded_class: "is-expanded".to_string(),
            collapsed_class: "is-collapsed".to_string(),
            panel_toggle: Selector::class("reviews-toggle"),
            panel_detail: Selector::class("reviews-detail"),
            gallery_thumbnail: Selector::class("gallery-thumb"),
            gallery_overlay: Selector::class("gallery-overlay"),
            overlay_open_class: "is-open".to_string(),
            gallery_counter: Selector::class("gallery-counter"),
            gallery_close: Selector::class("gallery-close"),

            detected_city: Selector::class("detected-city"),
            location_banner: Selector::class("location-banner"),
        }
    }
}

impl MarkupContract {
    /// Check that every class and attribute name is usable
    pub fn validate(&self) -> ProbeResult<()> {
        let names = [
            ("current_slide_class", &self.current_slide_class),
            ("clone_class", &self.clone_class),
            ("slide_index_attribute", &self.slide_index_attribute),
            ("step_attribute", &self.step_attribute),
            ("field_name_attribute", &self.field_name_attribute),
            ("expanded_class", &self.expanded_class),
            ("collapsed_class", &self.collapsed_class),
            ("overlay_open_class", &self.overlay_open_class),
        ];
        for (key, value) in names {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(ProbeError::config(format!(
                    "markup.{key} must be a single non-empty name, got {value:?}"
                )));
            }
        }
        if self.expanded_class == self.collapsed_class {
            return Err(ProbeError::config(
                "markup.expanded_class and markup.collapsed_class must differ",
            ));
        }
        if self.current_slide_class == self.clone_class {
            return Err(ProbeError::config(
                "markup.current_slide_class and markup.clone_class must differ",
            ));
        }
        Ok(())
    }
}

/// True when a class attribute value contains `class` as a whole word
#[must_use]
pub fn has_class(class_attr: Option<&str>, class: &str) -> bool {
    class_attr.is_some_and(|attr| attr.split_whitespace().any(|c| c == class))
}
