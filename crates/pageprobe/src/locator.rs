//! Locator abstraction for element selection.
//!
//! Locators are plain values: a chain of compound selectors, each optionally
//! narrowed to its nth match. They never hold an element handle, so every use
//! re-resolves against the live page. Semantic roles ("zip input", "active
//! main slide") are mapped to locators by the pure function [`resolve`].
//!
//! # Design Philosophy
//!
//! - **Re-resolution**: a locator is rebuilt at point of use, never cached
//!   across a suspension point
//! - **Structured**: selectors are data, rendered to CSS or JS only at the
//!   driver boundary
//! - **Declarative**: role resolution has no state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::form::FormField;
use crate::markup::MarkupContract;
use crate::result::{ProbeError, ProbeResult};
use crate::slider::{Carousel, Direction};

/// Attribute condition inside a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[name]`
    Present(String),
    /// `[name="value"]`
    Equals(String, String),
}

/// A compound selector: tag, id, classes, attributes and excluded classes,
/// optionally narrowed to the nth element it matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    without_classes: Vec<String>,
    attributes: Vec<AttrMatch>,
    nth: Option<usize>,
}

impl Selector {
    /// Match any element
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Match by tag name
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into().to_ascii_lowercase()),
            ..Self::default()
        }
    }

    /// Match by a single class
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::any().with_class(class)
    }

    /// Parse a compound CSS selector such as `button.next[data-action="go"]:not(.hidden)`.
    ///
    /// Combinators are not supported; use [`Locator::descendant`] for nesting.
    pub fn parse(input: &str) -> ProbeResult<Self> {
        SelectorParser::new(input).parse()
    }

    /// Require an additional class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Exclude elements carrying a class
    #[must_use]
    pub fn without_class(mut self, class: impl Into<String>) -> Self {
        self.without_classes.push(class.into());
        self
    }

    /// Require an attribute with an exact value
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push(AttrMatch::Equals(name.into(), value.into()));
        self
    }

    /// Require an attribute to be present
    #[must_use]
    pub fn has_attr(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttrMatch::Present(name.into()));
        self
    }

    /// Narrow to the nth (0-based) match
    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    /// The nth narrowing, if any
    #[must_use]
    pub const fn nth_index(&self) -> Option<usize> {
        self.nth
    }

    /// Render as CSS (the nth narrowing is not representable and is omitted)
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(tag) = &self.tag {
            css.push_str(tag);
        }
        if let Some(id) = &self.id {
            css.push('#');
            css.push_str(id);
        }
        for class in &self.classes {
            css.push('.');
            css.push_str(class);
        }
        for attr in &self.attributes {
            match attr {
                AttrMatch::Present(name) => css.push_str(&format!("[{name}]")),
                AttrMatch::Equals(name, value) => css.push_str(&format!("[{name}={value:?}]")),
            }
        }
        for class in &self.without_classes {
            css.push_str(&format!(":not(.{class})"));
        }
        if css.is_empty() {
            css.push('*');
        }
        css
    }

    /// Test an element described by its tag and attributes (`class` included).
    #[must_use]
    pub fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if attributes.get("id") != Some(id) {
                return false;
            }
        }
        let classes: Vec<&str> = attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        if self
            .without_classes
            .iter()
            .any(|c| classes.contains(&c.as_str()))
        {
            return false;
        }
        self.attributes.iter().all(|attr| match attr {
            AttrMatch::Present(name) => attributes.contains_key(name),
            AttrMatch::Equals(name, value) => attributes.get(name) == Some(value),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_css())?;
        if let Some(n) = self.nth {
            write!(f, " >> nth={n}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Selector {
    type Error = ProbeError;

    fn try_from(value: String) -> ProbeResult<Self> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_css()
    }
}

struct SelectorParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> SelectorParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, message: &str) -> ProbeError {
        ProbeError::config(format!("invalid selector {:?}: {message}", self.input))
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn expect(&mut self, expected: char) -> ProbeResult<()> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{expected}'"))),
        }
    }

    fn attr_value(&mut self) -> ProbeResult<String> {
        match self.chars.peek().map(|&(_, c)| c) {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut out = String::new();
                loop {
                    match self.chars.next() {
                        Some((_, c)) if c == quote => return Ok(out),
                        Some((_, c)) => out.push(c),
                        None => return Err(self.error("unterminated attribute value")),
                    }
                }
            }
            _ => {
                let value = self.ident();
                if value.is_empty() {
                    Err(self.error("empty attribute value"))
                } else {
                    Ok(value)
                }
            }
        }
    }

    fn parse(mut self) -> ProbeResult<Selector> {
        let mut selector = Selector::any();
        let input = self.input.trim();
        if input.is_empty() {
            return Err(self.error("empty selector"));
        }
        if input == "*" {
            return Ok(selector);
        }
        self.chars = input.char_indices().peekable();

        let tag = self.ident();
        if !tag.is_empty() {
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some((_, c)) = self.chars.next() {
            match c {
                '.' => {
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.error("empty class name"));
                    }
                    selector.classes.push(class);
                }
                '#' => {
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.error("empty id"));
                    }
                    selector.id = Some(id);
                }
                '[' => {
                    let name = self.ident();
                    if name.is_empty() {
                        return Err(self.error("empty attribute name"));
                    }
                    match self.chars.next() {
                        Some((_, ']')) => selector.attributes.push(AttrMatch::Present(name)),
                        Some((_, '=')) => {
                            let value = self.attr_value()?;
                            self.expect(']')?;
                            selector.attributes.push(AttrMatch::Equals(name, value));
                        }
                        _ => return Err(self.error("malformed attribute condition")),
                    }
                }
                ':' => {
                    let pseudo = self.ident();
                    if pseudo != "not" {
                        return Err(self.error(&format!("unsupported pseudo-class :{pseudo}")));
                    }
                    self.expect('(')?;
                    self.expect('.')?;
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.error("empty class in :not()"));
                    }
                    self.expect(')')?;
                    selector.without_classes.push(class);
                }
                other => return Err(self.error(&format!("unexpected character '{other}'"))),
            }
        }
        Ok(selector)
    }
}

/// A chain of selectors, each matched among the descendants of the previous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    chain: Vec<Selector>,
}

impl Locator {
    /// Create a locator from a root selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            chain: vec![selector],
        }
    }

    /// Match `selector` among descendants of this locator's matches
    #[must_use]
    pub fn descendant(mut self, selector: Selector) -> Self {
        self.chain.push(selector);
        self
    }

    /// Narrow the last segment to its nth match
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.chain.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    /// The selector chain
    #[must_use]
    pub fn chain(&self) -> &[Selector] {
        &self.chain
    }

    /// Render as a CSS descendant selector (nth narrowing omitted)
    #[must_use]
    pub fn to_css(&self) -> String {
        self.chain
            .iter()
            .map(Selector::to_css)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render as a JavaScript expression evaluating to the array of matched elements
    #[must_use]
    pub fn to_js(&self) -> String {
        let mut js = String::from("(() => { let found = [document];");
        for segment in &self.chain {
            js.push_str(&format!(
                " found = [...new Set(found.flatMap(root => Array.from(root.querySelectorAll({:?}))))];",
                segment.to_css()
            ));
            if let Some(n) = segment.nth {
                js.push_str(&format!(" found = found.length > {n} ? [found[{n}]] : [];"));
            }
        }
        js.push_str(" return found; })()");
        js
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.chain.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}

/// Semantic roles a component can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Every slide element in a carousel, clones included
    Slides(Carousel),
    /// The slide element at a physical (DOM order) position
    SlideAt(Carousel, usize),
    /// The image inside the slide at a physical position
    SlideImage(Carousel, usize),
    /// The slide carrying the current marker
    ActiveSlide(Carousel),
    /// The image inside the current slide
    ActiveSlideImage(Carousel),
    /// Main carousel navigation control
    NavButton(Direction),
    /// Container of a form step
    FieldStep(FormField),
    /// Input of a form step
    FieldInput(FormField),
    /// The "continue" control of a step
    AdvanceButton(FormField),
    /// The final submission control of a step
    FinalizeButton(FormField),
    /// Error indicators of a step
    ErrorIndicator(FormField),
    /// Disclosure panel container
    PanelContainer,
    /// Disclosure toggle control
    PanelToggle,
    /// Disclosure detail region
    PanelDetail,
    /// Every gallery thumbnail, clones included
    GalleryThumbnails,
    /// Gallery thumbnail at a physical position
    GalleryThumbnailAt(usize),
    /// Gallery overlay
    GalleryOverlay,
    /// Gallery "m / n" counter
    GalleryCounter,
    /// Gallery close control
    GalleryClose,
    /// Element carrying the detected city
    DetectedCity,
    /// Element containing the location phrase and city
    LocationBanner,
}

/// Resolve a semantic role to a freshly built locator.
#[must_use]
pub fn resolve(markup: &MarkupContract, role: Role) -> Locator {
    let carousel_root = |carousel: Carousel| match carousel {
        Carousel::Main => Locator::new(markup.main_carousel.clone()),
        Carousel::Preview => Locator::new(markup.preview_carousel.clone()),
    };
    let image = |carousel: Carousel| {
        let alt = match carousel {
            Carousel::Main => &markup.main_image_alt,
            Carousel::Preview => &markup.preview_image_alt,
        };
        Selector::tag("img").with_attr("alt", alt.clone())
    };
    let step = |field: FormField| {
        Locator::new(markup.form.clone()).descendant(
            markup
                .form_step
                .clone()
                .with_attr(markup.step_attribute.clone(), field.name()),
        )
    };

    match role {
        Role::Slides(c) => carousel_root(c).descendant(markup.slide.clone()),
        Role::SlideAt(c, i) => carousel_root(c).descendant(markup.slide.clone().nth(i)),
        Role::SlideImage(c, i) => carousel_root(c)
            .descendant(markup.slide.clone().nth(i))
            .descendant(image(c)),
        Role::ActiveSlide(c) => carousel_root(c).descendant(
            markup
                .slide
                .clone()
                .with_class(markup.current_slide_class.clone())
                .nth(0),
        ),
        Role::ActiveSlideImage(c) => resolve(markup, Role::ActiveSlide(c)).descendant(image(c)),
        Role::NavButton(Direction::Next) => Locator::new(markup.next_button.clone()),
        Role::NavButton(Direction::Previous) => Locator::new(markup.prev_button.clone()),
        Role::FieldStep(f) => step(f),
        Role::FieldInput(f) => step(f).descendant(
            Selector::tag("input").with_attr(markup.field_name_attribute.clone(), f.name()),
        ),
        Role::AdvanceButton(f) => step(f).descendant(markup.advance_button.clone()),
        Role::FinalizeButton(f) => step(f).descendant(markup.finalize_button.clone()),
        Role::ErrorIndicator(f) => step(f).descendant(markup.error_indicator.clone()),
        Role::PanelContainer => Locator::new(markup.panel.clone()),
        Role::PanelToggle => Locator::new(markup.panel.clone()).descendant(markup.panel_toggle.clone()),
        Role::PanelDetail => Locator::new(markup.panel.clone()).descendant(markup.panel_detail.clone()),
        Role::GalleryThumbnails => {
            Locator::new(markup.panel.clone()).descendant(markup.gallery_thumbnail.clone())
        }
        Role::GalleryThumbnailAt(i) => Locator::new(markup.panel.clone())
            .descendant(markup.gallery_thumbnail.clone().nth(i)),
        Role::GalleryOverlay => Locator::new(markup.gallery_overlay.clone()),
        Role::GalleryCounter => {
            Locator::new(markup.gallery_overlay.clone()).descendant(markup.gallery_counter.clone())
        }
        Role::GalleryClose => {
            Locator::new(markup.gallery_overlay.clone()).descendant(markup.gallery_close.clone())
        }
        Role::DetectedCity => Locator::new(markup.detected_city.clone()),
        Role::LocationBanner => Locator::new(markup.location_banner.clone()),
    }
}
