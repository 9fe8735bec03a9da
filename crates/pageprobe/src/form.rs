//! Multi-step lead form.
//!
//! The form reveals one field at a time: zip, then email, then phone. Every
//! step but the last is committed with a "continue" control, the last one with
//! a submit control, and a successful submission redirects to a thank-you
//! page. [`LeadForm`] drives that flow and reports what the page did after each
//! commit as a [`StepOutcome`] rather than assuming the next step appears.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::{ProbeConfig, Timeouts};
use crate::driver::PageDriver;
use crate::locator::{resolve, Locator, Role};
use crate::markup::MarkupContract;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Condition;

const COMPONENT: &str = "form";

// =============================================================================
// FIELDS AND STEPS
// =============================================================================

/// A form field, in reveal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    /// 5-digit ZIP code
    Zip,
    /// Email address
    Email,
    /// 10-digit phone number
    Phone,
}

impl FormField {
    /// Reveal order
    pub const ORDER: [Self; 3] = [Self::Zip, Self::Email, Self::Phone];

    /// Field name as rendered in the markup
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }

    /// Field revealed after this one
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Zip => Some(Self::Email),
            Self::Email => Some(Self::Phone),
            Self::Phone => None,
        }
    }

    /// Control that commits this field's step
    #[must_use]
    pub const fn completion_action(self) -> CompletionAction {
        match self.next() {
            Some(_) => CompletionAction::Advance,
            None => CompletionAction::Finalize,
        }
    }

    /// Step during which this field is filled
    #[must_use]
    pub const fn step(self) -> FormStep {
        match self {
            Self::Zip => FormStep::AwaitingZip,
            Self::Email => FormStep::AwaitingEmail,
            Self::Phone => FormStep::AwaitingPhone,
        }
    }

    /// Shape the site accepts
    #[must_use]
    pub const fn shape(self) -> FieldShape {
        match self {
            Self::Zip => FieldShape::Digits(5),
            Self::Email => FieldShape::Email,
            Self::Phone => FieldShape::Digits(10),
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProbeError::InvalidState {
                message: format!("unknown form field '{s}' (expected zip, email or phone)"),
            })
    }
}

/// Where the form flow stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormStep {
    /// Zip input showing
    AwaitingZip,
    /// Email input showing
    AwaitingEmail,
    /// Phone input showing
    AwaitingPhone,
    /// Redirected to the thank-you page
    Terminal,
}

impl FormStep {
    /// Field filled during this step
    #[must_use]
    pub const fn field(self) -> Option<FormField> {
        match self {
            Self::AwaitingZip => Some(FormField::Zip),
            Self::AwaitingEmail => Some(FormField::Email),
            Self::AwaitingPhone => Some(FormField::Phone),
            Self::Terminal => None,
        }
    }
}

/// How a step is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionAction {
    /// Reveal the next step
    Advance,
    /// Submit the whole form
    Finalize,
}

impl CompletionAction {
    /// The other action
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Advance => Self::Finalize,
            Self::Finalize => Self::Advance,
        }
    }
}

impl fmt::Display for CompletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Advance => "advance",
            Self::Finalize => "finalize",
        })
    }
}

/// Input shape a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldShape {
    /// Exactly this many ASCII digits, nothing else
    Digits(usize),
    /// `local@domain.tld`
    Email,
}

impl FieldShape {
    /// Whether the site would accept `value`
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Digits(n) => value.len() == n && value.bytes().all(|b| b.is_ascii_digit()),
            Self::Email => {
                let Some((local, domain)) = value.split_once('@') else {
                    return false;
                };
                let Some((host, tld)) = domain.rsplit_once('.') else {
                    return false;
                };
                let clean = |part: &str| {
                    !part.is_empty() && !part.contains(|c: char| c.is_whitespace() || c == '@')
                };
                clean(local) && clean(host) && clean(tld)
            }
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digits(n) => write!(f, "exactly {n} digits"),
            Self::Email => f.write_str("local@domain.tld"),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// What the page did after a step was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The next step's input appeared
    Advanced(FormStep),
    /// An error indicator appeared on the step
    Rejected,
    /// The address moved to the terminal page
    Completed,
    /// Nothing observable happened within the settle bound
    Stalled,
}

/// Progress of one pass through the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSession {
    /// Step currently showing
    pub current: FormStep,
    /// Last value attempted per field
    pub values: BTreeMap<FormField, String>,
    /// Fields whose last attempt was rejected
    pub errors: BTreeSet<FormField>,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSession {
    /// Fresh session at the zip step
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: FormStep::AwaitingZip,
            values: BTreeMap::new(),
            errors: BTreeSet::new(),
        }
    }

    fn apply(&mut self, field: FormField, value: &str, outcome: StepOutcome) {
        let _ = self.values.insert(field, value.to_string());
        match outcome {
            StepOutcome::Advanced(step) => {
                let _ = self.errors.remove(&field);
                self.current = step;
            }
            StepOutcome::Completed => {
                let _ = self.errors.remove(&field);
                self.current = FormStep::Terminal;
            }
            StepOutcome::Rejected => {
                let _ = self.errors.insert(field);
            }
            StepOutcome::Stalled => {}
        }
    }
}

/// Values for a complete submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadDetails {
    /// ZIP code
    pub zip: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
}

impl LeadDetails {
    /// Create lead details
    pub fn new(zip: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            zip: zip.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Value for a field
    #[must_use]
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Zip => &self.zip,
            FormField::Email => &self.email,
            FormField::Phone => &self.phone,
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Multi-step form controller
#[derive(Debug)]
pub struct LeadForm<D: PageDriver> {
    driver: Arc<D>,
    markup: Arc<MarkupContract>,
    timeouts: Timeouts,
    messages: BTreeMap<FormField, (Regex, String)>,
    terminal: Regex,
    session: FormSession,
}

impl<D: PageDriver> LeadForm<D> {
    /// Build the controller; fails when a field has no validation rule
    pub fn new(driver: Arc<D>, markup: Arc<MarkupContract>, config: &ProbeConfig) -> ProbeResult<Self> {
        let mut messages = BTreeMap::new();
        for field in FormField::ORDER {
            let rule = config.rule(field).ok_or_else(|| {
                ProbeError::config(format!("no validation rule for '{field}'"))
            })?;
            let described = format!(
                "{:?} or {:?}",
                rule.empty_message, rule.invalid_format_message
            );
            let _ = messages.insert(field, (rule.message_pattern()?, described));
        }
        Ok(Self {
            driver,
            markup,
            timeouts: config.timeouts,
            messages,
            terminal: config.terminal_pattern()?,
            session: FormSession::new(),
        })
    }

    /// Current session state
    #[must_use]
    pub const fn session(&self) -> &FormSession {
        &self.session
    }

    /// Start a fresh session, e.g. after re-navigating
    pub fn reset(&mut self) {
        self.session = FormSession::new();
    }

    /// Fill one field, commit its step and report what the page did.
    ///
    /// # Errors
    ///
    /// `FieldNotReached` if the input never shows, `UnexpectedCompletionAction`
    /// if the step only offers the wrong control, `ElementNotFound` if it
    /// offers neither.
    #[instrument(skip(self, value))]
    pub async fn fill_field(&mut self, field: FormField, value: &str) -> ProbeResult<StepOutcome> {
        self.expect_field_visible(field).await?;
        let input = resolve(&self.markup, Role::FieldInput(field));
        self.driver.fill(&input, value).await?;
        let _ = self.session.values.insert(field, value.to_string());

        let expected = field.completion_action();
        let control = self.action_locator(field, expected);
        if !self.driver.is_visible(&control).await? {
            let other = self.action_locator(field, expected.other());
            if self.driver.is_visible(&other).await? {
                return Err(ProbeError::UnexpectedCompletionAction {
                    field: field.name().to_string(),
                    expected: expected.to_string(),
                    found: expected.other().to_string(),
                });
            }
            return Err(ProbeError::not_found(COMPONENT, control.to_string()));
        }

        // A message left over from an earlier attempt is not a verdict on this one.
        let indicator = resolve(&self.markup, Role::ErrorIndicator(field));
        let shown_before = if self.driver.is_visible(&indicator).await? {
            Some(self.driver.all_text_contents(&indicator).await?)
        } else {
            None
        };
        self.driver.click(&control).await?;

        let outcome = self.observe(field, shown_before).await?;
        info!(?outcome, "step committed");
        self.session.apply(field, value, outcome);
        Ok(outcome)
    }

    fn action_locator(&self, field: FormField, action: CompletionAction) -> Locator {
        let role = match action {
            CompletionAction::Advance => Role::AdvanceButton(field),
            CompletionAction::Finalize => Role::FinalizeButton(field),
        };
        resolve(&self.markup, role)
    }

    /// Wait out the settle bound for the next step or a fresh error.
    ///
    /// With an error already showing before the commit, only a change to its
    /// text counts early; if it is still up when the bound expires the page
    /// kept rejecting the value.
    async fn observe(
        &self,
        field: FormField,
        shown_before: Option<Vec<String>>,
    ) -> ProbeResult<StepOutcome> {
        let indicator = resolve(&self.markup, Role::ErrorIndicator(field));
        let stale = shown_before.is_some();
        let rejected = match shown_before {
            Some(texts) => Condition::VisibleChangedFrom(indicator.clone(), texts),
            None => Condition::Visible(indicator.clone()),
        };
        let (conditions, success) = match field.next() {
            Some(next) => (
                [
                    Condition::Visible(resolve(&self.markup, Role::FieldInput(next))),
                    rejected,
                ],
                StepOutcome::Advanced(next.step()),
            ),
            None => (
                [Condition::UrlMatches(self.terminal.clone()), rejected],
                StepOutcome::Completed,
            ),
        };
        let result = self
            .timeouts
            .waiter(self.timeouts.settle_ms)
            .first_of(self.driver.as_ref(), &conditions)
            .await?;
        Ok(match result.matched {
            Some(0) => success,
            Some(_) => StepOutcome::Rejected,
            None => {
                if stale && self.driver.is_visible(&indicator).await? {
                    StepOutcome::Rejected
                } else {
                    StepOutcome::Stalled
                }
            }
        })
    }

    /// Fill every field in order and wait for the thank-you page.
    ///
    /// Returns the terminal address.
    #[instrument(skip_all)]
    pub async fn fill_and_submit(&mut self, details: &LeadDetails) -> ProbeResult<String> {
        for field in FormField::ORDER {
            match self.fill_field(field, details.value(field)).await? {
                StepOutcome::Rejected => {
                    let shown = self
                        .driver
                        .all_text_contents(&resolve(&self.markup, Role::ErrorIndicator(field)))
                        .await?;
                    return Err(ProbeError::mismatch(
                        COMPONENT,
                        format!("outcome of step '{field}'"),
                        "accepted",
                        format!("rejected ({})", shown.join(" | ").trim()),
                    ));
                }
                StepOutcome::Stalled => {
                    if let Some(next) = field.next() {
                        return Err(ProbeError::FieldNotReached {
                            field: next.name().to_string(),
                            timeout_ms: self.timeouts.settle_ms,
                        });
                    }
                }
                StepOutcome::Advanced(_) | StepOutcome::Completed => {}
            }
        }
        self.expect_terminal_redirect().await
    }

    /// Wait for a validation message on a field's step.
    ///
    /// Returns the matching message text.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` if no indicator shows; `AssertionMismatch` if the
    /// indicators show some other text.
    #[instrument(skip(self))]
    pub async fn expect_validation_error(&self, field: FormField) -> ProbeResult<String> {
        let (pattern, described) = self
            .messages
            .get(&field)
            .ok_or_else(|| ProbeError::config(format!("no validation rule for '{field}'")))?;
        let indicator = resolve(&self.markup, Role::ErrorIndicator(field));

        let appeared = self
            .timeouts
            .waiter(self.timeouts.element_ms)
            .until(self.driver.as_ref(), &Condition::Visible(indicator.clone()))
            .await?;
        if !appeared.success {
            return Err(ProbeError::not_found(COMPONENT, indicator.to_string()));
        }

        let matched = self
            .timeouts
            .waiter(self.timeouts.settle_ms)
            .until(
                self.driver.as_ref(),
                &Condition::TextMatches(indicator.clone(), pattern.clone()),
            )
            .await?;
        let shown = self.driver.all_text_contents(&indicator).await?;
        if !matched.success {
            let observed: Vec<&str> = shown.iter().map(|t| t.trim()).collect();
            return Err(ProbeError::mismatch(
                COMPONENT,
                format!("validation message for '{field}'"),
                described,
                format!("{observed:?}"),
            ));
        }
        let message = shown
            .into_iter()
            .find(|text| pattern.is_match(text))
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        debug!(%message, "validation message shown");
        Ok(message)
    }

    /// Wait for the address to reach the thank-you page
    #[instrument(skip(self))]
    pub async fn expect_terminal_redirect(&mut self) -> ProbeResult<String> {
        let waiter = self.timeouts.waiter(self.timeouts.redirect_ms);
        let result = waiter
            .until(self.driver.as_ref(), &Condition::UrlMatches(self.terminal.clone()))
            .await?;
        let url = self.driver.current_url().await?;
        if !result.success || !self.terminal.is_match(&url) {
            return Err(ProbeError::TerminalNotReached {
                pattern: self.terminal.as_str().to_string(),
                observed: url,
                timeout_ms: waiter.options().timeout_ms,
            });
        }
        info!(%url, "reached terminal page");
        self.session.current = FormStep::Terminal;
        Ok(url)
    }

    /// Wait for a field's input to show
    pub async fn expect_field_visible(&self, field: FormField) -> ProbeResult<()> {
        let input = resolve(&self.markup, Role::FieldInput(field));
        let waiter = self.timeouts.waiter(self.timeouts.element_ms);
        if waiter
            .until(self.driver.as_ref(), &Condition::Visible(input))
            .await?
            .success
        {
            Ok(())
        } else {
            Err(ProbeError::FieldNotReached {
                field: field.name().to_string(),
                timeout_ms: waiter.options().timeout_ms,
            })
        }
    }

    /// Assert a field's input is not showing
    pub async fn expect_field_hidden(&self, field: FormField) -> ProbeResult<()> {
        let input = resolve(&self.markup, Role::FieldInput(field));
        let hidden = self
            .timeouts
            .waiter(self.timeouts.settle_ms)
            .until(self.driver.as_ref(), &Condition::Hidden(input))
            .await?;
        if hidden.success {
            Ok(())
        } else {
            Err(ProbeError::mismatch(
                COMPONENT,
                format!("visibility of field '{field}'"),
                "hidden",
                "visible",
            ))
        }
    }
}
