//! Built-in check suite for a product page.

use tokio::time::Instant;
use tracing::info;

use crate::assertion::{expect_eq, CheckMode, CheckReport};
use crate::driver::PageDriver;
use crate::form::{FormField, LeadDetails, StepOutcome};
use crate::page::ProductPage;
use crate::result::{ProbeError, ProbeResult};
use crate::slider::{Carousel, Direction};

/// Malformed zip used to provoke a validation message
pub const MALFORMED_ZIP: &str = "1234";

/// Run every built-in check against `page`, loading it first.
///
/// Individual failures land in the report; only a page that never loads
/// ends the run early.
pub async fn run_suite<D: PageDriver>(
    page: &mut ProductPage<D>,
    lead: &LeadDetails,
    mode: CheckMode,
) -> ProbeResult<CheckReport> {
    let mut report = CheckReport::with_mode(mode);

    let start = Instant::now();
    let loaded = page.goto().await;
    if report.record("page loads", start.elapsed(), loaded).is_none() {
        return Ok(report);
    }

    macro_rules! check {
        ($name:expr, $body:expr) => {{
            if !report.should_continue() {
                return Ok(report);
            }
            let start = Instant::now();
            let result: ProbeResult<()> = $body.await;
            let _ = report.record($name, start.elapsed(), result);
        }};
    }

    check!("carousels agree on load", async {
        page.slider().assert_synchronized().await?;
        page.slider().assert_images_match().await
    });

    check!("next keeps carousels synchronized", async {
        let before = page.slider().active_index(Carousel::Main).await?;
        let total = page.slider().total_slides().await?;
        let slide = page.slider().advance(Direction::Next).await?;
        expect_eq("slider", "position after next", &((before + 1) % total), &slide.position)?;
        page.slider().assert_synchronized().await?;
        page.slider().assert_images_match().await
    });

    check!("previous keeps carousels synchronized", async {
        let _ = page.slider().advance(Direction::Previous).await?;
        page.slider().assert_synchronized().await?;
        page.slider().assert_images_match().await
    });

    check!("preview thumbnail drives main carousel", async {
        let total = page.slider().total_slides().await?;
        let last = total.checked_sub(1).ok_or_else(|| ProbeError::InvalidState {
            message: "main carousel has no slides".to_string(),
        })?;
        let slide = page.slider().jump_to(last).await?;
        expect_eq("slider", "position after jump", &last, &slide.position)?;
        page.slider().assert_synchronized().await?;
        page.slider().assert_images_match().await
    });

    check!("reviews panel toggles both ways", async {
        let reviews = page.reviews();
        let initial = reviews.is_expanded().await?;
        for _ in 0..2 {
            if reviews.toggle().await? {
                reviews.expect_expanded().await?;
            } else {
                reviews.expect_collapsed().await?;
            }
        }
        expect_eq("disclosure", "state after two toggles", &initial, &reviews.is_expanded().await?)
    });

    check!("gallery opens at the first image", async {
        let reviews = page.reviews();
        let was_expanded = reviews.is_expanded().await?;
        if !was_expanded {
            let _ = reviews.toggle().await?;
        }
        let position = page.gallery().open_image(0).await?;
        expect_eq("gallery", "position after opening first image", &1, &position)?;
        let total = page.gallery().total_count().await?;
        if total == 0 {
            return Err(ProbeError::mismatch("gallery", "total", "at least 1", total));
        }
        page.gallery().close().await?;
        if !was_expanded {
            let _ = reviews.toggle().await?;
        }
        Ok::<(), ProbeError>(())
    });

    check!("location banner shows detected city", async {
        page.location().assert_displayed().await.map(|_| ())
    });

    check!("zip rejects a malformed value", async {
        let outcome = page.form_mut().fill_field(FormField::Zip, MALFORMED_ZIP).await?;
        expect_eq("form", "outcome of malformed zip", &StepOutcome::Rejected, &outcome)?;
        let _ = page.form().expect_validation_error(FormField::Zip).await?;
        page.form().expect_field_hidden(FormField::Email).await
    });

    check!("lead form reaches thank-you page", async {
        page.goto().await?;
        page.form_mut().fill_and_submit(lead).await.map(|_| ())
    });

    info!(passed = report.passed(), total = report.total(), "suite finished");
    Ok(report)
}
