//! Reviews panel and gallery against the fake product page.

#![allow(clippy::unwrap_used)]

mod common;

use common::{loaded_page, SiteOptions};
use pageprobe::{DisclosureState, ProbeError};

#[tokio::test(start_paused = true)]
async fn test_panel_starts_collapsed() {
    let page = loaded_page(SiteOptions::default()).await;
    assert!(!page.reviews().is_expanded().await.unwrap());
    page.reviews().expect_collapsed().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_toggle_twice_is_identity() {
    let page = loaded_page(SiteOptions::default()).await;
    let reviews = page.reviews();

    assert!(reviews.toggle().await.unwrap());
    reviews.expect_expanded().await.unwrap();

    assert!(!reviews.toggle().await.unwrap());
    reviews.expect_collapsed().await.unwrap();
    assert!(!reviews.is_expanded().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_expect_expanded_on_collapsed_panel_names_state_class() {
    let page = loaded_page(SiteOptions::default()).await;
    let err = page.reviews().expect_expanded().await.unwrap_err();
    match err {
        ProbeError::AssertionMismatch {
            what,
            expected,
            actual,
            ..
        } => {
            assert_eq!(what, "state class");
            assert_eq!(expected, "expanded");
            assert_eq!(actual, "collapsed");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_gallery_opens_at_requested_image() {
    let page = loaded_page(SiteOptions::default()).await;
    let _ = page.reviews().toggle().await.unwrap();
    let gallery = page.gallery();

    assert_eq!(gallery.thumbnail_count().await.unwrap(), 4);
    assert_eq!(gallery.open_image(0).await.unwrap(), 1);
    assert_eq!(gallery.total_count().await.unwrap(), 4);
    gallery.close().await.unwrap();
    assert!(!gallery.is_open().await.unwrap());

    assert_eq!(gallery.open_image(3).await.unwrap(), 4);
    assert_eq!(gallery.counter().await.unwrap(), (4, 4));
    gallery.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_state_reflects_panel_and_gallery() {
    let page = loaded_page(SiteOptions::default()).await;
    let reviews = page.reviews();
    assert_eq!(
        reviews.state().await.unwrap(),
        DisclosureState {
            expanded: false,
            gallery_open: false,
            gallery_index: 0,
            gallery_total: 0,
        }
    );

    let _ = reviews.toggle().await.unwrap();
    let _ = reviews.gallery().open_image(1).await.unwrap();
    assert_eq!(
        reviews.state().await.unwrap(),
        DisclosureState {
            expanded: true,
            gallery_open: true,
            gallery_index: 2,
            gallery_total: 4,
        }
    );

    reviews.gallery().close().await.unwrap();
    let state = reviews.state().await.unwrap();
    assert!(state.expanded);
    assert!(!state.gallery_open);
}

#[tokio::test(start_paused = true)]
async fn test_open_out_of_range_is_invalid_state() {
    let page = loaded_page(SiteOptions::default()).await;
    let _ = page.reviews().toggle().await.unwrap();
    let err = page.gallery().open_image(4).await.unwrap_err();
    assert!(matches!(err, ProbeError::InvalidState { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_thumbnails_inside_collapsed_panel_are_not_clickable() {
    let page = loaded_page(SiteOptions::default()).await;
    let err = page.gallery().open_image(0).await.unwrap_err();
    assert!(matches!(err, ProbeError::Driver { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_single_image_gallery() {
    let page = loaded_page(SiteOptions {
        gallery_images: 1,
        ..SiteOptions::default()
    })
    .await;
    let _ = page.reviews().toggle().await.unwrap();
    assert_eq!(page.gallery().open_image(0).await.unwrap(), 1);
    assert_eq!(page.gallery().counter().await.unwrap(), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_labelled_counter_is_read() {
    let page = loaded_page(SiteOptions {
        counter_label: Some("Photo".to_string()),
        ..SiteOptions::default()
    })
    .await;
    let _ = page.reviews().toggle().await.unwrap();
    assert_eq!(page.gallery().open_image(1).await.unwrap(), 2);
    assert_eq!(page.gallery().counter().await.unwrap(), (2, 4));
}

fn mismatch_parts(err: ProbeError) -> (String, String, String) {
    match err {
        ProbeError::AssertionMismatch {
            what,
            expected,
            actual,
            ..
        } => (what, expected, actual),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_toggle_that_never_flips_is_reported() {
    let page = loaded_page(SiteOptions {
        toggle_inert: true,
        ..SiteOptions::default()
    })
    .await;
    let err = page.reviews().toggle().await.unwrap_err();
    let (what, expected, actual) = mismatch_parts(err);
    assert_eq!(what, "panel state after toggle");
    assert_eq!(expected, "expanded");
    assert_eq!(actual, "collapsed");
}

#[tokio::test(start_paused = true)]
async fn test_stale_toggle_label_is_named() {
    let page = loaded_page(SiteOptions {
        toggle_label_sticks: true,
        ..SiteOptions::default()
    })
    .await;
    assert!(page.reviews().toggle().await.unwrap());
    let err = page.reviews().expect_expanded().await.unwrap_err();
    let (what, expected, actual) = mismatch_parts(err);
    assert_eq!(what, "toggle label");
    assert_eq!(expected, "\"Hide reviews\"");
    assert_eq!(actual, "Show reviews");
}

#[tokio::test(start_paused = true)]
async fn test_detail_left_showing_after_collapse_is_named() {
    let page = loaded_page(SiteOptions {
        detail_stays_visible: true,
        ..SiteOptions::default()
    })
    .await;
    let reviews = page.reviews();
    assert!(reviews.toggle().await.unwrap());
    reviews.expect_expanded().await.unwrap();
    assert!(!reviews.toggle().await.unwrap());

    let err = reviews.expect_collapsed().await.unwrap_err();
    let (what, expected, actual) = mismatch_parts(err);
    assert_eq!(what, "detail visibility");
    assert_eq!(expected, "hidden");
    assert_eq!(actual, "visible");
}

#[tokio::test(start_paused = true)]
async fn test_gallery_that_never_closes_is_reported() {
    let page = loaded_page(SiteOptions {
        close_inert: true,
        ..SiteOptions::default()
    })
    .await;
    let _ = page.reviews().toggle().await.unwrap();
    assert_eq!(page.gallery().open_image(0).await.unwrap(), 1);

    let err = page.gallery().close().await.unwrap_err();
    let (what, expected, actual) = mismatch_parts(err);
    assert_eq!(what, "overlay state");
    assert_eq!(expected, "closed");
    assert_eq!(actual, "open");
    assert!(page.gallery().is_open().await.unwrap());
}
