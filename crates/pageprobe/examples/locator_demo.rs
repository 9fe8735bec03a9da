//! Locator Demo - semantic roles resolved against a markup contract
//!
//! Shows how component roles turn into CSS and JavaScript for the browser, and
//! how a site with different markup is handled by configuration alone.
//!
//! # Running
//!
//! ```bash
//! cargo run --example locator_demo -p pageprobe
//! ```

#![allow(clippy::uninlined_format_args, clippy::unwrap_used)]

use pageprobe::prelude::*;

fn main() -> ProbeResult<()> {
    println!("=== pageprobe Locator Demo ===\n");

    demo_roles(&MarkupContract::default());
    demo_custom_markup()?;
    demo_shapes();
    demo_identity();

    println!("\n=== Locator Demo Complete ===");
    Ok(())
}

fn demo_roles(markup: &MarkupContract) {
    println!("--- Demo 1: Roles ---\n");

    let roles = [
        ("active main slide", Role::ActiveSlide(Carousel::Main)),
        ("active preview image", Role::ActiveSlideImage(Carousel::Preview)),
        ("next button", Role::NavButton(Direction::Next)),
        ("zip input", Role::FieldInput(FormField::Zip)),
        ("email continue", Role::AdvanceButton(FormField::Email)),
        ("phone submit", Role::FinalizeButton(FormField::Phone)),
        ("zip error", Role::ErrorIndicator(FormField::Zip)),
        ("gallery counter", Role::GalleryCounter),
    ];
    for (name, role) in roles {
        println!("{:<22} {}", name, resolve(markup, role));
    }

    let slide = resolve(markup, Role::SlideAt(Carousel::Preview, 2));
    println!("\nJS for {}:\n  {}", slide, slide.to_js());
}

fn demo_custom_markup() -> ProbeResult<()> {
    println!("\n--- Demo 2: Custom Markup ---\n");

    let markup: MarkupContract = serde_yaml_ng::from_str(
        "main_carousel: '.gallery-main'\nclone_class: slick-cloned\ncurrent_slide_class: slick-current\n",
    )?;
    markup.validate()?;
    println!(
        "active main slide -> {}",
        resolve(&markup, Role::ActiveSlide(Carousel::Main))
    );
    Ok(())
}

fn demo_shapes() {
    println!("\n--- Demo 3: Field Shapes ---\n");

    let samples = [
        (FormField::Zip, "12345"),
        (FormField::Zip, "1234"),
        (FormField::Email, "buyer@example.com"),
        (FormField::Email, "buyer@example"),
        (FormField::Phone, "(555) 123-4567"),
    ];
    for (field, value) in samples {
        let shape = field.shape();
        let verdict = if shape.accepts(value) { "accepted" } else { "rejected" };
        println!("{:<6} {:<20} {} ({})", field, format!("{value:?}"), verdict, shape);
    }
}

fn demo_identity() {
    println!("\n--- Demo 4: Image Identity ---\n");

    for src in [
        "/img/cars/42/front.3fa9c1.jpg?w=1200",
        "https://cdn.test/thumbs/front.webp",
        "/_next/image?url=%2Fcars%2F42%2Ffront.jpg&w=640",
    ] {
        println!("{:<50} -> {}", src, image_identity(src));
    }
}
