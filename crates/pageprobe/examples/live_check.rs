//! Live Check - the built-in suite against a running site
//!
//! # Running
//!
//! ```bash
//! PAGEPROBE_BASE_URL=http://localhost:3000 \
//!     cargo run --example live_check -p pageprobe --features browser -- /cars/42
//! ```

use pageprobe::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ProbeResult<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    let config = ProbeConfig::default()
        .with_page_path(path)
        .with_env_overrides();
    config.validate()?;

    let driver = Arc::new(CdpDriver::launch(&config.browser).await?);
    let mut page = ProductPage::new(Arc::clone(&driver), config)?;
    let lead = LeadDetails::new("12345", "qa@example.com", "5551234567");

    let report = run_suite(&mut page, &lead, CheckMode::Collect).await;
    driver.close().await?;
    let report = report?;

    for outcome in report.outcomes() {
        let mark = if outcome.passed { "PASS" } else { "FAIL" };
        println!("{mark} {}", outcome.name);
        if let Some(message) = &outcome.message {
            println!("     {message}");
        }
    }
    println!("\n{report}");
    report.verify()
}
