use std::sync::Arc;
use std::time::Duration;

use cdp_adapter::fixture::{FixtureDriver, FixturePage};
use cdp_adapter::{AdapterErrorKind, BrowserDriver, CaptureTarget, DriverPool};
use uitest_core_types::ElementInfo;

fn driver() -> FixtureDriver {
    FixtureDriver::new().with_page(
        "https://app.test/",
        FixturePage::new("Home")
            .with_element(ElementInfo::new(0, "button").with_test_id("cta").with_text("Start"))
            .with_screenshot(vec![1, 2, 3]),
    )
}

#[tokio::test]
async fn pool_limits_open_pages_and_releases_on_drop() {
    let pool = DriverPool::new(Arc::new(driver()), 1);
    let first = pool.open("https://app.test/", Duration::from_secs(1)).await.unwrap();
    assert_eq!(pool.available(), 0);

    let blocked = pool.open("https://app.test/", Duration::from_millis(20)).await;
    assert_eq!(blocked.err().unwrap().kind, AdapterErrorKind::NavTimeout);

    drop(first);
    assert_eq!(pool.available(), 1);
    let second = pool.open("https://app.test/", Duration::from_secs(1)).await.unwrap();
    assert_eq!(second.count_matches("[data-testid=\"cta\"]").await.unwrap(), 1);
}

#[tokio::test]
async fn closed_pool_rejects_new_pages() {
    let pool = DriverPool::new(Arc::new(driver()), 2);
    pool.close();
    let err = pool.open("https://app.test/", Duration::from_secs(1)).await.err().unwrap();
    assert_eq!(err.kind, AdapterErrorKind::PoolClosed);
}

#[tokio::test]
async fn element_capture_requires_a_match() {
    let fixture = driver();
    let page = fixture.open("https://app.test/", Duration::from_secs(1)).await.unwrap();

    let shot = page.screenshot(&CaptureTarget::Element("text=Start".into())).await.unwrap();
    assert_eq!(shot, vec![1, 2, 3]);

    let err = page
        .screenshot(&CaptureTarget::Element("#missing".into()))
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind, AdapterErrorKind::TargetNotFound);
}
