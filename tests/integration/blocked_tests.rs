use deal_watcher::history::HistoryFile;
use deal_watcher::models::{Availability, Fact, FactValue};
use deal_watcher::product_manager::ItemStatus;
use deal_watcher::{CheckOptions, RunStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

#[tokio::test]
async fn test_blocked_availability_is_unknown() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = watch(&site);
    seed_history(&history, vec![(&item, Fact::availability(Availability::Unavailable))])?;

    Mock::given(method("GET"))
        .and(path(WATCH_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("Access Denied"))
        .mount(&site)
        .await;
    // No issue may be opened for an unknown result
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&github)
        .await;

    let config = with_github(get_test_config(&history, vec![item]), &github);
    let manager = create_test_manager(config).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    let report = &summary.items[0];
    assert_eq!(report.status, ItemStatus::Blocked { status: 403 });
    assert!(!report.outcome.is_alert());
    assert!(!report.notified);
    assert_eq!(
        report.outcome.current().value,
        FactValue::Availability { state: Availability::Unknown }
    );
    assert_eq!(summary.status(), RunStatus::Error);
    assert!(summary.to_string().contains("blocked (HTTP 403)"));

    let store = HistoryFile::new(&history).load()?;
    let tracked = store.get("BQ3908").expect("item stored");
    assert_eq!(tracked.checks.len(), 2);
    assert_eq!(tracked.latest().and_then(|f| f.status_code), Some(403));
    assert!(!tracked.alert_triggered);

    Ok(())
}

#[tokio::test]
async fn test_blocked_price_is_not_a_price() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = ipad(&site);
    seed_history(&history, vec![(&item, Fact::price(dec("310.00")))])?;

    Mock::given(method("GET"))
        .and(path(IPAD_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&site)
        .await;

    let manager = create_test_manager(get_test_config(&history, vec![item])).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    let report = &summary.items[0];
    assert_eq!(report.status, ItemStatus::Blocked { status: 403 });
    assert_eq!(report.outcome.current().value, FactValue::Error);
    assert_eq!(summary.status(), RunStatus::Error);

    // The last real price is still the reference for the next run
    let store = HistoryFile::new(&history).load()?;
    let tracked = store.get("4000285678").expect("item stored");
    assert_eq!(
        tracked.last_known().and_then(|f| f.value.price()),
        Some(dec("310.00"))
    );

    Ok(())
}

#[tokio::test]
async fn test_blocked_then_recovered() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = watch(&site);
    seed_history(&history, vec![(&item, Fact::availability(Availability::Unavailable))])?;

    Mock::given(method("GET"))
        .and(path(WATCH_PATH))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path(WATCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<button>Add Engraving</button>"),
        )
        .mount(&site)
        .await;

    let manager = create_test_manager(get_test_config(&history, vec![item])).await?;

    let first = manager.check_all(&CheckOptions::default()).await?;
    assert_eq!(first.status(), RunStatus::Error);

    let second = manager.check_all(&CheckOptions::default()).await?;
    assert!(second.items[0].outcome.is_alert());
    assert_eq!(
        second.items[0].outcome.previous().and_then(|f| f.value.availability()),
        Some(Availability::Unavailable)
    );

    Ok(())
}
