use deal_watcher::change_detector::Savings;
use deal_watcher::history::HistoryFile;
use deal_watcher::models::{ChangeOutcome, Fact};
use deal_watcher::product_manager::ItemStatus;
use deal_watcher::{CheckOptions, RunStatus};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

#[tokio::test]
async fn test_threshold_alert_opens_issue() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = ipad(&site);
    seed_history(&history, vec![(&item, Fact::price(dec("310.00")))])?;

    Mock::given(method("GET"))
        .and(path(IPAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(price_page("$299.99")))
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/someone/deals/issues"))
        .and(body_partial_json(json!({
            "title": "Price Alert: iPad, 128GB Wi-Fi (A16 chip)"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "html_url": "https://github.com/someone/deals/issues/1"
        })))
        .expect(1)
        .mount(&github)
        .await;

    let config = with_github(get_test_config(&history, vec![item.clone()]), &github);
    let manager = create_test_manager(config).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    assert_eq!(summary.status(), RunStatus::AlertTriggered);
    let report = &summary.items[0];
    assert!(matches!(report.outcome, ChangeOutcome::AlertTriggered { .. }));
    assert!(report.notified);
    assert_eq!(
        report.outcome.previous().and_then(|f| f.value.price()),
        Some(dec("310.00"))
    );

    let store = HistoryFile::new(&history).load()?;
    let tracked = store.get("4000285678").expect("item stored");
    let latest = tracked.latest().expect("fact recorded");
    assert_eq!(latest.value.price(), Some(dec("299.99")));
    assert!(tracked.alert_triggered);

    let savings = Savings::compute(dec("300.00"), dec("299.99"))?;
    assert_eq!(savings.delta, dec("0.01"));
    assert_eq!(savings.percent.round_dp(4), dec("0.0033"));

    Ok(())
}

#[tokio::test]
async fn test_mixed_run_keeps_going() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    Mock::given(method("GET"))
        .and(path(IPAD_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path(AIRPODS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><script type="application/ld+json">
                {"@context": "https://schema.org", "@type": "Product",
                 "offers": {"@type": "Offer", "price": "159.99"}}
            </script></head><body>Sign in to see price</body></html>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path(WATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><button>Apologies - Due to an inventory limitation, we are unable to engrave this product at this time.</button></body></html>",
        ))
        .mount(&site)
        .await;

    let items = vec![ipad(&site), airpods(&site), watch(&site)];
    let manager = create_test_manager(get_test_config(&history, items)).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    assert_eq!(summary.items.len(), 3);
    assert!(matches!(summary.items[0].status, ItemStatus::Failed { .. }));
    assert_eq!(
        summary.items[1].status,
        ItemStatus::Checked { strategy: "json-ld offer".to_string() }
    );
    assert_eq!(summary.items[1].outcome.current().value.price(), Some(dec("159.99")));
    assert_eq!(summary.items[2].outcome.current().value.format(), "unavailable");
    assert_eq!(summary.status(), RunStatus::Error);

    let text = summary.to_string();
    assert!(text.contains("3 checked, 0 changed, 0 alerted, 1 errored"));

    let store = HistoryFile::new(&history).load()?;
    assert_eq!(store.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_structured_api_response() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    Mock::given(method("GET"))
        .and(path("/display-price-lite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "priceData": {"displayPrice": {"onlinePrice": null, "deliveredPrice": "139.99"}}
        })))
        .mount(&site)
        .await;

    let mut item = airpods(&site);
    item.url = format!("{}/display-price-lite?item=4000308504", site.uri());
    let manager = create_test_manager(get_test_config(&history, vec![item])).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    let report = &summary.items[0];
    assert_eq!(report.status, ItemStatus::Checked { strategy: "api field".to_string() });
    // First sight never alerts, even below threshold
    assert!(matches!(report.outcome, ChangeOutcome::FirstObservation { .. }));
    assert_eq!(report.outcome.current().value.price(), Some(dec("139.99")));
    assert_eq!(summary.status(), RunStatus::Success);

    Ok(())
}

#[tokio::test]
async fn test_back_in_stock() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = watch(&site);
    seed_history(
        &history,
        vec![(&item, Fact::availability(deal_watcher::models::Availability::Unavailable))],
    )?;

    Mock::given(method("GET"))
        .and(path(WATCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><button>Add Engraving</button></body></html>"),
        )
        .mount(&site)
        .await;

    let manager = create_test_manager(get_test_config(&history, vec![item])).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    assert!(summary.items[0].outcome.is_alert());
    // Only the console log sink is registered, so nothing went out
    assert!(!summary.items[0].notified);
    assert!(summary.to_string().contains("unavailable -> available [not delivered]"));
    assert_eq!(summary.status(), RunStatus::AlertTriggered);

    Ok(())
}

#[tokio::test]
async fn test_rejected_issue_is_not_reported_as_sent() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = ipad(&site);
    seed_history(&history, vec![(&item, Fact::price(dec("310.00")))])?;

    Mock::given(method("GET"))
        .and(path(IPAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(price_page("$299.99")))
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/someone/deals/issues"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials"
        })))
        .expect(1)
        .mount(&github)
        .await;

    let config = with_github(get_test_config(&history, vec![item]), &github);
    let manager = create_test_manager(config).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    let report = &summary.items[0];
    assert!(report.outcome.is_alert());
    assert!(!report.notified);
    let text = summary.to_string();
    assert!(text.contains("$310.00 -> $299.99 [not delivered]"));
    assert!(!text.contains("[notified]"));
    assert_eq!(summary.status(), RunStatus::AlertTriggered);

    Ok(())
}

#[tokio::test]
async fn test_outage_after_known_price_is_an_error_not_a_change() -> anyhow::Result<()> {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let history = dir.path().join("price_history.json");

    let item = ipad(&site);
    seed_history(&history, vec![(&item, Fact::price(dec("310.00")))])?;

    Mock::given(method("GET"))
        .and(path(IPAD_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let manager = create_test_manager(get_test_config(&history, vec![item])).await?;
    let summary = manager.check_all(&CheckOptions::default()).await?;

    assert!(matches!(summary.items[0].status, ItemStatus::Failed { .. }));
    let text = summary.to_string();
    assert!(text.contains("[error] iPad, 128GB Wi-Fi (A16 chip) (4000285678)"));
    assert!(text.ends_with("1 checked, 0 changed, 0 alerted, 1 errored"));
    assert_eq!(summary.status(), RunStatus::Error);

    Ok(())
}
