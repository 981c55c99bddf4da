use super::*;
use crate::{
    columns::SortColumn,
    test_support::{app_error, line, FakeOrderService},
};
use chrono::Utc;
use shared::domain::DetailId;

fn ids(lines: &[PurchaseOrderLine]) -> Vec<i64> {
    lines.iter().map(|l| l.id.0).collect()
}

#[tokio::test]
async fn starts_uninitialized_and_populates_on_refresh() {
    let service = Arc::new(FakeOrderService::with_listing(vec![
        line(2, "Globex", 5.0),
        line(1, "Acme", 3.0),
    ]));
    let listing = OrderListing::new(service.clone(), Notifier::new());
    assert_eq!(listing.phase().await, ListingPhase::Uninitialized);
    assert!(listing.is_empty().await);

    let outcome = listing.refresh().await;
    assert_eq!(outcome, RefreshOutcome::Populated { count: 2 });
    assert_eq!(listing.phase().await, ListingPhase::Populated);
    assert_eq!(ids(&listing.lines().await), vec![2, 1]);
    assert_eq!(service.fetch_calls(), 1);
}

#[tokio::test]
async fn detail_seven_displays_with_id_and_price_text() {
    let service = Arc::new(FakeOrderService::with_listing(vec![line(7, "Acme", 19.5)]));
    let listing = OrderListing::new(service, Notifier::new());
    listing.refresh().await;

    let rows = listing.display_rows(&Utc).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "7");
    assert_eq!(rows[0].unit_price, "$19.50");
    assert_eq!(listing.lines().await[0].id, DetailId(7));
}

#[tokio::test]
async fn first_load_error_keeps_listing_empty_and_notifies() {
    let service = Arc::new(FakeOrderService::with_listing_reply(Err(app_error(
        "DB unavailable",
    ))));
    let notifier = Notifier::new();
    let mut notices = notifier.subscribe();
    let listing = OrderListing::new(service, notifier);

    let outcome = listing.refresh().await;
    match &outcome {
        RefreshOutcome::LoadError(text) => assert!(text.contains("DB unavailable"), "{text}"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(listing.phase().await, ListingPhase::LoadError);
    assert!(listing.is_empty().await);

    let notice = notices.recv().await.expect("notice");
    assert!(notice.is_error());
    assert!(notice.text().contains("DB unavailable"));
    assert!(notice.text().starts_with(LISTING_LOAD_ERROR_MESSAGE));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_listing() {
    let service = Arc::new(FakeOrderService::with_listing(vec![
        line(1, "Acme", 3.0),
        line(2, "Globex", 5.0),
    ]));
    let listing = OrderListing::new(service.clone(), Notifier::new());
    listing.refresh().await;

    service
        .set_listing_reply(Err(RequestError::Transport("connection reset".to_string())))
        .await;
    let outcome = listing.refresh().await;
    assert_eq!(
        outcome,
        RefreshOutcome::LoadError(LISTING_LOAD_ERROR_MESSAGE.to_string())
    );
    assert_eq!(listing.phase().await, ListingPhase::LoadError);
    assert_eq!(ids(&listing.lines().await), vec![1, 2]);
}

#[tokio::test]
async fn load_error_waits_for_an_explicit_refresh() {
    let service = Arc::new(FakeOrderService::with_listing_reply(Err(app_error("busy"))));
    let listing = OrderListing::new(service.clone(), Notifier::new());
    listing.refresh().await;
    assert_eq!(listing.phase().await, ListingPhase::LoadError);

    service.set_listing_reply(Ok(vec![line(4, "Initech", 1.0)])).await;
    tokio::task::yield_now().await;
    assert_eq!(listing.phase().await, ListingPhase::LoadError);
    assert_eq!(service.fetch_calls(), 1);

    assert_eq!(listing.refresh().await, RefreshOutcome::Populated { count: 1 });
    assert_eq!(listing.phase().await, ListingPhase::Populated);
}

#[tokio::test]
async fn repeated_refresh_shows_same_set_regardless_of_sort() {
    let service = Arc::new(FakeOrderService::with_listing(vec![
        line(3, "Zed", 1.0),
        line(1, "Acme", 9.0),
        line(2, "Moe", 4.0),
    ]));
    let listing = OrderListing::new(service, Notifier::new());

    listing.refresh().await;
    listing.toggle_sort(SortColumn::VendorName).await;
    let first = listing.display_rows(&Utc).await;

    listing.refresh().await;
    let second = listing.display_rows(&Utc).await;
    assert_eq!(first, second);

    let mut first_set: Vec<String> = first.iter().map(|r| r.id.clone()).collect();
    listing.set_sort(None).await;
    let mut unsorted: Vec<String> = listing
        .display_rows(&Utc)
        .await
        .iter()
        .map(|r| r.id.clone())
        .collect();
    first_set.sort();
    unsorted.sort();
    assert_eq!(first_set, unsorted);
}

#[tokio::test]
async fn only_the_latest_sort_criterion_applies() {
    let service = Arc::new(FakeOrderService::with_listing(vec![
        line(1, "Beta", 30.0),
        line(2, "Alpha", 20.0),
        line(3, "Alpha", 10.0),
        line(4, "Beta", 5.0),
    ]));
    let listing = OrderListing::new(service.clone(), Notifier::new());
    listing.refresh().await;

    listing.toggle_sort(SortColumn::VendorName).await;
    let active = listing.toggle_sort(SortColumn::UnitPrice).await;
    assert_eq!(active, Some(SortOrder::ascending(SortColumn::UnitPrice)));

    let rows = listing.display_rows(&Utc).await;
    let shown: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(shown, vec!["4", "3", "2", "1"]);

    assert_eq!(
        ids(&listing.render(Some(SortOrder::descending(SortColumn::Quantity))).await),
        vec![4, 3, 2, 1]
    );
    // Sorting never goes back to the server.
    assert_eq!(service.fetch_calls(), 1);
}

#[tokio::test]
async fn superseded_reply_is_discarded() {
    let service = Arc::new(FakeOrderService::with_listing(Vec::new()));
    let release_stale = service
        .push_gated_fetch(Ok(vec![line(1, "Stale", 1.0)]))
        .await;
    service.push_fetch(Ok(vec![line(2, "Fresh", 2.0)])).await;

    let notifier = Notifier::new();
    let mut notices = notifier.subscribe();
    let listing = Arc::new(OrderListing::new(service.clone(), notifier));

    let stale = {
        let listing = Arc::clone(&listing);
        tokio::spawn(async move { listing.refresh().await })
    };
    while service.fetch_calls() < 1 {
        tokio::task::yield_now().await;
    }

    assert_eq!(listing.refresh().await, RefreshOutcome::Populated { count: 1 });
    release_stale.send(()).expect("release");
    assert_eq!(stale.await.expect("join"), RefreshOutcome::Superseded);

    assert_eq!(ids(&listing.lines().await), vec![2]);
    assert_eq!(listing.phase().await, ListingPhase::Populated);
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn superseded_error_does_not_notify() {
    let service = Arc::new(FakeOrderService::with_listing(Vec::new()));
    let release_stale = service.push_gated_fetch(Err(app_error("late failure"))).await;
    service.push_fetch(Ok(vec![line(5, "Fresh", 2.0)])).await;

    let notifier = Notifier::new();
    let mut notices = notifier.subscribe();
    let listing = Arc::new(OrderListing::new(service.clone(), notifier));

    let stale = {
        let listing = Arc::clone(&listing);
        tokio::spawn(async move { listing.refresh().await })
    };
    while service.fetch_calls() < 1 {
        tokio::task::yield_now().await;
    }
    listing.refresh().await;
    release_stale.send(()).expect("release");

    assert_eq!(stale.await.expect("join"), RefreshOutcome::Superseded);
    assert_eq!(listing.phase().await, ListingPhase::Populated);
    assert!(notices.try_recv().is_err());
}
