//! Aggregate fetches and live polling against a fake backend

mod common;

use common::*;
use fintrack::{
    AggregateFetcher, AggregateSource, ClientError, CredentialStore, DashboardView,
    MemoryCredentialStore, PollConfig, PollEvent, PollHandle, ViewModel,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[tokio::test]
async fn test_dashboard_slices_are_normalized() {
    let backend = FakeBackend::start().await;
    let fetcher = AggregateFetcher::new(Arc::new(backend.client(logged_in())));
    let endpoints = DashboardView::endpoints();

    let aggregate = fetcher.fetch_all(&endpoints).await.unwrap();

    assert!(aggregate.is_complete());
    assert_eq!(aggregate.slices.len(), 4);
    // enveloped and bare lists both come out as plain arrays
    assert_eq!(aggregate.slices["categories"].as_array().unwrap().len(), 2);
    assert_eq!(aggregate.slices["recent"].as_array().unwrap().len(), 1);
    assert_eq!(aggregate.slices["summary"], json!({ "income": 5000, "totalExpense": 1200 }));
    assert_eq!(backend.hits().len(), 4);
}

#[tokio::test]
async fn test_failed_slice_degrades_to_default() {
    let backend = FakeBackend::start().await;
    backend.fail_with("/expenses/categories", 500);
    let fetcher = AggregateFetcher::new(Arc::new(backend.client(logged_in())));
    let endpoints = DashboardView::endpoints();

    let aggregate = fetcher.fetch_all(&endpoints).await.unwrap();
    assert_eq!(aggregate.failures.len(), 1);
    assert!(aggregate.failures.contains_key("categories"));

    let mut view = ViewModel::with_defaults(&endpoints);
    view.apply(1, &endpoints, aggregate);
    let dashboard = DashboardView::from_view(&view);

    assert!(dashboard.categories.is_empty());
    assert_eq!(dashboard.summary.income, 5000.0);
    assert_eq!(dashboard.greeting_name(), "asha");
    assert_eq!(
        dashboard.error.as_deref(),
        Some("Failed to load categories: Forced failure on /expenses/categories")
    );
}

#[tokio::test]
async fn test_any_unauthorized_slice_rejects_the_aggregate() {
    let backend = FakeBackend::start().await;
    backend.fail_with("/expenses/summary", 401);
    let session = logged_in();
    let fetcher = AggregateFetcher::new(Arc::new(backend.client(session.clone())));

    let err = fetcher
        .fetch_all(&DashboardView::endpoints())
        .await
        .unwrap_err();

    assert_eq!(err, ClientError::Unauthorized);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_live_dashboard_fills_the_view() {
    let backend = FakeBackend::start().await;
    let source: Arc<dyn AggregateSource> =
        Arc::new(AggregateFetcher::new(Arc::new(backend.client(logged_in()))));
    let endpoints = DashboardView::endpoints();
    let view = Arc::new(RwLock::new(ViewModel::with_defaults(&endpoints)));

    let (handle, mut events) = PollHandle::mount(
        source,
        endpoints,
        view.clone(),
        &PollConfig {
            interval: Duration::from_secs(60),
        },
    );

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert_eq!(event, Some(PollEvent::Applied { seq: 1 }));

    let dashboard = DashboardView::from_view(&*view.read().await);
    assert_eq!(dashboard.summary.balance(), 3800.0);
    assert_eq!(dashboard.recent[0].id, "tx1");
    assert_eq!(dashboard.error, None);

    handle.unmount().await;
}

#[tokio::test]
async fn test_live_dashboard_reports_expired_session_once() {
    let backend = FakeBackend::start().await;
    let session = Arc::new(MemoryCredentialStore::with_token("expired"));
    let source: Arc<dyn AggregateSource> =
        Arc::new(AggregateFetcher::new(Arc::new(backend.client(session.clone()))));
    let endpoints = DashboardView::endpoints();
    let view = Arc::new(RwLock::new(ViewModel::with_defaults(&endpoints)));

    let (handle, mut events) = PollHandle::mount(
        source,
        endpoints,
        view,
        &PollConfig {
            interval: Duration::from_millis(100),
        },
    );

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert_eq!(event, Some(PollEvent::Unauthorized));
    assert!(!session.is_authenticated());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!handle.is_active());
    while let Ok(event) = events.try_recv() {
        assert_ne!(event, PollEvent::Unauthorized);
    }

    handle.unmount().await;
}
