//! Status poller and status page tests

use std::sync::Arc;
use std::time::Duration;

use bcdeploy::errors::ConsoleError;
use bcdeploy::views::state::ViewState;
use bcdeploy::views::status::{SharedStatus, StatusPage, StatusView};
use bcdeploy::workers::poller::{self, PollerHandle};
use openapi_client::models::{DeploymentStatus, ManualStatus};

use crate::common::MockDeployments;

fn shared(deployment_id: &str) -> SharedStatus {
    SharedStatus::new(StatusView::new(Some(deployment_id.to_string())))
}

fn options() -> poller::Options {
    poller::Options {
        interval: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_poller_stops_at_terminal_status() {
    let api = MockDeployments::scripted(&[
        DeploymentStatus::Pending,
        DeploymentStatus::Processing,
        DeploymentStatus::Completed,
    ]);
    let status = shared("d1");

    poller::run(
        &options(),
        &api,
        &status,
        |_| std::future::ready(()),
        Box::pin(std::future::pending::<()>()),
    )
    .await;

    assert_eq!(api.fetch_count(), 3);
    let view = status.view().read().await;
    assert!(view.is_terminal());
    assert_eq!(view.deployment().map(|d| d.status), Some(DeploymentStatus::Completed));
    assert_eq!(view.logs_newest_first(), vec!["step 3", "step 2", "step 1"]);
}

#[tokio::test]
async fn test_poller_shutdown_after_first_fetch() {
    let api = MockDeployments::scripted(&[DeploymentStatus::Pending]);
    let status = shared("d1");

    poller::run(
        &options(),
        &api,
        &status,
        |_| std::future::ready(()),
        Box::pin(async {}),
    )
    .await;

    assert_eq!(api.fetch_count(), 1);
    assert!(!status.is_terminal().await);
}

#[tokio::test]
async fn test_poller_without_deployment_fetches_nothing() {
    let api = MockDeployments::default();
    let status = SharedStatus::default();

    poller::run(
        &options(),
        &api,
        &status,
        |_| std::future::ready(()),
        Box::pin(async {}),
    )
    .await;

    assert_eq!(api.fetch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_errors_keep_polling() {
    let api = Arc::new(MockDeployments::default());
    *api.fail_fetch.lock().unwrap() = Some("Deployment not found".to_string());
    let status = shared("d1");

    let handle = PollerHandle::spawn(options(), api.clone(), status.clone(), "d1".to_string());
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(api.fetch_count(), 3);
    assert!(!handle.is_finished());
    assert_eq!(
        status.view().read().await.state().error(),
        Some("Deployment not found")
    );

    handle.stop().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_poller_finishes_on_terminal_status() {
    let api = Arc::new(MockDeployments::scripted(&[
        DeploymentStatus::Running,
        DeploymentStatus::Failed,
    ]));
    let status = shared("d1");

    let handle = PollerHandle::spawn(options(), api.clone(), status.clone(), "d1".to_string());
    assert_eq!(handle.deployment_id(), "d1");
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(api.fetch_count(), 2);
    assert!(handle.is_finished());
    assert!(status.is_terminal().await);
}

#[tokio::test(start_paused = true)]
async fn test_navigate_replaces_poller() {
    let api = Arc::new(MockDeployments::default());
    let mut page = StatusPage::new(api.clone(), options());

    page.navigate("d1").await;
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(api.fetched(), vec!["d1", "d1"]);

    page.navigate("d2").await;
    assert_eq!(
        page.status().view().read().await.deployment_id(),
        Some("d2")
    );
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(api.fetched(), vec!["d1", "d1", "d2", "d2", "d2"]);
    assert!(page.is_polling());

    page.close().await;
    assert!(!page.is_polling());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.fetch_count(), 5);
}

#[tokio::test]
async fn test_updates_are_broadcast() {
    let api = MockDeployments::scripted(&[DeploymentStatus::Running]);
    let status = shared("d1");
    let mut updates = status.subscribe();

    status.fetch(&api).await;
    assert!(updates.has_changed().unwrap());
    let _ = updates.borrow_and_update();
    assert!(!updates.has_changed().unwrap());

    let view = status.view().read().await;
    assert!(matches!(view.state(), ViewState::Loaded(_)));
    assert_eq!(view.in_flight(), 0);
}

#[tokio::test]
async fn test_mark_then_refetch() {
    let api = MockDeployments::scripted(&[DeploymentStatus::Running]);
    let status = shared("d1");
    status.fetch(&api).await;

    status.mark(&api, ManualStatus::Failed).await.unwrap();
    assert_eq!(
        *api.marks.lock().unwrap(),
        vec![("d1".to_string(), ManualStatus::Failed)]
    );
    assert_eq!(api.fetch_count(), 2);
    assert!(status.is_terminal().await);

    // terminal deployments cannot be overridden again
    let err = status.mark(&api, ManualStatus::Completed).await.unwrap_err();
    assert!(matches!(err, ConsoleError::ValidationError(_)));
    assert_eq!(api.marks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mark_requires_deployment() {
    let api = MockDeployments::default();
    let status = SharedStatus::default();

    let err = status.mark(&api, ManualStatus::Completed).await.unwrap_err();
    assert_eq!(err.to_string(), "No deployment selected.");
    assert!(api.marks.lock().unwrap().is_empty());
}
