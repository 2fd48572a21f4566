//! Deploy view end to end against in-memory backends

use chrono::FixedOffset;

use bcdeploy::filesys::file::File;
use bcdeploy::http::deployments::UploadFile;
use bcdeploy::views::deploy::{DeployPhase, DeployView, ScheduleMode};
use bcdeploy::views::shell::Route;

use crate::common::{project, MockDeployments, MockProjects};

fn backend() -> MockProjects {
    MockProjects::with(vec![
        project("p1", "Acme", "t1", "Prod", "2025-01-01T00:00:00Z"),
        project("p2", "Globex", "t2", "Sandbox", "2025-03-01T00:00:00Z"),
    ])
}

async fn package(name: &str, contents: &[u8]) -> UploadFile {
    let dir = std::env::temp_dir().join(format!("bcdeploy-test-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join(name);
    tokio::fs::write(&path, contents).await.unwrap();
    UploadFile::read(&File::new(path)).await.unwrap()
}

#[tokio::test]
async fn test_deploy_now_navigates_to_status() {
    let projects = backend();
    let deployments = MockDeployments::default();
    let mut view = DeployView::new();

    view.load_projects(&projects).await;
    assert_eq!(view.selected_project().map(|p| p.id.as_str()), Some("p1"));
    assert_eq!(view.environment_name, "Prod");

    view.choose_file(package("ext.app", b"NAVX").await);
    let route = view.submit(&deployments).await;
    assert_eq!(route, Some(Route::Deployment("dep-1".to_string())));
    assert_eq!(route.unwrap().to_string(), "/deployments/dep-1");
    assert_eq!(view.phase(), &DeployPhase::Idle);

    let uploads = deployments.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].project_id, "p1");
    assert_eq!(uploads[0].environment_name, "Prod");
    assert_eq!(uploads[0].file.file_name, "ext.app");
    assert_eq!(uploads[0].file.bytes, b"NAVX".to_vec());
    assert!(uploads[0].schedule_time_iso.is_none());
}

#[tokio::test]
async fn test_scheduled_deploy_sends_utc_instant() {
    let projects = backend();
    let deployments = MockDeployments::default();
    let mut view = DeployView::new();
    view.load_projects(&projects).await;

    let globex = view.find_project("globex").map(|p| p.id.clone()).unwrap();
    assert!(view.select_project(&globex));
    assert_eq!(view.environment_name, "Sandbox");

    view.choose_file(package("scheduled.app", b"NAVX").await);
    view.schedule = ScheduleMode::Scheduled {
        date: "2025-06-01".to_string(),
        time: "14:00".to_string(),
    };

    let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
    let route = view.submit_in(&deployments, &ist).await;
    assert_eq!(route, Some(Route::Deployment("dep-1".to_string())));

    let uploads = deployments.uploads.lock().unwrap();
    assert_eq!(uploads[0].project_id, "p2");
    assert_eq!(
        uploads[0].schedule_time_iso.as_deref(),
        Some("2025-06-01T08:30:00.000Z")
    );
}

#[tokio::test]
async fn test_incomplete_schedule_deploys_immediately() {
    let projects = backend();
    let deployments = MockDeployments::default();
    let mut view = DeployView::new();
    view.load_projects(&projects).await;
    view.choose_file(package("ext.app", b"NAVX").await);
    view.schedule = ScheduleMode::Scheduled {
        date: "2025-06-01".to_string(),
        time: String::new(),
    };

    view.submit(&deployments).await.unwrap();
    assert!(deployments.uploads.lock().unwrap()[0].schedule_time_iso.is_none());
}

#[tokio::test]
async fn test_missing_file_blocks_submission() {
    let projects = backend();
    let deployments = MockDeployments::default();
    let mut view = DeployView::new();
    view.load_projects(&projects).await;

    assert!(view.submit(&deployments).await.is_none());
    assert_eq!(
        view.phase(),
        &DeployPhase::Failed("Please choose a .app file.".to_string())
    );
    assert!(deployments.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_upload_keeps_form() {
    let projects = backend();
    let deployments = MockDeployments::default();
    *deployments.fail_upload.lock().unwrap() = Some("Invalid .app file".to_string());
    let mut view = DeployView::new();
    view.load_projects(&projects).await;
    view.environment_name = "UAT".to_string();
    view.choose_file(package("broken.app", b"").await);

    assert!(view.submit(&deployments).await.is_none());
    assert_eq!(view.phase(), &DeployPhase::Failed("Invalid .app file".to_string()));
    assert_eq!(view.environment_name, "UAT");
    assert_eq!(view.file().map(|f| f.file_name.as_str()), Some("broken.app"));
    assert!(view.render().contains("Invalid .app file"));
}

#[tokio::test]
async fn test_project_load_failure_is_shown() {
    let projects = MockProjects::default();
    *projects.fail_list.lock().unwrap() = Some("backend down".to_string());
    let mut view = DeployView::new();

    view.load_projects(&projects).await;
    assert!(view.projects().error().is_some());
    assert!(view.selected_project().is_none());
    assert!(view.render().contains("backend down"));
}
