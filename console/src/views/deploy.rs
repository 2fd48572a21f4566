//! Deploy view: upload form and submission

use chrono::{DateTime, Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use colored::Colorize;
use tracing::{info, warn};

use openapi_client::models::Project;

use crate::http::deployments::{DeploymentsApi, UploadFile, UploadRequest};
use crate::http::projects::ProjectsApi;
use crate::views::shell::Route;
use crate::views::state::ViewState;

/// Submission progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeployPhase {
    #[default]
    Idle,
    Submitting,
    Failed(String),
}

/// When the deployment should start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScheduleMode {
    #[default]
    Now,
    /// Local calendar date (`YYYY-MM-DD`) and wall-clock time (`HH:MM`)
    Scheduled { date: String, time: String },
}

/// Combine a local date and time into a UTC instant.
///
/// Blank or unparsable input, and local times skipped by a DST change,
/// give `None`. Ambiguous local times resolve to the earlier instant.
pub fn schedule_instant<Tz: TimeZone>(date: &str, time: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let (date, time) = (date.trim(), time.trim());
    if date.is_empty() || time.is_empty() {
        return None;
    }

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;

    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2025-06-01T08:30:00.000Z`
pub fn to_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Deploy view state
#[derive(Debug, Default)]
pub struct DeployView {
    projects: ViewState<Vec<Project>>,
    project_id: Option<String>,
    pub environment_name: String,
    file: Option<UploadFile>,
    pub schedule: ScheduleMode,
    phase: DeployPhase,
}

impl DeployView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &ViewState<Vec<Project>> {
        &self.projects
    }

    pub fn phase(&self) -> &DeployPhase {
        &self.phase
    }

    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let id = self.project_id.as_deref()?;
        self.projects.data()?.iter().find(|p| p.id == id)
    }

    /// Load projects, preselect the first one and seed its environment
    pub async fn load_projects<A: ProjectsApi + ?Sized>(&mut self, api: &A) {
        self.projects = ViewState::Loading;
        match api.list_projects().await {
            Ok(projects) => {
                let first = projects.first().map(|p| (p.id.clone(), p.environment.clone()));
                self.projects = ViewState::Loaded(projects);
                if let Some((id, environment)) = first {
                    self.project_id = Some(id);
                    self.environment_name = environment;
                }
            }
            Err(e) => {
                warn!("Failed to load projects: {}", e);
                let message = e.user_message("Failed to load projects");
                self.projects = ViewState::Error(message.clone());
                self.phase = DeployPhase::Failed(message);
            }
        }
    }

    /// Look a project up by id, then name (case-insensitive), then tenant id
    pub fn find_project(&self, selector: &str) -> Option<&Project> {
        let projects = self.projects.data()?;
        projects
            .iter()
            .find(|p| p.id == selector)
            .or_else(|| {
                projects
                    .iter()
                    .find(|p| p.project_name.eq_ignore_ascii_case(selector))
            })
            .or_else(|| projects.iter().find(|p| p.tenant_id == selector))
    }

    /// Select a project. Its default environment, when set, replaces the
    /// current environment name.
    pub fn select_project(&mut self, project_id: &str) -> bool {
        let Some(project) = self
            .projects
            .data()
            .and_then(|projects| projects.iter().find(|p| p.id == project_id))
        else {
            return false;
        };

        if !project.environment.is_empty() {
            self.environment_name = project.environment.clone();
        }
        self.project_id = Some(project.id.clone());
        true
    }

    pub fn choose_file(&mut self, file: UploadFile) {
        self.file = Some(file);
    }

    /// Schedule instant in the given zone, `None` meaning deploy now
    pub fn schedule_time_iso_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<String> {
        match &self.schedule {
            ScheduleMode::Now => None,
            ScheduleMode::Scheduled { date, time } => {
                schedule_instant(date, time, tz).map(|instant| to_iso(&instant))
            }
        }
    }

    /// Schedule instant in the local time zone
    pub fn schedule_time_iso(&self) -> Option<String> {
        self.schedule_time_iso_in(&Local)
    }

    /// Check the form and build the upload request
    pub fn validate_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<UploadRequest, String> {
        let Some(project_id) = self.project_id.clone().filter(|id| !id.is_empty()) else {
            return Err("Please select a project.".to_string());
        };
        let environment_name = self.environment_name.trim();
        if environment_name.is_empty() {
            return Err("Please enter an environmentName.".to_string());
        }
        let Some(file) = self.file.clone() else {
            return Err("Please choose a .app file.".to_string());
        };

        Ok(UploadRequest {
            project_id,
            environment_name: environment_name.to_string(),
            file,
            schedule_time_iso: self.schedule_time_iso_in(tz),
        })
    }

    /// Submit with the schedule read in the local time zone
    pub async fn submit<A: DeploymentsApi + ?Sized>(&mut self, api: &A) -> Option<Route> {
        self.submit_in(api, &Local).await
    }

    /// Submit the form. On success returns the status route of the new
    /// deployment; on failure the entered values stay as they were.
    pub async fn submit_in<A, Tz>(&mut self, api: &A, tz: &Tz) -> Option<Route>
    where
        A: DeploymentsApi + ?Sized,
        Tz: TimeZone,
    {
        let request = match self.validate_in(tz) {
            Ok(request) => request,
            Err(message) => {
                self.phase = DeployPhase::Failed(message);
                return None;
            }
        };

        self.phase = DeployPhase::Submitting;
        info!(
            "Uploading {} to environment {} (schedule: {})",
            request.file.file_name,
            request.environment_name,
            request.schedule_time_iso.as_deref().unwrap_or("now")
        );

        match api.upload_and_deploy(request).await {
            Ok(response) => {
                info!(
                    "Deployment {} accepted with status {}",
                    response.deployment_id, response.status
                );
                self.phase = DeployPhase::Idle;
                Some(Route::Deployment(response.deployment_id))
            }
            Err(e) => {
                warn!("Failed to start deployment: {}", e);
                self.phase = DeployPhase::Failed(e.user_message("Failed to start deployment"));
                None
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Deploy\n");
        if let DeployPhase::Failed(message) = &self.phase {
            out.push_str(&format!("{}\n", format!("! {}", message).red()));
        }

        let project = self
            .selected_project()
            .map(|p| format!("{} ({})", p.project_name, p.environment))
            .unwrap_or_else(|| "-".to_string());
        let environment = if self.environment_name.is_empty() {
            "-"
        } else {
            self.environment_name.as_str()
        };
        let file = self
            .file
            .as_ref()
            .map(|f| format!("{} ({} bytes)", f.file_name, f.bytes.len()))
            .unwrap_or_else(|| "-".to_string());
        let schedule_time = self.schedule_time_iso();
        let preview = schedule_time
            .clone()
            .unwrap_or_else(|| "Not scheduled (deploy immediately)".to_string());
        let action = match (&self.phase, &schedule_time) {
            (DeployPhase::Submitting, _) => "Starting…",
            (_, Some(_)) => "Schedule Deployment",
            (_, None) => "Deploy Now",
        };

        out.push_str(&format!("Project:          {}\n", project));
        out.push_str(&format!("Environment Name: {}\n", environment));
        out.push_str(&format!(".app file:        {}\n", file));
        out.push_str(&format!("Schedule preview: {}\n", preview));
        out.push_str(&format!("Action:           {}\n", action));
        out
    }
}
