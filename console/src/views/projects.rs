//! Projects view: list, create/edit form and delete

use std::fmt;

use colored::Colorize;
use secrecy::SecretString;
use tracing::{info, warn};

use openapi_client::models::{Project, ProjectInput, ProjectPatch};

use crate::http::projects::ProjectsApi;
use crate::views::confirm::Confirm;
use crate::views::state::ViewState;
use crate::views::table::render_table;

pub const DELETE_PROMPT: &str = "Delete this project? This cannot be undone.";

const DEFAULT_RETRY_WAIT_MINUTES: u32 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Whether the form creates a new project or edits an existing one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Create,
    /// Updates are keyed by tenant id, which is fixed while editing
    Edit { tenant_id: String },
}

/// Text buffers of the project form
#[derive(Clone, PartialEq, Eq)]
pub struct ProjectForm {
    pub project_name: String,
    pub tenant_id: String,
    pub client_id: String,
    /// Never pre-filled; blank in edit mode keeps the stored secret
    pub client_secret: String,
    pub environment: String,
    pub company_id: String,
    pub company_name: String,
    /// Comma-separated
    pub emails_text: String,
    pub retry_wait_minutes: u32,
    pub max_retries: u32,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            environment: String::new(),
            company_id: String::new(),
            company_name: String::new(),
            emails_text: String::new(),
            retry_wait_minutes: DEFAULT_RETRY_WAIT_MINUTES,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl fmt::Debug for ProjectForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectForm")
            .field("project_name", &self.project_name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("company_id", &self.company_id)
            .field("company_name", &self.company_name)
            .field("emails_text", &self.emails_text)
            .field("retry_wait_minutes", &self.retry_wait_minutes)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ProjectForm {
    /// Pre-fill from a stored project, leaving the secret blank
    pub fn from_project(project: &Project) -> Self {
        Self {
            project_name: project.project_name.clone(),
            tenant_id: project.tenant_id.clone(),
            client_id: project.client_id.clone(),
            client_secret: String::new(),
            environment: project.environment.clone(),
            company_id: project.company_id.clone().unwrap_or_default(),
            company_name: project.company_name.clone().unwrap_or_default(),
            emails_text: project
                .notification_emails
                .as_deref()
                .unwrap_or_default()
                .join(", "),
            retry_wait_minutes: project
                .deployment_retry_wait_minutes
                .unwrap_or(DEFAULT_RETRY_WAIT_MINUTES),
            max_retries: project.max_deployment_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        }
    }

    /// Body for creating a project
    pub fn to_input(&self) -> ProjectInput {
        ProjectInput {
            project_name: self.project_name.clone(),
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: SecretString::from(self.client_secret.clone()),
            environment: self.environment.clone(),
            company_id: non_empty(&self.company_id),
            company_name: non_empty(&self.company_name),
            notification_emails: Some(parse_emails(&self.emails_text)),
            deployment_retry_wait_minutes: Some(self.retry_wait_minutes),
            max_deployment_retries: Some(self.max_retries),
        }
    }

    /// Body for updating a project. The secret is only sent when typed.
    pub fn to_patch(&self) -> ProjectPatch {
        let client_secret = if self.client_secret.is_empty() {
            None
        } else {
            Some(SecretString::from(self.client_secret.clone()))
        };

        ProjectPatch {
            project_name: Some(self.project_name.clone()),
            tenant_id: Some(self.tenant_id.clone()),
            client_id: Some(self.client_id.clone()),
            client_secret,
            environment: Some(self.environment.clone()),
            company_id: Some(self.company_id.clone()),
            company_name: Some(self.company_name.clone()),
            notification_emails: Some(parse_emails(&self.emails_text)),
            deployment_retry_wait_minutes: Some(self.retry_wait_minutes),
            max_deployment_retries: Some(self.max_retries),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
/// Order and duplicates are kept.
pub fn parse_emails(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Newest first; projects without a timestamp go last
pub fn sort_by_created_desc(projects: &[Project]) -> Vec<&Project> {
    let mut sorted: Vec<&Project> = projects.iter().collect();
    sorted.sort_by(|a, b| {
        let a = a.created_at.as_deref().unwrap_or("");
        let b = b.created_at.as_deref().unwrap_or("");
        b.cmp(a)
    });
    sorted
}

/// Projects view state
#[derive(Debug, Default)]
pub struct ProjectsView {
    list: ViewState<Vec<Project>>,
    banner: Option<String>,
    mode: FormMode,
    pub form: ProjectForm,
}

impl ProjectsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &ViewState<Vec<Project>> {
        &self.list
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Loaded projects, newest first
    pub fn sorted(&self) -> Vec<&Project> {
        match &self.list {
            ViewState::Loaded(projects) => sort_by_created_desc(projects),
            _ => Vec::new(),
        }
    }

    /// Reload the list. Already loaded data stays visible if this fails.
    pub async fn refresh<A: ProjectsApi + ?Sized>(&mut self, api: &A) {
        self.banner = None;
        if !matches!(self.list, ViewState::Loaded(_)) {
            self.list = ViewState::Loading;
        }

        match api.list_projects().await {
            Ok(projects) => {
                info!("Loaded {} project(s)", projects.len());
                self.list = ViewState::Loaded(projects);
            }
            Err(e) => {
                let message = e.user_message("Failed to load projects");
                warn!("Failed to load projects: {}", e);
                if !matches!(self.list, ViewState::Loaded(_)) {
                    self.list = ViewState::Error(message.clone());
                }
                self.banner = Some(message);
            }
        }
    }

    pub fn start_create(&mut self) {
        self.mode = FormMode::Create;
        self.form = ProjectForm::default();
    }

    pub fn start_edit(&mut self, project: &Project) {
        self.mode = FormMode::Edit {
            tenant_id: project.tenant_id.clone(),
        };
        self.form = ProjectForm::from_project(project);
    }

    /// Create or update from the form.
    ///
    /// On success the form resets to create mode and the list reloads. On
    /// failure the banner is set and the form keeps its values.
    pub async fn submit<A: ProjectsApi + ?Sized>(&mut self, api: &A) -> Option<Project> {
        self.banner = None;

        let result = match &self.mode {
            FormMode::Create => api.create_project(&self.form.to_input()).await,
            FormMode::Edit { tenant_id } => {
                api.update_project_by_tenant_id(tenant_id, &self.form.to_patch())
                    .await
            }
        };

        match result {
            Ok(project) => {
                info!("Saved project {} ({})", project.project_name, project.tenant_id);
                self.start_create();
                self.refresh(api).await;
                Some(project)
            }
            Err(e) => {
                warn!("Failed to save project: {}", e);
                self.banner = Some(e.user_message("Failed to save project"));
                None
            }
        }
    }

    /// Delete after confirmation. Declining sends nothing.
    pub async fn remove<A, C>(&mut self, api: &A, tenant_id: &str, confirm: &C) -> bool
    where
        A: ProjectsApi + ?Sized,
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(DELETE_PROMPT).await {
            return false;
        }
        self.banner = None;

        match api.delete_project_by_tenant_id(tenant_id).await {
            Ok(()) => {
                info!("Deleted project with tenant {}", tenant_id);
                self.refresh(api).await;
                true
            }
            Err(e) => {
                warn!("Failed to delete project: {}", e);
                self.banner = Some(e.user_message("Failed to delete project"));
                false
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Projects\n");
        if let Some(banner) = &self.banner {
            out.push_str(&format!("{}\n", format!("! {}", banner).red()));
        }

        match &self.list {
            ViewState::Idle => out.push_str("No data loaded.\n"),
            ViewState::Loading => out.push_str("Loading…\n"),
            ViewState::Error(_) => {}
            ViewState::Loaded(projects) => {
                out.push_str(&format!("{} project(s)\n", projects.len()));
                if projects.is_empty() {
                    out.push_str("No projects found. Create one above.\n");
                } else {
                    let rows: Vec<Vec<String>> = sort_by_created_desc(projects)
                        .into_iter()
                        .map(|p| {
                            let emails = p.notification_emails.as_deref().unwrap_or_default();
                            vec![
                                p.project_name.clone(),
                                p.tenant_id.clone(),
                                p.environment.clone(),
                                p.company_id.clone().unwrap_or_else(|| "-".to_string()),
                                if emails.is_empty() {
                                    "-".to_string()
                                } else {
                                    emails.join(", ")
                                },
                            ]
                        })
                        .collect();
                    out.push_str(&render_table(
                        &["Name", "Tenant", "Environment", "Company", "Emails"],
                        &rows,
                    ));
                }
            }
        }
        out
    }
}
