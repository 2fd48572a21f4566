//! API models

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// A stored set of Azure AD credentials and Business Central targeting data.
///
/// The client secret is never read back: the backend may echo it, but it is
/// dropped during deserialization so it can't be displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_emails: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_retry_wait_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_deployment_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `POST /api/projects`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub project_name: String,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(serialize_with = "serialize_secret")]
    pub client_secret: SecretString,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_emails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_retry_wait_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_deployment_retries: Option<u32>,
}

/// Body of `PUT /api/projects/{tenantId}`. Absent fields are left untouched by
/// the backend, so `client_secret: None` keeps the stored secret.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_secret"
    )]
    pub client_secret: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_emails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_retry_wait_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_deployment_retries: Option<u32>,
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_optional_secret<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// `{ project }` wrapper returned by create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEnvelope {
    pub project: Project,
}

/// Deployment status, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Scheduled,
    Running,
    Deploying,
    Processing,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub const ALL: [DeploymentStatus; 7] = [
        DeploymentStatus::Pending,
        DeploymentStatus::Scheduled,
        DeploymentStatus::Running,
        DeploymentStatus::Deploying,
        DeploymentStatus::Processing,
        DeploymentStatus::Completed,
        DeploymentStatus::Failed,
    ];

    /// Completed and failed deployments never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Completed | DeploymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Scheduled => "scheduled",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Processing => "processing",
            DeploymentStatus::Completed => "completed",
            DeploymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal statuses an operator may force through the override endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualStatus {
    Completed,
    Failed,
}

impl From<ManualStatus> for DeploymentStatus {
    fn from(status: ManualStatus) -> Self {
        match status {
            ManualStatus::Completed => DeploymentStatus::Completed,
            ManualStatus::Failed => DeploymentStatus::Failed,
        }
    }
}

impl fmt::Display for ManualStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DeploymentStatus::from(*self).fmt(f)
    }
}

impl FromStr for ManualStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(ManualStatus::Completed),
            "failed" => Ok(ManualStatus::Failed),
            _ => Err(format!("Invalid manual status: {} (expected completed or failed)", s)),
        }
    }
}

/// Body of `PATCH /api/deployments/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ManualStatus,
}

/// Extension package descriptor reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub name: Option<String>,
    pub publisher: Option<String>,
    pub version: Option<String>,
    pub id: Option<String>,
}

/// Deployment snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub status: DeploymentStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub upload_system_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub verification_check_time: Option<String>,
    #[serde(default)]
    pub extension_info: Option<ExtensionInfo>,
}

/// Response of `POST /api/deployments/upload-and-deploy`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAndDeployResponse {
    #[serde(default)]
    pub message: String,
    pub deployment_id: String,
    pub status: DeploymentStatus,
    #[serde(default)]
    pub schedule_time: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
