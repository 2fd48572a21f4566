//! Deployment API client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use openapi_client::models::{
    Deployment, ManualStatus, StatusUpdateRequest, UploadAndDeployResponse,
};

use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::http::client::HttpClient;

/// Multipart field carrying the extension package
pub const UPLOAD_FILE_FIELD: &str = "bcApp";

/// An extension package read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read a package from disk. Contents are not inspected.
    pub async fn read(file: &File) -> Result<Self, ConsoleError> {
        Ok(Self {
            file_name: file.name(),
            bytes: file.read_bytes().await?,
        })
    }
}

/// Upload-and-deploy request
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub project_id: String,
    pub environment_name: String,
    pub file: UploadFile,

    /// UTC ISO-8601 instant; `None` deploys immediately
    pub schedule_time_iso: Option<String>,
}

/// Deployment operations, abstracted for view and poller tests
#[async_trait]
pub trait DeploymentsApi: Send + Sync {
    /// Upload an extension package and start (or schedule) its deployment
    async fn upload_and_deploy(
        &self,
        request: UploadRequest,
    ) -> Result<UploadAndDeployResponse, ConsoleError>;

    /// Fetch the current deployment snapshot
    async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, ConsoleError>;

    /// Force a terminal status. Manual override only.
    async fn update_deployment_status(
        &self,
        deployment_id: &str,
        status: ManualStatus,
    ) -> Result<(), ConsoleError>;
}

#[async_trait]
impl DeploymentsApi for HttpClient {
    async fn upload_and_deploy(
        &self,
        request: UploadRequest,
    ) -> Result<UploadAndDeployResponse, ConsoleError> {
        let mut form = Form::new()
            .text("projectId", request.project_id)
            .text("environmentName", request.environment_name);
        if let Some(schedule_time) = request.schedule_time_iso {
            form = form.text("scheduleTime", schedule_time);
        }
        let part = Part::bytes(request.file.bytes)
            .file_name(request.file.file_name)
            .mime_str("application/octet-stream")?;
        form = form.part(UPLOAD_FILE_FIELD, part);

        self.post_multipart(&["api", "deployments", "upload-and-deploy"], form)
            .await
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, ConsoleError> {
        self.get(&["api", "deployments", deployment_id]).await
    }

    async fn update_deployment_status(
        &self,
        deployment_id: &str,
        status: ManualStatus,
    ) -> Result<(), ConsoleError> {
        let body = StatusUpdateRequest { status };
        self.patch(&["api", "deployments", deployment_id, "status"], &body)
            .await
    }
}
