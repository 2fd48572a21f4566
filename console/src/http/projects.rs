//! Projects API client

use async_trait::async_trait;

use openapi_client::models::{Project, ProjectEnvelope, ProjectInput, ProjectPatch};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

/// Project operations, abstracted for view tests
#[async_trait]
pub trait ProjectsApi: Send + Sync {
    /// List projects in backend order
    async fn list_projects(&self) -> Result<Vec<Project>, ConsoleError>;

    /// Create a project
    async fn create_project(&self, input: &ProjectInput) -> Result<Project, ConsoleError>;

    /// Update the project identified by its tenant id
    async fn update_project_by_tenant_id(
        &self,
        tenant_id: &str,
        patch: &ProjectPatch,
    ) -> Result<Project, ConsoleError>;

    /// Delete the project identified by its tenant id. Irreversible.
    async fn delete_project_by_tenant_id(&self, tenant_id: &str) -> Result<(), ConsoleError>;
}

#[async_trait]
impl ProjectsApi for HttpClient {
    async fn list_projects(&self) -> Result<Vec<Project>, ConsoleError> {
        self.get(&["api", "projects"]).await
    }

    async fn create_project(&self, input: &ProjectInput) -> Result<Project, ConsoleError> {
        let response: ProjectEnvelope = self.post(&["api", "projects"], input).await?;
        Ok(response.project)
    }

    async fn update_project_by_tenant_id(
        &self,
        tenant_id: &str,
        patch: &ProjectPatch,
    ) -> Result<Project, ConsoleError> {
        let response: ProjectEnvelope = self.put(&["api", "projects", tenant_id], patch).await?;
        Ok(response.project)
    }

    async fn delete_project_by_tenant_id(&self, tenant_id: &str) -> Result<(), ConsoleError> {
        self.delete(&["api", "projects", tenant_id]).await
    }
}
