//! Command-line interface definition

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use openapi_client::models::ManualStatus;

use crate::logs::LogLevel;

#[derive(Debug, Parser)]
#[command(
    name = "bcdeploy",
    about = "Operator console for Business Central extension deployments",
    version,
    long_about = None
)]
pub struct Cli {
    /// Backend base URL. Overrides the settings file and the built-in default.
    #[arg(long, env = "BC_DEPLOYER_API_BASE_URL", global = true)]
    pub api_base_url: Option<String>,

    /// JSON settings file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// More verbose logging, repeatable
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage projects.
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },

    /// Upload a .app package and deploy it now or at a scheduled time.
    Deploy(DeployArgs),

    /// Show a deployment.
    Status {
        /// Deployment ID.
        deployment_id: String,

        /// Keep polling until the deployment completes or fails.
        #[arg(long)]
        watch: bool,
    },

    /// Manually force a deployment to completed or failed.
    Mark {
        /// Deployment ID.
        deployment_id: String,

        /// `completed` or `failed`.
        status: ManualStatus,
    },

    /// Open a console route such as `/projects` or `/deployments/<id>`.
    Open {
        /// Route path; unknown paths open the projects view.
        route: String,

        /// Follow deployment routes until they finish.
        #[arg(long)]
        watch: bool,
    },

    /// Print version and build information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List projects, newest first.
    List,

    /// Create a project.
    Create(CreateProjectArgs),

    /// Update the project with the given tenant ID.
    Update(UpdateProjectArgs),

    /// Delete the project with the given tenant ID.
    Delete {
        /// Tenant ID.
        tenant_id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct CreateProjectArgs {
    /// Display name.
    #[arg(long)]
    pub name: String,

    /// Azure AD tenant ID.
    #[arg(long)]
    pub tenant_id: String,

    /// Azure AD application (client) ID.
    #[arg(long)]
    pub client_id: String,

    /// Azure AD application secret.
    #[arg(long, env = "BC_DEPLOYER_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Default environment name.
    #[arg(long)]
    pub environment: String,

    #[arg(long)]
    pub company_id: Option<String>,

    #[arg(long)]
    pub company_name: Option<String>,

    /// Comma-separated notification emails.
    #[arg(long)]
    pub emails: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub retry_wait_minutes: u32,

    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,
}

#[derive(Debug, Args)]
pub struct UpdateProjectArgs {
    /// Tenant ID of the project to update.
    pub tenant_id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub client_id: Option<String>,

    /// New secret; the stored one is kept when omitted.
    #[arg(long, env = "BC_DEPLOYER_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    #[arg(long)]
    pub environment: Option<String>,

    #[arg(long)]
    pub company_id: Option<String>,

    #[arg(long)]
    pub company_name: Option<String>,

    /// Comma-separated notification emails; replaces the stored list.
    #[arg(long)]
    pub emails: Option<String>,

    #[arg(long)]
    pub retry_wait_minutes: Option<u32>,

    #[arg(long)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Project ID, name or tenant ID. Defaults to the first project.
    #[arg(long)]
    pub project: Option<String>,

    /// Environment name. Defaults to the project's environment.
    #[arg(long = "env")]
    pub environment: Option<String>,

    /// Path to the .app package.
    #[arg(long)]
    pub file: PathBuf,

    /// Local calendar date (YYYY-MM-DD) to schedule the deployment.
    #[arg(long)]
    pub date: Option<String>,

    /// Local wall-clock time (HH:MM) to schedule the deployment.
    #[arg(long)]
    pub time: Option<String>,

    /// Follow the deployment status after it starts.
    #[arg(long)]
    pub watch: bool,
}
