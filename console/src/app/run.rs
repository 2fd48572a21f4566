//! Command dispatch: drives the views and prints them

use std::future::Future;
use std::io::IsTerminal;
use std::process::ExitCode;

use tracing::{info, warn};

use openapi_client::models::{DeploymentStatus, ManualStatus};

use crate::app::state::AppState;
use crate::cli::{Command, CreateProjectArgs, DeployArgs, ProjectsCommand, UpdateProjectArgs};
use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::http::deployments::UploadFile;
use crate::views::confirm::{AssumeYes, Confirm, StdinConfirm};
use crate::views::deploy::{DeployPhase, DeployView, ScheduleMode};
use crate::views::projects::{ProjectForm, ProjectsView};
use crate::views::shell::{render_header, Route};
use crate::views::state::ViewState;
use crate::views::status::StatusPage;

/// Run one console command
pub async fn run(
    state: &AppState,
    command: Command,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<ExitCode, ConsoleError> {
    match command {
        Command::Projects { command } => run_projects(state, command).await,
        Command::Deploy(args) => run_deploy(state, args, shutdown_signal).await,
        Command::Status {
            deployment_id,
            watch,
        } => show_status(state, &deployment_id, watch, shutdown_signal).await,
        Command::Mark {
            deployment_id,
            status,
        } => mark_status(state, &deployment_id, status).await,
        Command::Open { route, watch } => match Route::parse(&route) {
            Route::Projects => run_projects(state, ProjectsCommand::List).await,
            Route::Deploy => show_deploy_form(state).await,
            Route::Deployment(id) => show_status(state, &id, watch, shutdown_signal).await,
        },
        Command::Version => {
            let version = crate::utils::version_info();
            println!("{}", serde_json::to_string_pretty(&version)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_header(state: &AppState, route: &Route) {
    println!("{}", render_header(&state.options.backend_base_url, route));
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ================================== PROJECTS ===================================== //

async fn run_projects(state: &AppState, command: ProjectsCommand) -> Result<ExitCode, ConsoleError> {
    let api = state.http_client.as_ref();
    let mut view = ProjectsView::new();
    print_header(state, &Route::Projects);

    let failed = match command {
        ProjectsCommand::List => {
            view.refresh(api).await;
            view.banner().is_some()
        }
        ProjectsCommand::Create(args) => {
            view.start_create();
            view.form = create_form(args);
            view.submit(api).await.is_none()
        }
        ProjectsCommand::Update(args) => {
            view.refresh(api).await;
            let project = view
                .list()
                .data()
                .and_then(|projects| projects.iter().find(|p| p.tenant_id == args.tenant_id))
                .cloned();
            let Some(project) = project else {
                print!("{}", view.render());
                return Err(ConsoleError::NotFound(format!(
                    "no project with tenant id {}",
                    args.tenant_id
                )));
            };
            view.start_edit(&project);
            apply_update(&mut view.form, args);
            view.submit(api).await.is_none()
        }
        ProjectsCommand::Delete { tenant_id, yes } => {
            view.refresh(api).await;
            let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
            let deleted = view.remove(api, &tenant_id, confirm).await;
            if !deleted && view.banner().is_none() {
                println!("Cancelled.");
            }
            view.banner().is_some()
        }
    };

    print!("{}", view.render());
    Ok(exit_code(failed))
}

fn create_form(args: CreateProjectArgs) -> ProjectForm {
    ProjectForm {
        project_name: args.name,
        tenant_id: args.tenant_id,
        client_id: args.client_id,
        client_secret: args.client_secret,
        environment: args.environment,
        company_id: args.company_id.unwrap_or_default(),
        company_name: args.company_name.unwrap_or_default(),
        emails_text: args.emails.unwrap_or_default(),
        retry_wait_minutes: args.retry_wait_minutes,
        max_retries: args.max_retries,
    }
}

/// Overlay the given flags on an edit form pre-filled from the stored project
pub fn apply_update(form: &mut ProjectForm, args: UpdateProjectArgs) {
    if let Some(name) = args.name {
        form.project_name = name;
    }
    if let Some(client_id) = args.client_id {
        form.client_id = client_id;
    }
    if let Some(secret) = args.client_secret {
        form.client_secret = secret;
    }
    if let Some(environment) = args.environment {
        form.environment = environment;
    }
    if let Some(company_id) = args.company_id {
        form.company_id = company_id;
    }
    if let Some(company_name) = args.company_name {
        form.company_name = company_name;
    }
    if let Some(emails) = args.emails {
        form.emails_text = emails;
    }
    if let Some(minutes) = args.retry_wait_minutes {
        form.retry_wait_minutes = minutes;
    }
    if let Some(max_retries) = args.max_retries {
        form.max_retries = max_retries;
    }
}

// =================================== DEPLOY ====================================== //

async fn show_deploy_form(state: &AppState) -> Result<ExitCode, ConsoleError> {
    let mut view = DeployView::new();
    view.load_projects(state.http_client.as_ref()).await;
    print_header(state, &Route::Deploy);
    print!("{}", view.render());
    Ok(exit_code(matches!(view.phase(), DeployPhase::Failed(_))))
}

async fn run_deploy(
    state: &AppState,
    args: DeployArgs,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<ExitCode, ConsoleError> {
    let api = state.http_client.as_ref();
    let mut view = DeployView::new();
    print_header(state, &Route::Deploy);

    view.load_projects(api).await;
    if matches!(view.projects(), ViewState::Error(_)) {
        print!("{}", view.render());
        return Ok(ExitCode::FAILURE);
    }

    if let Some(selector) = &args.project {
        let Some(id) = view.find_project(selector).map(|p| p.id.clone()) else {
            return Err(ConsoleError::NotFound(format!("no project matches {:?}", selector)));
        };
        view.select_project(&id);
    }
    if let Some(environment) = args.environment {
        view.environment_name = environment;
    }

    let file = File::new(&args.file);
    if !file.name().to_lowercase().ends_with(".app") {
        warn!("{} does not have a .app extension, uploading anyway", file.name());
    }
    view.choose_file(UploadFile::read(&file).await?);

    if args.date.is_some() || args.time.is_some() {
        view.schedule = ScheduleMode::Scheduled {
            date: args.date.unwrap_or_default(),
            time: args.time.unwrap_or_default(),
        };
        if view.schedule_time_iso().is_none() {
            warn!("Schedule date/time incomplete or invalid, deploying immediately");
        }
    }

    print!("{}", view.render());
    match view.submit(api).await {
        Some(route) => {
            println!("\nDeployment started: {}", route);
            match route {
                Route::Deployment(id) if args.watch => {
                    show_status(state, &id, true, shutdown_signal).await
                }
                _ => Ok(ExitCode::SUCCESS),
            }
        }
        None => {
            print!("\n{}", view.render());
            Ok(ExitCode::FAILURE)
        }
    }
}

// =================================== STATUS ====================================== //

async fn show_status(
    state: &AppState,
    deployment_id: &str,
    watch: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<ExitCode, ConsoleError> {
    let route = Route::Deployment(deployment_id.to_string());
    let mut page = StatusPage::new(state.http_client.clone(), state.options.poller.clone());
    let interval = page.poll_interval();

    if !watch {
        page.status().view().write().await.reset_for(deployment_id);
        page.refresh().await;
        let view = page.status().view().read().await;
        print_header(state, &route);
        print!("{}", view.render(interval));
        return Ok(exit_code(view.state().error().is_some()));
    }

    let mut updates = page.status().subscribe();
    page.navigate(deployment_id).await;
    let mut shutdown = Box::pin(shutdown_signal);
    let redraw = std::io::stdout().is_terminal();
    let mut last_status: Option<DeploymentStatus> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopped following deployment {}", deployment_id);
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let view = page.status().view().read().await;
        if view.in_flight() > 0 || matches!(view.state(), ViewState::Idle) {
            continue;
        }
        if redraw {
            print!("\x1B[2J\x1B[H");
        }
        print_header(state, &route);
        print!("{}", view.render(interval));
        last_status = view.deployment().map(|d| d.status);
        if view.is_terminal() {
            break;
        }
    }

    page.close().await;
    Ok(exit_code(last_status == Some(DeploymentStatus::Failed)))
}

async fn mark_status(
    state: &AppState,
    deployment_id: &str,
    status: ManualStatus,
) -> Result<ExitCode, ConsoleError> {
    let route = Route::Deployment(deployment_id.to_string());
    let page = StatusPage::new(state.http_client.clone(), state.options.poller.clone());
    page.status().view().write().await.reset_for(deployment_id);
    page.refresh().await;

    let result = page.mark(status).await;
    let view = page.status().view().read().await;
    print_header(state, &route);
    print!("{}", view.render(page.poll_interval()));

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(ConsoleError::ValidationError(message)) => {
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
        // already shown in the banner
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
