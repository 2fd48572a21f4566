//! Deployment status view: polling display and manual override

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use colored::Colorize;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use openapi_client::models::{Deployment, ManualStatus};

use crate::errors::ConsoleError;
use crate::http::deployments::DeploymentsApi;
use crate::views::pill::status_pill;
use crate::views::shell::Route;
use crate::views::state::ViewState;
use crate::workers::poller::{self, PollerHandle};

/// Sequence number handed out when a fetch starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Status view state
#[derive(Debug, Default)]
pub struct StatusView {
    deployment_id: Option<String>,
    state: ViewState<Deployment>,
    banner: Option<String>,
    in_flight: u32,
    next_seq: u64,
    applied_seq: u64,
    /// Last ticket handed out before the most recent reset
    reset_seq: u64,
    /// Id typed into the "open another deployment" box
    pub manual_id: String,
}

impl StatusView {
    pub fn new(deployment_id: Option<String>) -> Self {
        Self {
            deployment_id,
            ..Default::default()
        }
    }

    pub fn deployment_id(&self) -> Option<&str> {
        self.deployment_id.as_deref()
    }

    pub fn state(&self) -> &ViewState<Deployment> {
        &self.state
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        self.state.data()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// True only once a completed or failed snapshot has been applied
    pub fn is_terminal(&self) -> bool {
        self.deployment().is_some_and(|d| d.status.is_terminal())
    }

    /// Manual override is allowed when idle, with a known id, before a
    /// terminal status
    pub fn can_override(&self) -> bool {
        self.in_flight == 0 && self.deployment_id.is_some() && !self.is_terminal()
    }

    /// Switch to another deployment. Responses to requests started before the
    /// switch are ignored; the manual id box keeps its text.
    pub fn reset_for(&mut self, deployment_id: &str) {
        self.deployment_id = Some(deployment_id.to_string());
        self.state = ViewState::Idle;
        self.banner = None;
        self.in_flight = 0;
        self.applied_seq = self.next_seq;
        self.reset_seq = self.next_seq;
    }

    pub fn begin_request(&mut self) -> RequestTicket {
        self.next_seq += 1;
        self.in_flight += 1;
        if matches!(self.state, ViewState::Idle) {
            self.state = ViewState::Loading;
        }
        RequestTicket(self.next_seq)
    }

    /// Count a request that does not load the deployment (a manual override)
    fn begin_action(&mut self) -> RequestTicket {
        self.next_seq += 1;
        self.in_flight += 1;
        RequestTicket(self.next_seq)
    }

    fn release(&mut self, ticket: RequestTicket) {
        // requests from before a reset were already dropped from the count
        if ticket.0 > self.reset_seq {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
    }

    /// Apply a fetch result unless a newer one was already applied.
    /// Returns whether the result was applied.
    pub fn finish_request(
        &mut self,
        ticket: RequestTicket,
        result: Result<Deployment, ConsoleError>,
    ) -> bool {
        self.release(ticket);
        if ticket.0 <= self.applied_seq {
            debug!("Discarding stale response #{} (applied #{})", ticket.0, self.applied_seq);
            return false;
        }
        self.applied_seq = ticket.0;

        self.state = match result {
            Ok(deployment) => ViewState::Loaded(deployment),
            Err(e) => {
                warn!("Failed to load deployment: {}", e);
                ViewState::Error(e.user_message("Failed to load deployment"))
            }
        };
        true
    }

    /// Log lines, most recent first
    pub fn logs_newest_first(&self) -> Vec<&str> {
        self.deployment()
            .map(|d| d.logs.iter().rev().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Route for the typed id; any non-blank text is accepted
    pub fn open_manual(&self) -> Option<Route> {
        let id = self.manual_id.trim();
        if id.is_empty() {
            None
        } else {
            Some(Route::Deployment(id.to_string()))
        }
    }

    pub fn render(&self, poll_interval: Duration) -> String {
        let mut out = String::from("Deployment Status\n");
        match &self.deployment_id {
            Some(id) => out.push_str(&format!("Deployment ID: {}\n", id)),
            None => out.push_str("No deployment id given.\n"),
        }
        if let Some(banner) = &self.banner {
            out.push_str(&format!("{}\n", format!("! {}", banner).red()));
        }

        out.push_str("\nOverview\n");
        match &self.state {
            ViewState::Idle => out.push_str("  No data loaded.\n"),
            ViewState::Loading => out.push_str("  Loading…\n"),
            ViewState::Error(message) => {
                out.push_str(&format!("  {}\n", format!("! {}", message).red()));
            }
            ViewState::Loaded(d) => {
                let refreshing = if d.status.is_terminal() {
                    String::new()
                } else {
                    format!(" (auto-refreshing every {}s)", poll_interval.as_secs())
                };
                out.push_str(&format!("  Status:                  {}{}\n", status_pill(d.status), refreshing));
                out.push_str(&format!("  Created:                 {}\n", format_date(d.created_at.as_deref())));
                out.push_str(&format!(
                    "  Upload System ID:        {}\n",
                    d.upload_system_id.as_deref().filter(|s| !s.is_empty()).unwrap_or("-")
                ));
                out.push_str(&format!("  Retry Count:             {}\n", d.retry_count));
                out.push_str(&format!(
                    "  Verification Check Time: {}\n",
                    format_date(d.verification_check_time.as_deref())
                ));
                let extension = d
                    .extension_info
                    .as_ref()
                    .map(|e| {
                        format!(
                            "{} | {} | {}",
                            e.publisher.as_deref().unwrap_or("N/A"),
                            e.name.as_deref().unwrap_or("N/A"),
                            e.version.as_deref().unwrap_or("N/A")
                        )
                    })
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!("  Extension Info:          {}\n", extension));
            }
        }

        out.push_str("\nLogs (latest first)\n");
        let logs = self.logs_newest_first();
        if logs.is_empty() {
            out.push_str("  No logs yet.\n");
        } else {
            for line in logs {
                out.push_str(&format!("  {}\n", line));
            }
        }

        let actions = if self.can_override() {
            "available (mark completed | mark failed)".to_string()
        } else if self.is_terminal() {
            "disabled (already completed/failed)".dimmed().to_string()
        } else {
            "disabled".dimmed().to_string()
        };
        out.push_str(&format!("\nManual actions: {}\n", actions));
        out
    }
}

/// Local time for RFC 3339 strings, the raw text otherwise, `-` when missing
pub fn format_date(value: Option<&str>) -> String {
    match value.filter(|s| !s.is_empty()) {
        None => "-".to_string(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(instant) => instant
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            Err(_) => raw.to_string(),
        },
    }
}

/// Status view shared between the page and its poller
#[derive(Debug, Clone)]
pub struct SharedStatus {
    view: Arc<RwLock<StatusView>>,
    updates: Arc<watch::Sender<u64>>,
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new(StatusView::default())
    }
}

impl SharedStatus {
    pub fn new(view: StatusView) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            view: Arc::new(RwLock::new(view)),
            updates: Arc::new(updates),
        }
    }

    pub fn view(&self) -> &RwLock<StatusView> {
        &self.view
    }

    /// Receiver bumped after every applied change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub async fn is_terminal(&self) -> bool {
        self.view.read().await.is_terminal()
    }

    fn notify(&self) {
        self.updates.send_modify(|revision| *revision += 1);
    }

    /// Fetch the current deployment and apply it if still the newest
    pub async fn fetch<A: DeploymentsApi + ?Sized>(&self, api: &A) {
        let (deployment_id, ticket) = {
            let mut view = self.view.write().await;
            let Some(id) = view.deployment_id.clone() else {
                return;
            };
            (id, view.begin_request())
        };
        self.notify();

        let result = api.get_deployment(&deployment_id).await;

        let applied = {
            let mut view = self.view.write().await;
            // a navigation in between makes this response irrelevant
            if view.deployment_id.as_deref() != Some(deployment_id.as_str()) {
                return;
            }
            view.finish_request(ticket, result)
        };
        if applied {
            self.notify();
        }
    }

    /// Force a terminal status, then re-fetch to confirm
    pub async fn mark<A: DeploymentsApi + ?Sized>(
        &self,
        api: &A,
        status: ManualStatus,
    ) -> Result<(), ConsoleError> {
        let (deployment_id, ticket) = {
            let mut view = self.view.write().await;
            let Some(id) = view.deployment_id.clone() else {
                return Err(ConsoleError::ValidationError("No deployment selected.".to_string()));
            };
            if view.is_terminal() {
                return Err(ConsoleError::ValidationError(
                    "Deployment is already completed/failed.".to_string(),
                ));
            }
            if view.in_flight > 0 {
                return Err(ConsoleError::ValidationError(
                    "A request is still in progress.".to_string(),
                ));
            }
            view.banner = None;
            (id, view.begin_action())
        };
        self.notify();

        info!("Marking deployment {} as {}", deployment_id, status);
        let result = api.update_deployment_status(&deployment_id, status).await;

        {
            let mut view = self.view.write().await;
            view.release(ticket);
            if let Err(e) = &result {
                warn!("Failed to update status: {}", e);
                view.banner = Some(e.user_message("Failed to update status"));
            }
        }
        self.notify();

        result?;
        self.fetch(api).await;
        Ok(())
    }
}

/// Status page: the shared view plus at most one poller
pub struct StatusPage<A: DeploymentsApi + ?Sized + 'static> {
    api: Arc<A>,
    options: poller::Options,
    status: SharedStatus,
    poller: Option<PollerHandle>,
}

impl<A: DeploymentsApi + ?Sized + 'static> StatusPage<A> {
    pub fn new(api: Arc<A>, options: poller::Options) -> Self {
        Self {
            api,
            options,
            status: SharedStatus::default(),
            poller: None,
        }
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    pub fn poll_interval(&self) -> Duration {
        self.options.interval
    }

    /// Show another deployment. The previous poller is gone before the new
    /// one starts.
    pub async fn navigate(&mut self, deployment_id: &str) {
        if let Some(old) = self.poller.take() {
            old.stop().await;
        }
        self.status.view().write().await.reset_for(deployment_id);
        self.status.notify();

        self.poller = Some(PollerHandle::spawn(
            self.options.clone(),
            self.api.clone(),
            self.status.clone(),
            deployment_id.to_string(),
        ));
    }

    /// One-off fetch, e.g. the refresh action
    pub async fn refresh(&self) {
        self.status.fetch(self.api.as_ref()).await;
    }

    pub async fn mark(&self, status: ManualStatus) -> Result<(), ConsoleError> {
        self.status.mark(self.api.as_ref(), status).await
    }

    /// Stop polling, e.g. when leaving the page
    pub async fn close(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }
}
