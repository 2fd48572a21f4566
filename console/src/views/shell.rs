//! Application shell: routes, header and navigation

use std::fmt;

use colored::Colorize;
use url::Url;

pub const BRAND: &str = "BC Extension Deployer";

const TIP: &str =
    "Tip: create/select a Project, then upload a .app to deploy (immediate or scheduled).";

/// Console routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Projects,
    Deploy,
    Deployment(String),
}

impl Route {
    /// Resolve a path. The root and unknown paths land on the projects view.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            ["projects"] => Route::Projects,
            ["deploy"] => Route::Deploy,
            ["deployments", id] => Route::Deployment((*id).to_string()),
            _ => Route::Projects,
        }
    }

    fn nav_label(&self) -> Option<&'static str> {
        match self {
            Route::Projects => Some("Projects"),
            Route::Deploy => Some("Deploy"),
            Route::Deployment(_) => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Projects => f.write_str("/projects"),
            Route::Deploy => f.write_str("/deploy"),
            Route::Deployment(id) => write!(f, "/deployments/{}", id),
        }
    }
}

/// Header printed above every view
pub fn render_header(backend: &Url, active: &Route) -> String {
    let nav: Vec<String> = [Route::Projects, Route::Deploy]
        .iter()
        .filter_map(|route| {
            let label = route.nav_label()?;
            Some(if route == active {
                format!("[{}]", label).bold().to_string()
            } else {
                format!(" {} ", label)
            })
        })
        .collect();

    format!(
        "{}\nBackend: {}\n{}\n{}\n",
        BRAND.bold(),
        backend,
        nav.join(" "),
        TIP.dimmed()
    )
}
