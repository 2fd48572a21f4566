//! Console views, one per route, plus the shared presentation pieces

pub mod confirm;
pub mod deploy;
pub mod pill;
pub mod projects;
pub mod shell;
pub mod state;
pub mod status;
pub mod table;
