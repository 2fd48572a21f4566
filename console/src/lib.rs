//! BC Deployer console library
//!
//! Typed client for the deployer backend plus the projects, deploy and
//! deployment status views driven by the `bcdeploy` binary.

pub mod app;
pub mod cli;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod storage;
pub mod utils;
pub mod views;
pub mod workers;
