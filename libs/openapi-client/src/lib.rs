//! Wire models for the BC extension deployment backend.

pub mod models;
