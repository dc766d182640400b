//! Command-line front end for construction estimates.

pub mod app;
pub mod config;
pub mod logging;
pub mod utils;
