// Library crate for integration tests.
// main.rs has its own mod declarations; this re-exports all modules.

pub mod batch;
pub mod browser;
pub mod config;
pub mod error;
pub mod flows;
pub mod links;
pub mod monitor;
pub mod pages;
pub mod progress;
pub mod region;
pub mod report;
pub mod results;
pub mod routes;
pub mod server;
pub mod state;
pub mod watcher;
