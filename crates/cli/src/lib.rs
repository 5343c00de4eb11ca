//! testdeck CLI
//!
//! Backend clients, view controllers and the command tree for the testdeck
//! product-testing dashboard.

pub mod client;
pub mod commands;
pub mod config;
pub mod output;
pub mod views;

pub use client::{ApiError, CatalogApi, CatalogClient, InstructionsApi, InstructionsClient};
pub use config::ClientConfig;
pub use views::{CatalogManager, InstructionGenerator, Outcome, SkipReason};
