//! webforge build orchestrator library
//!
//! This module exports the core components for testing and integration.

pub mod banner;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod tasks;
pub mod watch;
