//! repolens library crate
//!
//! Exposes the repository context, content cache, file lookup and the
//! conversational assistant so benchmarks and other front ends can drive
//! them without going through the CLI.

pub mod assistant;
pub mod cache;
pub mod chat;
pub mod config;
pub mod docs;
pub mod error;
pub mod github;
pub mod locator;
pub mod manifest;
pub mod repo;
pub mod session;
pub mod util;
