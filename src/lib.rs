//! march - URL archiver with pluggable capture agents.
//!
//! Clients submit URLs to a named archive; a matching capture agent fetches
//! the content in the background, identical bytes are stored once per
//! archive, and every submission gets its own stable id for retrieval.

pub mod capture;
pub mod cli;
pub mod config;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
