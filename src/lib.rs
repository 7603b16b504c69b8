//! Support desk MCP server library.
//!
//! Role-aware ticket listing and operational dashboards over a multi-tenant
//! ticket store.

pub mod cli;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod format;
pub mod listing;
pub mod logging;
pub mod reports;
pub mod service;
pub mod tools;
pub mod types;
pub mod web;
