//! # Workboard API Library
//!
//! This library provides the core functionality for the Workboard API service,
//! including tenant-scoped storage, the KPI evaluation engine, handlers, and
//! server configuration.

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod tenancy;
pub use migration;
