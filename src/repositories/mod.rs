//! # Repository Layer
//!
//! This module contains the tenant-scoped repositories for employee, task
//! and KPI records. Each repository resolves its model accessors through
//! the registry per call, so the partition cache and schema extensions
//! are always consulted.

pub mod employee;
pub mod kpi;
pub mod task;

pub use employee::EmployeeRepository;
pub use kpi::KpiRepository;
pub use task::{TaskRemoval, TaskRepository};
