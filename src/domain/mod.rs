//! # Domain Model
//!
//! Record types shared by the tenant-scoped data layer: identifier
//! newtypes, the dynamic field system, untyped documents, and the
//! employee/task/KPI shapes the repositories work with.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

pub mod document;
pub mod employee;
pub mod field;
pub mod id;
pub mod kpi;
pub mod task;

pub use document::{Document, Filter, Patch, decode};
pub use employee::{Employee, EmployeePayload, EmployeeUpdate};
pub use field::{FieldType, FieldValue};
pub use id::{RecordId, TenantId};
pub use kpi::{Kpi, KpiPayload};
pub use task::{Task, TaskLog, TaskLogPayload, TaskPayload, TaskUpdate};

/// The closed set of record kinds every partition carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Employee,
    Task,
    Kpi,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Employee, EntityKind::Task, EntityKind::Kpi];

    /// Collection name the kind's records are stored under.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Employee => "employees",
            EntityKind::Task => "tasks",
            EntityKind::Kpi => "kpis",
        }
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Employee => "Employee",
            EntityKind::Task => "Task",
            EntityKind::Kpi => "KPI",
        }
    }

    /// Field names owned by the base schema, which extensions may not shadow.
    pub fn base_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Employee => &["id", "Name", "Department", "Work_position", "Role", "Tasks"],
            EntityKind::Task => &[
                "id",
                "Title",
                "Priority",
                "Start_Date",
                "End_Date",
                "Concurrence",
                "State",
                "employeeId",
                "Kpis",
                "Task_Logs",
            ],
            EntityKind::Kpi => &[
                "id",
                "Title",
                "Target",
                "Time_Unit",
                "Field_To_Be_Evaluated",
                "taskId",
            ],
        }
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employees" => Ok(EntityKind::Employee),
            "tasks" => Ok(EntityKind::Task),
            "kpis" => Ok(EntityKind::Kpi),
            other => Err(CoreError::invalid_identifier(format!(
                "unknown record kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_their_collection_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.collection().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("departments".parse::<EntityKind>().is_err());
        // Singular forms are not accepted.
        assert!("employee".parse::<EntityKind>().is_err());
    }

    #[test]
    fn every_kind_reserves_its_id_field() {
        for kind in EntityKind::ALL {
            assert!(kind.base_fields().contains(&"id"));
        }
    }
}
