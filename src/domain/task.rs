//! Task record shapes and their embedded activity logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::document::Patch;
use super::id::RecordId;

/// A task record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: RecordId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Priority", default)]
    pub priority: i64,
    #[serde(rename = "Start_Date", default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "End_Date", default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "Concurrence", default)]
    pub concurrence: bool,
    #[serde(rename = "State", default)]
    pub state: String,
    /// Identifier of the employee the task was created under.
    #[serde(rename = "employeeId", default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<RecordId>,
    /// Identifiers of KPIs attached to this task.
    #[serde(rename = "Kpis", default)]
    pub kpis: Vec<RecordId>,
    /// Activity log entries, oldest first.
    #[serde(rename = "Task_Logs", default)]
    pub task_logs: Vec<TaskLog>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// A single log entry recorded against a task.
///
/// Only the registration timestamp is mandatory. Every other field is
/// caller-defined and kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskLog {
    #[serde(rename = "registerDate")]
    pub register_date: DateTime<Utc>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

impl TaskLog {
    /// Render as the JSON object stored inside the task document.
    pub fn into_value(self) -> Value {
        let mut obj = self.fields;
        obj.insert(
            "registerDate".to_string(),
            Value::String(self.register_date.to_rfc3339()),
        );
        Value::Object(obj)
    }
}

/// Body accepted when appending a log entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskLogPayload {
    /// Registration timestamp. Defaults to the current time when omitted.
    #[serde(
        rename = "registerDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub register_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

impl TaskLogPayload {
    pub fn into_log(self) -> TaskLog {
        TaskLog {
            register_date: self.register_date.unwrap_or_else(Utc::now),
            fields: self.fields,
        }
    }
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskPayload {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Priority")]
    pub priority: i64,
    #[serde(rename = "Start_Date")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "End_Date")]
    pub end_date: DateTime<Utc>,
    #[serde(rename = "Concurrence")]
    pub concurrence: bool,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl TaskPayload {
    /// Flatten into stored fields for a task owned by `employee_id`.
    pub fn into_fields(self, employee_id: RecordId) -> Map<String, Value> {
        let mut fields = self.extra;
        fields.remove("id");
        fields.insert("Title".to_string(), Value::String(self.title));
        fields.insert("Priority".to_string(), Value::from(self.priority));
        fields.insert(
            "Start_Date".to_string(),
            Value::String(self.start_date.to_rfc3339()),
        );
        fields.insert(
            "End_Date".to_string(),
            Value::String(self.end_date.to_rfc3339()),
        );
        fields.insert("Concurrence".to_string(), Value::Bool(self.concurrence));
        fields.insert("State".to_string(), Value::String(self.state));
        fields.insert(
            "employeeId".to_string(),
            Value::String(employee_id.to_string()),
        );
        fields.insert("Kpis".to_string(), Value::Array(Vec::new()));
        fields.insert("Task_Logs".to_string(), Value::Array(Vec::new()));
        fields
    }
}

/// Partial update for a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskUpdate {
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Priority", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(rename = "Start_Date", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "End_Date", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "Concurrence", default, skip_serializing_if = "Option::is_none")]
    pub concurrence: Option<bool>,
    #[serde(rename = "State", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl TaskUpdate {
    /// Build a patch covering only the provided fields.
    pub fn into_patch(self) -> Patch {
        let mut patch = Patch::new();
        if let Some(title) = self.title {
            patch = patch.set("Title", title);
        }
        if let Some(priority) = self.priority {
            patch = patch.set("Priority", priority);
        }
        if let Some(start_date) = self.start_date {
            patch = patch.set("Start_Date", start_date.to_rfc3339());
        }
        if let Some(end_date) = self.end_date {
            patch = patch.set("End_Date", end_date.to_rfc3339());
        }
        if let Some(concurrence) = self.concurrence {
            patch = patch.set("Concurrence", concurrence);
        }
        if let Some(state) = self.state {
            patch = patch.set("State", state);
        }
        for (name, value) in self.extra {
            if name == "id" {
                continue;
            }
            patch = patch.set(name, value);
        }
        patch
    }
}
