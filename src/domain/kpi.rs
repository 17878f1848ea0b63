//! KPI record shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::id::RecordId;
use crate::error::CoreError;

/// Bounds accepted for a KPI's measurement window, in days.
pub const TIME_UNIT_MIN: i64 = 0;
pub const TIME_UNIT_MAX: i64 = 5;

/// A key performance indicator attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Kpi {
    pub id: RecordId,
    #[serde(rename = "Title", default)]
    pub title: String,
    /// Expected number of distinct values per time unit.
    #[serde(rename = "Target", default)]
    pub target: f64,
    /// Measurement window in days. Evaluation treats it as at least one.
    #[serde(rename = "Time_Unit", default)]
    pub time_unit: i64,
    /// Log field whose values the KPI counts.
    #[serde(rename = "Field_To_Be_Evaluated", default)]
    pub field_to_be_evaluated: String,
    /// Identifier of the task the KPI was created under.
    #[serde(rename = "taskId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<RecordId>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Fields accepted when creating a KPI.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KpiPayload {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Target")]
    pub target: f64,
    #[serde(rename = "Time_Unit")]
    pub time_unit: i64,
    #[serde(rename = "Field_To_Be_Evaluated")]
    pub field_to_be_evaluated: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl KpiPayload {
    /// Bounds-check the measurement window.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(TIME_UNIT_MIN..=TIME_UNIT_MAX).contains(&self.time_unit) {
            return Err(CoreError::InvalidRange {
                field: "Time_Unit",
                min: TIME_UNIT_MIN,
                max: TIME_UNIT_MAX,
                value: self.time_unit,
            });
        }
        Ok(())
    }

    /// Flatten into stored fields for a KPI attached to `task_id`.
    pub fn into_fields(self, task_id: RecordId) -> Map<String, Value> {
        let mut fields = self.extra;
        fields.remove("id");
        fields.insert("Title".to_string(), Value::String(self.title));
        fields.insert("Target".to_string(), Value::from(self.target));
        fields.insert("Time_Unit".to_string(), Value::from(self.time_unit));
        fields.insert(
            "Field_To_Be_Evaluated".to_string(),
            Value::String(self.field_to_be_evaluated),
        );
        fields.insert("taskId".to_string(), Value::String(task_id.to_string()));
        fields
    }
}
