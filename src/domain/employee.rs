//! Employee record shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::document::Patch;
use super::id::RecordId;

/// An employee record as returned by the API.
///
/// The base fields are typed; anything added through schema extensions or
/// ad-hoc writes rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: RecordId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Department", default)]
    pub department: String,
    #[serde(rename = "Work_position", default)]
    pub work_position: String,
    #[serde(rename = "Role", default)]
    pub role: i64,
    /// Identifiers of tasks assigned to this employee.
    #[serde(rename = "Tasks", default)]
    pub tasks: Vec<RecordId>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Fields accepted when creating an employee.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeePayload {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Work_position")]
    pub work_position: String,
    #[serde(rename = "Role")]
    pub role: i64,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl EmployeePayload {
    /// Flatten into stored fields. Base fields win over colliding extras.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.extra;
        fields.remove("id");
        fields.insert("Name".to_string(), Value::String(self.name));
        fields.insert("Department".to_string(), Value::String(self.department));
        fields.insert(
            "Work_position".to_string(),
            Value::String(self.work_position),
        );
        fields.insert("Role".to_string(), Value::from(self.role));
        fields.insert("Tasks".to_string(), Value::Array(Vec::new()));
        fields
    }
}

/// Partial update for an employee. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EmployeeUpdate {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Department", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(
        rename = "Work_position",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub work_position: Option<String>,
    #[serde(rename = "Role", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<i64>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl EmployeeUpdate {
    /// Build a patch covering only the provided fields.
    pub fn into_patch(self) -> Patch {
        let mut patch = Patch::new();
        if let Some(name) = self.name {
            patch = patch.set("Name", name);
        }
        if let Some(department) = self.department {
            patch = patch.set("Department", department);
        }
        if let Some(work_position) = self.work_position {
            patch = patch.set("Work_position", work_position);
        }
        if let Some(role) = self.role {
            patch = patch.set("Role", role);
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_keeps_ad_hoc_fields() {
        let payload: EmployeePayload = serde_json::from_value(json!({
            "Name": "Ana",
            "Department": "Sales",
            "Work_position": "Rep",
            "Role": 2,
            "badge": "B-17"
        }))
        .unwrap();

        let fields = payload.into_fields();
        assert_eq!(fields["Name"], json!("Ana"));
        assert_eq!(fields["badge"], json!("B-17"));
        assert_eq!(fields["Tasks"], json!([]));
    }

    #[test]
    fn base_fields_win_over_colliding_extras() {
        let mut payload: EmployeePayload = serde_json::from_value(json!({
            "Name": "Ana",
            "Department": "Sales",
            "Work_position": "Rep",
            "Role": 2
        }))
        .unwrap();
        payload.extra.insert("Tasks".to_string(), json!("bogus"));
        payload.extra.insert("id".to_string(), json!("bogus"));

        let fields = payload.into_fields();
        assert_eq!(fields["Tasks"], json!([]));
        assert!(!fields.contains_key("id"));
    }

    #[test]
    fn update_patch_covers_only_provided_fields() {
        let update: EmployeeUpdate = serde_json::from_value(json!({
            "Department": "Support",
            "badge": "B-18"
        }))
        .unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert("Name".to_string(), json!("Ana"));
        fields.insert("Department".to_string(), json!("Sales"));
        update.into_patch().apply(&mut fields);

        assert_eq!(fields["Name"], json!("Ana"));
        assert_eq!(fields["Department"], json!("Support"));
        assert_eq!(fields["badge"], json!("B-18"));
    }
}
