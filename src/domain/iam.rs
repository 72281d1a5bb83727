// ============================================================
// Layer 3 - IAM Policy Document
// ============================================================
// Mirrors the JSON shape of a Cloud Storage bucket IAM policy:
//
//   {
//     "kind": "storage#policy",
//     "resourceId": "projects/_/buckets/my-bucket",
//     "version": 3,
//     "bindings": [
//       { "role": "roles/storage.admin", "members": ["user:a@b.c"] }
//     ],
//     "etag": "CAE="
//   }
//
// The etag is sent back unchanged on write so the service can
// reject a concurrent modification.

use serde::{Deserialize, Serialize};

/// Role that grants read access to every object in a bucket.
pub const OBJECT_VIEWER_ROLE: &str = "roles/storage.objectViewer";

/// Policy version that supports conditional bindings.
pub const POLICY_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub bindings: Vec<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,

    #[serde(default)]
    pub members: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// CEL condition attached to a binding (version 3 policies only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub expression: String,
}

impl IamPolicy {
    /// Append a new binding. Existing bindings for the same role are
    /// left alone, so the policy may end up with two entries for it.
    pub fn append_binding(&mut self, role: impl Into<String>, members: Vec<String>) {
        self.bindings.push(Binding {
            role: role.into(),
            members,
            condition: None,
        });
    }

    /// All members granted `role` by any unconditional binding.
    pub fn members_for(&self, role: &str) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| b.role == role && b.condition.is_none())
            .flat_map(|b| b.members.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "kind": "storage#policy",
        "resourceId": "projects/_/buckets/data",
        "version": 3,
        "etag": "CAE=",
        "bindings": [
            {"role": "roles/storage.legacyBucketOwner",
             "members": ["projectOwner:demo"]},
            {"role": "roles/storage.objectViewer",
             "members": ["user:a@example.com"],
             "condition": {"title": "temp", "expression": "request.time < timestamp('2030-01-01T00:00:00Z')"}}
        ]
    }"#;

    #[test]
    fn test_parses_service_response() {
        let p: IamPolicy = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(p.version, 3);
        assert_eq!(p.etag.as_deref(), Some("CAE="));
        assert_eq!(p.bindings.len(), 2);
        assert!(p.bindings[1].condition.is_some());
    }

    #[test]
    fn test_append_binding_keeps_existing() {
        let mut p: IamPolicy = serde_json::from_str(SAMPLE).unwrap();
        p.append_binding(OBJECT_VIEWER_ROLE, vec!["allUsers".into()]);

        assert_eq!(p.bindings.len(), 3);
        // The conditional grant does not count as unconditional access
        assert_eq!(p.members_for(OBJECT_VIEWER_ROLE), vec!["allUsers"]);
    }

    #[test]
    fn test_serialises_camel_case_without_nulls() {
        let mut p = IamPolicy {
            kind: None,
            resource_id: Some("projects/_/buckets/x".into()),
            version: 3,
            bindings: Vec::new(),
            etag: None,
        };
        p.append_binding(OBJECT_VIEWER_ROLE, vec!["allUsers".into()]);

        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["resourceId"], "projects/_/buckets/x");
        assert!(v.get("etag").is_none());
        assert!(v["bindings"][0].get("condition").is_none());
    }
}
