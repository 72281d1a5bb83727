// ============================================================
// Layer 2 - Make a Bucket Publicly Readable
// ============================================================
// Fetch the bucket's IAM policy (version 3), append one
// objectViewer binding for the given members, write it back.
//
// No retries and no rollback: the write is a single call that
// either replaces the policy or fails.

use anyhow::Result;

use crate::domain::{
    iam::{OBJECT_VIEWER_ROLE, POLICY_VERSION},
    traits::IamPolicyStore,
};

pub const DEFAULT_BUCKET: &str = "dtumlops_project_data_bucket";
pub const DEFAULT_MEMBER: &str = "allUsers";

#[derive(Debug, Clone)]
pub struct PublicBucketRequest {
    pub bucket_name: String,
    pub members:     Vec<String>,
}

impl Default for PublicBucketRequest {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET.to_string(),
            members:     vec![DEFAULT_MEMBER.to_string()],
        }
    }
}

/// Grant objectViewer on `request.bucket_name` and return the bucket name.
pub fn set_bucket_public_iam(
    store:   &dyn IamPolicyStore,
    request: &PublicBucketRequest,
) -> Result<String> {
    let bucket = &request.bucket_name;

    let mut policy = store.get_iam_policy(bucket, POLICY_VERSION)?;
    tracing::debug!("Bucket {} has {} binding(s)", bucket, policy.bindings.len());

    policy.append_binding(OBJECT_VIEWER_ROLE, request.members.clone());
    store.set_iam_policy(bucket, &policy)?;

    tracing::info!(
        "Granted {} to {:?} on bucket {}",
        OBJECT_VIEWER_ROLE,
        request.members,
        bucket
    );
    Ok(bucket.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::iam::{Binding, IamPolicy};
    use anyhow::anyhow;
    use std::cell::RefCell;

    /// In-memory policy store recording every call.
    struct FakeStore {
        policy:        RefCell<IamPolicy>,
        versions_seen: RefCell<Vec<u32>>,
        writes:        RefCell<usize>,
        fail_write:    bool,
    }

    impl FakeStore {
        fn new() -> Self {
            Self {
                policy: RefCell::new(IamPolicy {
                    kind:        Some("storage#policy".into()),
                    resource_id: Some("projects/_/buckets/data".into()),
                    version:     1,
                    bindings:    vec![Binding {
                        role:      "roles/storage.legacyBucketOwner".into(),
                        members:   vec!["projectOwner:demo".into()],
                        condition: None,
                    }],
                    etag:        Some("CAE=".into()),
                }),
                versions_seen: RefCell::new(Vec::new()),
                writes:        RefCell::new(0),
                fail_write:    false,
            }
        }
    }

    impl IamPolicyStore for FakeStore {
        fn get_iam_policy(&self, _bucket: &str, version: u32) -> Result<IamPolicy> {
            self.versions_seen.borrow_mut().push(version);
            Ok(self.policy.borrow().clone())
        }

        fn set_iam_policy(&self, _bucket: &str, policy: &IamPolicy) -> Result<IamPolicy> {
            if self.fail_write {
                return Err(anyhow!("403 Forbidden"));
            }
            *self.writes.borrow_mut() += 1;
            *self.policy.borrow_mut() = policy.clone();
            Ok(policy.clone())
        }
    }

    #[test]
    fn test_appends_one_object_viewer_binding() {
        let store = FakeStore::new();
        let bucket = set_bucket_public_iam(&store, &PublicBucketRequest::default()).unwrap();

        assert_eq!(bucket, DEFAULT_BUCKET);
        assert_eq!(*store.versions_seen.borrow(), vec![3]);
        assert_eq!(*store.writes.borrow(), 1);

        let policy = store.policy.borrow();
        assert_eq!(policy.bindings.len(), 2);
        assert_eq!(policy.members_for(OBJECT_VIEWER_ROLE), vec!["allUsers"]);
        // The etag goes back unchanged
        assert_eq!(policy.etag.as_deref(), Some("CAE="));
    }

    #[test]
    fn test_custom_members() {
        let store = FakeStore::new();
        let request = PublicBucketRequest {
            bucket_name: "other".into(),
            members:     vec!["allAuthenticatedUsers".into(), "user:a@example.com".into()],
        };
        set_bucket_public_iam(&store, &request).unwrap();

        let policy = store.policy.borrow();
        let last = policy.bindings.last().unwrap();
        assert_eq!(last.role, OBJECT_VIEWER_ROLE);
        assert_eq!(last.members, request.members);
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut store = FakeStore::new();
        store.fail_write = true;
        assert!(set_bucket_public_iam(&store, &PublicBucketRequest::default()).is_err());
        assert_eq!(store.policy.borrow().bindings.len(), 1);
    }
}
