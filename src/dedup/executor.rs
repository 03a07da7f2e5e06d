//! Deletion executor: applies the resolution policy to duplicate groups
//! and drives the store's batch-delete, building a recoverable audit
//! trail. Groups are processed independently; a failing group is recorded
//! and never aborts its siblings. There is no rollback and no retry; the
//! caller re-submits only the failed groups.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::{DedupError, Result};
use super::models::{AuditEntry, DeletionResult, DuplicateGroup};
use super::policy;
use crate::store::DocumentStore;

/// Resolve keep/delete sets for each group and execute the deletions.
///
/// Refuses to run without explicit confirmation or when any group payload
/// is malformed (empty id or empty member list); both are terminal errors
/// raised before any store interaction. Groups whose delete set is empty
/// are a no-op and produce no audit entry.
pub async fn resolve_and_delete(
    groups: &[DuplicateGroup],
    store: &dyn DocumentStore,
    namespace: &str,
    confirmed: bool,
) -> Result<DeletionResult> {
    if !confirmed {
        return Err(DedupError::ConfirmationRequired);
    }

    for group in groups {
        if group.id.is_empty() {
            return Err(DedupError::Validation(
                "duplicate group payload is missing an id".to_string(),
            ));
        }
        if group.members.is_empty() {
            return Err(DedupError::Validation(format!(
                "duplicate group {} has no members",
                group.id
            )));
        }
    }

    info!(
        namespace,
        groups = groups.len(),
        "executing duplicate resolution"
    );

    let mut result = DeletionResult::default();

    for group in groups {
        let selection = policy::select(group);
        if selection.delete.is_empty() {
            debug!(group = %group.id, "nothing to delete, skipping");
            continue;
        }

        match store.delete_many(namespace, &selection.delete).await {
            Ok(()) => {
                result.deleted_documents += selection.delete.len();
                result.audit_trail.push(AuditEntry {
                    group_id: group.id.clone(),
                    deleted_ids: selection.delete,
                    kept_id: selection.keep,
                    reason: format!("{} ({})", group.reason, group.recommended_action),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(group = %group.id, error = %e, "group deletion failed, continuing");
                result.errors.insert(group.id.clone(), e.to_string());
            }
        }
    }

    result.success = result.errors.is_empty();
    info!(
        namespace,
        deleted = result.deleted_documents,
        failed_groups = result.errors.len(),
        "duplicate resolution finished"
    );

    Ok(result)
}
