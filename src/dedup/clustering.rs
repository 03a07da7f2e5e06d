//! Greedy single-link duplicate clustering.
//!
//! Partitions a record batch into duplicate groups with an O(n^2) pairwise
//! scan, deterministic given input order. Each candidate is scored against
//! the forming group's first record (the anchor), never against a running
//! centroid, so membership is not transitive: two records each similar
//! enough to the anchor land in the same group even when they are not
//! similar to each other. That greedy approximation is deliberate; callers
//! relying on output shape depend on it.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{DedupError, Result};
use super::models::{
    DeduplicationOptions, DocumentRecord, DuplicateGroup, DuplicationAnalysis, GroupMember,
    PotentialSavings, SimilarityResult,
};
use super::policy;
use super::similarity::score_pair;

/// Groups whose score reaches this floor count as exact matches.
const EXACT_MATCH_FLOOR: f64 = 99.9;

/// Analyze a record batch for duplicate groups.
///
/// Pure with respect to its inputs: no I/O, no cross-call state. Fails
/// fast on an empty batch; batches longer than `options.max_documents`
/// are truncated to the cap.
pub fn analyze(
    records: &[DocumentRecord],
    options: &DeduplicationOptions,
) -> Result<DuplicationAnalysis> {
    if records.is_empty() {
        return Err(DedupError::Validation(
            "cannot analyze an empty record batch".to_string(),
        ));
    }

    let records = if records.len() > options.max_documents {
        warn!(
            total = records.len(),
            cap = options.max_documents,
            "record batch exceeds max_documents, truncating"
        );
        &records[..options.max_documents]
    } else {
        records
    };

    info!(
        total = records.len(),
        threshold = options.threshold,
        mode = ?options.similarity_mode,
        "starting duplicate analysis"
    );

    let mut processed: HashSet<&str> = HashSet::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (index, anchor) in records.iter().enumerate() {
        if processed.contains(anchor.id.as_str()) {
            continue;
        }

        let mut members: Vec<&DocumentRecord> = vec![anchor];
        let mut first_pair: Option<SimilarityResult> = None;

        for candidate in &records[index + 1..] {
            if processed.contains(candidate.id.as_str()) {
                continue;
            }
            // Always scored against the anchor, not the running group.
            let result = score_pair(&anchor.attributes, &candidate.attributes, options);
            if result.score >= options.threshold {
                processed.insert(candidate.id.as_str());
                members.push(candidate);
                if first_pair.is_none() {
                    first_pair = Some(result);
                }
            }
        }

        if members.len() < 2 {
            continue;
        }
        let Some(pair) = first_pair else { continue };

        processed.insert(anchor.id.as_str());
        debug!(
            anchor = %anchor.id,
            size = members.len(),
            score = pair.score,
            "emitting duplicate group"
        );
        groups.push(build_group(&members, pair, options));
    }

    groups.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });

    let grouped_documents: usize = groups.iter().map(|g| g.members.len()).sum();
    let exact_matches = groups
        .iter()
        .filter(|g| g.similarity_score >= EXACT_MATCH_FLOOR)
        .count();
    let documents_to_delete: usize = groups.iter().map(|g| g.members.len() - 1).sum();

    let analysis = DuplicationAnalysis {
        total_documents: records.len(),
        exact_matches,
        fuzzy_matches: groups.len() - exact_matches,
        unique_documents: records.len() - grouped_documents,
        potential_savings: PotentialSavings {
            documents_to_delete,
        },
        groups,
    };

    info!(
        groups = analysis.groups.len(),
        exact = analysis.exact_matches,
        fuzzy = analysis.fuzzy_matches,
        unique = analysis.unique_documents,
        to_delete = analysis.potential_savings.documents_to_delete,
        "duplicate analysis complete"
    );

    Ok(analysis)
}

fn build_group(
    records: &[&DocumentRecord],
    pair: SimilarityResult,
    options: &DeduplicationOptions,
) -> DuplicateGroup {
    let members: Vec<GroupMember> = records
        .iter()
        .map(|record| GroupMember {
            id: record.id.clone(),
            last_modified: policy::extract_timestamp(&record.attributes),
            attributes: record.attributes.clone(),
        })
        .collect();

    let recommended_action = policy::recommend(options.strategy, &members);

    DuplicateGroup {
        id: format!("group_{}", Uuid::new_v4()),
        similarity_score: pair.score,
        members,
        recommended_action,
        reason: pair.reason,
        matching_fields: pair.matching_fields,
    }
}
