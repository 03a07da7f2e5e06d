//! Record-pair similarity scoring.
//!
//! Aggregates field comparator results across every comparable key of two
//! attribute maps into a single [0,100] score plus supporting evidence.
//! Byte-identical maps short-circuit to 100 in every mode; exact mode
//! scores everything else 0; fuzzy and custom modes average per-field
//! scores over the include/exclude-filtered key union.

use std::collections::BTreeSet;

use super::field_comparator::{compare_field, constants::FIELD_MATCH_THRESHOLD};
use super::models::{
    canonical_json, AttributeMap, DeduplicationOptions, SimilarityMode, SimilarityResult,
};

/// Score the similarity of two attribute maps under the given options.
pub fn score_pair(
    a: &AttributeMap,
    b: &AttributeMap,
    options: &DeduplicationOptions,
) -> SimilarityResult {
    if canonical_json(a) == canonical_json(b) {
        let matching_fields: Vec<String> = present_keys(a, b).into_iter().cloned().collect();
        return SimilarityResult {
            score: 100.0,
            matching_fields,
            reason: "exact metadata match".to_string(),
        };
    }

    if options.similarity_mode == SimilarityMode::Exact {
        return SimilarityResult {
            score: 0.0,
            matching_fields: Vec::new(),
            reason: "no exact match".to_string(),
        };
    }

    let keys: Vec<&String> = present_keys(a, b)
        .into_iter()
        .filter(|key| {
            options
                .include_keys
                .as_ref()
                .map_or(true, |include| include.iter().any(|k| k == *key))
        })
        .filter(|key| {
            options
                .exclude_keys
                .as_ref()
                .map_or(true, |exclude| !exclude.iter().any(|k| k == *key))
        })
        .collect();

    if keys.is_empty() {
        return SimilarityResult {
            score: 0.0,
            matching_fields: Vec::new(),
            reason: "no comparable fields".to_string(),
        };
    }

    let mut matching_fields = Vec::new();
    let mut total = 0.0;
    for key in &keys {
        let field_score = compare_field(key.as_str(), a.get(*key), b.get(*key));
        if field_score > FIELD_MATCH_THRESHOLD {
            matching_fields.push((*key).clone());
        }
        total += field_score;
    }

    let score = ((total / keys.len() as f64) * 100.0).round() / 100.0;

    SimilarityResult {
        reason: describe(score, &matching_fields),
        score,
        matching_fields,
    }
}

/// Union of the keys present in either map, in deterministic order.
fn present_keys<'a>(a: &'a AttributeMap, b: &'a AttributeMap) -> BTreeSet<&'a String> {
    a.keys().chain(b.keys()).collect()
}

fn describe(score: f64, matching_fields: &[String]) -> String {
    if score >= 95.0 {
        format!("near-exact match on {} fields", matching_fields.len())
    } else if score >= 85.0 {
        let names: Vec<&str> = matching_fields
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        format!("high similarity on fields: {}", names.join(", "))
    } else if score >= 70.0 {
        format!("moderate similarity on {} fields", matching_fields.len())
    } else {
        "low similarity detected".to_string()
    }
}
