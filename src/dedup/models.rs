use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Flat string-keyed attribute map attached to a store record.
///
/// Values are the tagged union serde_json exposes (null, bool, number,
/// string, structured), which is exactly the shape the field comparator
/// dispatches on. serde_json's default BTreeMap-backed object keeps keys
/// sorted, so serializing a map yields a canonical form suitable for
/// byte-equality checks.
pub type AttributeMap = Map<String, Value>;

/// Canonical serialization of an attribute map. Two maps are byte-equal
/// under this form iff they hold the same keys and values.
pub fn canonical_json(attributes: &AttributeMap) -> String {
    serde_json::to_string(attributes).unwrap_or_default()
}

/// A store record as seen by the engine: opaque id plus attributes.
/// Immutable for the duration of an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMode {
    Exact,
    Fuzzy,
    Custom,
}

impl FromStr for SimilarityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(SimilarityMode::Exact),
            "fuzzy" => Ok(SimilarityMode::Fuzzy),
            "custom" => Ok(SimilarityMode::Custom),
            _ => Err(format!("Invalid similarity mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    KeepFirst,
    KeepNewest,
    Manual,
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep-first" | "keep_first" => Ok(ResolutionStrategy::KeepFirst),
            "keep-newest" | "keep_newest" => Ok(ResolutionStrategy::KeepNewest),
            "manual" => Ok(ResolutionStrategy::Manual),
            _ => Err(format!("Invalid resolution strategy: {s}")),
        }
    }
}

/// Action recommended for a duplicate group, derived from the configured
/// strategy and the group's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendedAction {
    KeepFirst,
    KeepNewest,
    ManualReview,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecommendedAction::KeepFirst => "keep-first",
            RecommendedAction::KeepNewest => "keep-newest",
            RecommendedAction::ManualReview => "manual-review",
        };
        write!(f, "{s}")
    }
}

/// Configuration for one deduplication analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationOptions {
    /// Exact requires byte-identical attribute maps; fuzzy/custom enable
    /// field-wise scoring.
    pub similarity_mode: SimilarityMode,
    /// Minimum aggregate score in [0,100] to join a cluster.
    pub threshold: f64,
    /// If set, only these fields are compared.
    pub include_keys: Option<Vec<String>>,
    /// If set, these fields are never compared.
    pub exclude_keys: Option<Vec<String>>,
    /// Batch size cap; longer batches are truncated before analysis.
    pub max_documents: usize,
    /// Governs which member of a group survives.
    pub strategy: ResolutionStrategy,
}

impl Default for DeduplicationOptions {
    fn default() -> Self {
        Self {
            similarity_mode: SimilarityMode::Fuzzy,
            threshold: 85.0,
            include_keys: None,
            exclude_keys: None,
            max_documents: 500,
            strategy: ResolutionStrategy::KeepFirst,
        }
    }
}

/// Result of scoring one record pair. Ephemeral; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Aggregate similarity in [0,100], rounded to two decimals.
    pub score: f64,
    /// Field names whose per-field score exceeded the match threshold.
    pub matching_fields: Vec<String>,
    /// Human-readable justification derived from the score band.
    pub reason: String,
}

/// One member of a duplicate group. `last_modified` is extracted from
/// conventional timestamp attributes at group construction and drives the
/// keep-newest strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// A cluster of records judged similar enough to consolidate.
///
/// Groups are disjoint within one analysis and always carry at least two
/// members. `similarity_score`, `reason` and `matching_fields` describe the
/// pair formed by the group's first two members, not a group average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: String,
    pub similarity_score: f64,
    pub members: Vec<GroupMember>,
    pub recommended_action: RecommendedAction,
    pub reason: String,
    pub matching_fields: Vec<String>,
}

/// Estimated effect of acting on every emitted group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialSavings {
    /// Sum over groups of (members - 1).
    pub documents_to_delete: usize,
}

/// Complete output of one analysis pass over a record batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationAnalysis {
    pub total_documents: usize,
    /// Emitted groups, sorted by similarity score descending.
    pub groups: Vec<DuplicateGroup>,
    /// Groups whose score is effectively 100 (>= 99.9).
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    /// Records belonging to no group.
    pub unique_documents: usize,
    pub potential_savings: PotentialSavings,
}

/// Immutable record of one executed deletion decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub group_id: String,
    pub deleted_ids: Vec<String>,
    pub kept_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Best-effort outcome of a deletion pass. Per-group failures are captured
/// under `errors` and never abort sibling groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletionResult {
    pub success: bool,
    pub deleted_documents: usize,
    pub audit_trail: Vec<AuditEntry>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub errors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn canonical_json_is_key_order_independent() {
        let a = attrs(json!({"name": "Report.pdf", "size": 100}));
        let mut b = AttributeMap::new();
        b.insert("size".to_string(), json!(100));
        b.insert("name".to_string(), json!("Report.pdf"));
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn canonical_json_distinguishes_values() {
        let a = attrs(json!({"size": 100}));
        let b = attrs(json!({"size": 101}));
        assert_ne!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn enums_round_trip_through_serde_and_fromstr() {
        let mode: SimilarityMode = serde_json::from_str("\"fuzzy\"").unwrap();
        assert_eq!(mode, SimilarityMode::Fuzzy);
        assert_eq!(
            "keep-newest".parse::<ResolutionStrategy>().unwrap(),
            ResolutionStrategy::KeepNewest
        );
        assert_eq!(
            serde_json::to_string(&RecommendedAction::ManualReview).unwrap(),
            "\"manual-review\""
        );
        assert_eq!(RecommendedAction::KeepNewest.to_string(), "keep-newest");
    }

    #[test]
    fn options_defaults_match_documented_values() {
        let options = DeduplicationOptions::default();
        assert_eq!(options.threshold, 85.0);
        assert_eq!(options.similarity_mode, SimilarityMode::Fuzzy);
        assert_eq!(options.strategy, ResolutionStrategy::KeepFirst);
        assert!(options.include_keys.is_none());
        assert!(options.exclude_keys.is_none());
    }
}
