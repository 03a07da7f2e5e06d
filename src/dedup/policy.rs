//! Resolution policy: which member of a duplicate group survives.
//!
//! The keep-newest strategy looks for timestamp-bearing attributes under
//! conventional names. Members without a parseable timestamp are ignored
//! when picking the newest; when no member parses at all, both the
//! recommendation and the selection fall back to keep-first.

use chrono::{DateTime, Utc};

use super::field_comparator::parse_instant;
use super::models::{
    AttributeMap, DuplicateGroup, GroupMember, RecommendedAction, ResolutionStrategy,
};

/// Attribute names checked, in order, for a record's modification time.
pub const TIMESTAMP_FIELDS: [&str; 9] = [
    "lastModified",
    "last_modified",
    "modified",
    "timestamp",
    "created",
    "createdAt",
    "created_at",
    "updatedAt",
    "updated_at",
];

/// The keep/delete split for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub keep: String,
    pub delete: Vec<String>,
}

/// Parse the first conventional timestamp attribute carried by a record.
pub fn extract_timestamp(attributes: &AttributeMap) -> Option<DateTime<Utc>> {
    TIMESTAMP_FIELDS
        .iter()
        .find_map(|field| attributes.get(*field).and_then(parse_instant))
}

fn carries_timestamp(member: &GroupMember) -> bool {
    member.last_modified.is_some()
        || TIMESTAMP_FIELDS
            .iter()
            .any(|field| member.attributes.contains_key(*field))
}

fn member_timestamp(member: &GroupMember) -> Option<DateTime<Utc>> {
    member
        .last_modified
        .or_else(|| extract_timestamp(&member.attributes))
}

/// Recommend an action for a group under the configured strategy.
pub fn recommend(strategy: ResolutionStrategy, members: &[GroupMember]) -> RecommendedAction {
    match strategy {
        ResolutionStrategy::Manual => RecommendedAction::ManualReview,
        ResolutionStrategy::KeepFirst => RecommendedAction::KeepFirst,
        ResolutionStrategy::KeepNewest => {
            if members.iter().any(carries_timestamp) {
                RecommendedAction::KeepNewest
            } else {
                RecommendedAction::KeepFirst
            }
        }
    }
}

/// Split a group into the record to keep and the records to delete.
///
/// Manual-review groups submitted to the executor anyway keep their first
/// member; keep-newest keeps the member with the greatest parseable
/// timestamp, defaulting to the first member when none parse.
pub fn select(group: &DuplicateGroup) -> Selection {
    let keep_index = match group.recommended_action {
        RecommendedAction::KeepNewest => newest_index(&group.members),
        RecommendedAction::KeepFirst | RecommendedAction::ManualReview => 0,
    };

    let keep = group
        .members
        .get(keep_index)
        .map(|m| m.id.clone())
        .unwrap_or_default();
    let delete = group
        .members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != keep_index)
        .map(|(_, m)| m.id.clone())
        .collect();

    Selection { keep, delete }
}

fn newest_index(members: &[GroupMember]) -> usize {
    let mut best_index = 0;
    let mut best_timestamp: Option<DateTime<Utc>> = None;
    for (index, member) in members.iter().enumerate() {
        if let Some(ts) = member_timestamp(member) {
            if best_timestamp.map_or(true, |best| ts > best) {
                best_index = index;
                best_timestamp = Some(ts);
            }
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(id: &str, attributes: serde_json::Value) -> GroupMember {
        let attributes = match attributes {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        };
        GroupMember {
            id: id.to_string(),
            last_modified: extract_timestamp(&attributes),
            attributes,
        }
    }

    fn group(action: RecommendedAction, members: Vec<GroupMember>) -> DuplicateGroup {
        DuplicateGroup {
            id: "group_test".to_string(),
            similarity_score: 100.0,
            members,
            recommended_action: action,
            reason: "exact metadata match".to_string(),
            matching_fields: Vec::new(),
        }
    }

    #[test]
    fn manual_strategy_always_recommends_review() {
        let members = vec![
            member("a", json!({"lastModified": "2024-06-01"})),
            member("b", json!({})),
        ];
        assert_eq!(
            recommend(ResolutionStrategy::Manual, &members),
            RecommendedAction::ManualReview
        );
    }

    #[test]
    fn keep_newest_selects_greatest_timestamp() {
        let members = vec![
            member("old", json!({"lastModified": "2024-01-01"})),
            member("new", json!({"lastModified": "2024-06-01"})),
        ];
        assert_eq!(
            recommend(ResolutionStrategy::KeepNewest, &members),
            RecommendedAction::KeepNewest
        );
        let selection = select(&group(RecommendedAction::KeepNewest, members));
        assert_eq!(selection.keep, "new");
        assert_eq!(selection.delete, vec!["old".to_string()]);
    }

    #[test]
    fn keep_newest_without_timestamps_falls_back_to_first() {
        let members = vec![member("a", json!({})), member("b", json!({}))];
        assert_eq!(
            recommend(ResolutionStrategy::KeepNewest, &members),
            RecommendedAction::KeepFirst
        );
        let selection = select(&group(RecommendedAction::KeepFirst, members));
        assert_eq!(selection.keep, "a");
        assert_eq!(selection.delete, vec!["b".to_string()]);
    }

    #[test]
    fn unparseable_timestamps_are_ignored_when_some_parse() {
        let members = vec![
            member("garbled", json!({"lastModified": "not a date"})),
            member("parsed", json!({"lastModified": "2023-03-03"})),
            member("also_garbled", json!({"timestamp": "???"})),
        ];
        let selection = select(&group(RecommendedAction::KeepNewest, members));
        assert_eq!(selection.keep, "parsed");
        assert_eq!(
            selection.delete,
            vec!["garbled".to_string(), "also_garbled".to_string()]
        );
    }

    #[test]
    fn keep_newest_defaults_to_first_member_when_nothing_parses() {
        let members = vec![
            member("a", json!({"lastModified": "???"})),
            member("b", json!({"lastModified": "!!!"})),
        ];
        // Timestamp attributes are present, so the recommendation stays
        // keep-newest, but the selection cannot rank and keeps index 0.
        assert_eq!(
            recommend(ResolutionStrategy::KeepNewest, &members),
            RecommendedAction::KeepNewest
        );
        let selection = select(&group(RecommendedAction::KeepNewest, members));
        assert_eq!(selection.keep, "a");
    }

    #[test]
    fn epoch_timestamps_rank_like_calendar_ones() {
        let members = vec![
            member("calendar", json!({"created": "2024-01-01T00:00:00Z"})),
            member("epoch", json!({"created": 1_717_200_000})),
        ];
        let selection = select(&group(RecommendedAction::KeepNewest, members));
        assert_eq!(selection.keep, "epoch");
    }

    #[test]
    fn manual_review_selection_keeps_first_member() {
        let members = vec![member("a", json!({})), member("b", json!({}))];
        let selection = select(&group(RecommendedAction::ManualReview, members));
        assert_eq!(selection.keep, "a");
        assert_eq!(selection.delete, vec!["b".to_string()]);
    }
}
