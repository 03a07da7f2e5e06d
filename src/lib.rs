pub mod config;
pub mod dedup;
pub mod store;

pub use config::EngineConfig;

// Re-export dedup types for convenience
pub use dedup::{
    analyze, resolve_and_delete, AttributeMap, AuditEntry, DedupError, DeduplicationOptions,
    DeletionResult, DocumentRecord, DuplicateGroup, DuplicationAnalysis, GroupMember,
    PotentialSavings, RecommendedAction, ResolutionStrategy, SimilarityMode, SimilarityResult,
};

// Re-export the store collaborator boundary
pub use store::{
    fetch_attributes_chunked, list_all_ids, load_records, DocumentStore, ListPage,
    FETCH_BATCH_SIZE, LIST_PAGE_SIZE,
};
