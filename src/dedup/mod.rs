pub mod clustering;
pub mod error;
pub mod executor;
pub mod field_comparator;
pub mod models;
pub mod policy;
pub mod similarity;

pub use clustering::analyze;
pub use error::DedupError;
pub use executor::resolve_and_delete;
pub use models::{
    AttributeMap, AuditEntry, DeduplicationOptions, DeletionResult, DocumentRecord,
    DuplicateGroup, DuplicationAnalysis, GroupMember, PotentialSavings, RecommendedAction,
    ResolutionStrategy, SimilarityMode, SimilarityResult,
};
pub use policy::Selection;
