//! Document-store collaborator boundary.
//!
//! The engine never talks to a concrete store; it consumes this trait,
//! constructed once at process start and passed in by reference. The free
//! functions implement the caller-side contract: pagination under the
//! store's hard page cap, attribute fetches chunked to bounded batches,
//! and merging of partial results into records ready for analysis.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::debug;

use crate::dedup::error::Result;
use crate::dedup::models::{AttributeMap, DocumentRecord};

/// Hard per-call page cap imposed by the store's list operation.
pub const LIST_PAGE_SIZE: usize = 100;

/// Maximum ids per attribute-fetch call, bounded by request-size limits.
pub const FETCH_BATCH_SIZE: usize = 50;

/// One page of a paginated listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Read/write contract of the external vector-document store.
///
/// `delete_many` must be idempotent from the engine's point of view: a
/// repeat of the same id list after partial prior success must not error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(
        &self,
        namespace: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage>;

    async fn fetch_attributes(
        &self,
        namespace: &str,
        ids: &[String],
    ) -> Result<HashMap<String, AttributeMap>>;

    async fn delete_many(&self, namespace: &str, ids: &[String]) -> Result<()>;
}

/// List record ids, looping pages until the token runs out or `limit` is
/// reached.
pub async fn list_all_ids(
    store: &dyn DocumentStore,
    namespace: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut token: Option<String> = None;

    while ids.len() < limit {
        let page_size = LIST_PAGE_SIZE.min(limit - ids.len());
        let page = store.list(namespace, page_size, token.as_deref()).await?;
        debug!(
            namespace,
            fetched = page.ids.len(),
            "fetched listing page"
        );
        ids.extend(page.ids);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    ids.truncate(limit);
    Ok(ids)
}

/// Fetch attributes for a set of ids in bounded concurrent chunks and
/// merge the partial results. Any chunk failure aborts the whole fetch;
/// analysis needs the complete batch up front.
pub async fn fetch_attributes_chunked(
    store: &dyn DocumentStore,
    namespace: &str,
    ids: &[String],
) -> Result<HashMap<String, AttributeMap>> {
    let chunks = ids
        .chunks(FETCH_BATCH_SIZE)
        .map(|chunk| store.fetch_attributes(namespace, chunk));
    let pages = join_all(chunks).await;

    let mut merged = HashMap::with_capacity(ids.len());
    for page in pages {
        merged.extend(page?);
    }
    Ok(merged)
}

/// List and hydrate up to `limit` records from a namespace, preserving
/// listing order. Records the store lists but returns no attributes for
/// are kept with an empty map.
pub async fn load_records(
    store: &dyn DocumentStore,
    namespace: &str,
    limit: usize,
) -> Result<Vec<DocumentRecord>> {
    let ids = list_all_ids(store, namespace, limit).await?;
    let mut attributes = fetch_attributes_chunked(store, namespace, &ids).await?;
    Ok(ids
        .into_iter()
        .map(|id| {
            let attrs = attributes.remove(&id).unwrap_or_default();
            DocumentRecord::new(id, attrs)
        })
        .collect())
}
