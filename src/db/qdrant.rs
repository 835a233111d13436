use crate::types::{AppError, IndexEntry, Result, RetrievalResult, RetrievedChunk};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use qdrant_client::{
    qdrant::{
        Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
        DeletePointsBuilder, Distance, FieldType, Filter, PointId, PointStruct, RetrievedPoint,
        ScoredPoint, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
        VectorParamsBuilder,
    },
    Qdrant,
};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::vectorstore::{validate_dimensions, validate_document_id, validate_k, VectorIndex};

const DOCUMENT_FIELD: &str = "document_id";
const VERSION_FIELD: &str = "version";
const TEXT_FIELD: &str = "text";
const SEQUENCE_FIELD: &str = "sequence_index";
const SCROLL_PAGE: u32 = 256;

/// Qdrant-backed vector index.
///
/// All documents share one collection and are told apart by the
/// `document_id` payload field. Each upload of a document is written under a
/// fresh `version` tag; searches only see the version that finished writing
/// last, and stale versions are deleted afterwards.
///
/// Version tags sort by creation time, so on connect the newest tag found
/// for each document becomes its active version.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
    dimensions: usize,
    /// Active version per document. Documents without one are not searchable.
    versions: RwLock<HashMap<String, String>>,
}

fn service_error(action: &str, e: impl std::fmt::Display) -> AppError {
    AppError::provider("qdrant", format!("Failed to {}: {}", action, e))
}

impl QdrantVectorIndex {
    /// Connect and make sure the collection exists with the right shape.
    pub async fn connect(
        url: &str,
        api_key: Option<String>,
        collection: &str,
        dimensions: usize,
    ) -> Result<Self> {
        let client = if let Some(key) = api_key {
            Qdrant::from_url(url)
                .api_key(key)
                .build()
                .map_err(|e| service_error("create Qdrant client", e))?
        } else {
            Qdrant::from_url(url)
                .build()
                .map_err(|e| service_error("create Qdrant client", e))?
        };

        let index = Self {
            client,
            collection: collection.to_string(),
            dimensions,
            versions: RwLock::new(HashMap::new()),
        };
        index.ensure_collection().await?;
        index.load_versions().await?;

        tracing::info!(
            collection = %index.collection,
            dimensions,
            documents = index.versions.read().len(),
            "Qdrant vector index ready"
        );

        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| service_error("check collection", e))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| service_error("create collection", e))?;

            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    DOCUMENT_FIELD,
                    FieldType::Keyword,
                ))
                .await
                .map_err(|e| service_error("create payload index", e))?;

            return Ok(());
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| service_error("get collection info", e))?;

        let actual = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| match v.config {
                Some(qdrant_client::qdrant::vectors_config::Config::Params(p)) => {
                    Some(p.size as usize)
                }
                _ => None,
            });

        match actual {
            Some(size) if size == self.dimensions => Ok(()),
            Some(size) => Err(AppError::Configuration(format!(
                "Qdrant collection '{}' stores {}-dimensional vectors but the embedding model produces {}",
                self.collection, size, self.dimensions
            ))),
            None => Err(AppError::Configuration(format!(
                "Qdrant collection '{}' does not use a single unnamed vector",
                self.collection
            ))),
        }
    }

    /// Rebuild the active-version table from the points already stored.
    ///
    /// Versions other than the newest one of each document are left over
    /// from an interrupted replace and get deleted.
    async fn load_versions(&self) -> Result<()> {
        let mut tags: Vec<(String, String)> = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut scroll = ScrollPointsBuilder::new(&self.collection)
                .limit(SCROLL_PAGE)
                .with_payload(true)
                .with_vectors(false);
            if let Some(offset) = offset.take() {
                scroll = scroll.offset(offset);
            }

            let page = self
                .client
                .scroll(scroll)
                .await
                .map_err(|e| service_error("scroll points", e))?;

            tags.extend(page.result.iter().filter_map(version_tag));

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        let (active, stale) = latest_versions(tags);
        *self.versions.write() = active.clone();

        for document_id in stale {
            if let Some(version) = active.get(&document_id) {
                self.delete_stale(&document_id, version).await;
            }
        }

        Ok(())
    }

    /// Drop every point of `document_id` outside `live_version`.
    ///
    /// Failure only leaves unreachable points behind, so it is logged.
    async fn delete_stale(&self, document_id: &str, live_version: &str) {
        if let Err(e) = self
            .delete_matching(stale_filter(document_id, live_version))
            .await
        {
            tracing::warn!(
                document_id,
                version = live_version,
                error = %e,
                "Failed to delete stale points"
            );
        }
    }

    fn active_version(&self, document_id: &str) -> Option<String> {
        self.versions.read().get(document_id).cloned()
    }

    async fn count(&self, filter: Filter) -> Result<usize> {
        let response = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(filter)
                    .exact(true),
            )
            .await
            .map_err(|e| service_error("count points", e))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn delete_matching(&self, filter: Filter) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(filter)
                    .wait(true),
            )
            .await
            .map_err(|e| service_error("delete points", e))?;
        Ok(())
    }

    /// Write one document's entries as a new version and make it live.
    async fn replace_document(&self, document_id: &str, entries: Vec<IndexEntry>) -> Result<()> {
        let version = new_version();
        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|entry| to_point(entry, &version))
            .collect();

        let written = self
            .client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await;

        if let Err(e) = written {
            // Leave the previous version live and drop whatever was written.
            if let Err(cleanup) = self
                .delete_matching(version_filter(document_id, &version))
                .await
            {
                tracing::warn!(
                    document_id,
                    error = %cleanup,
                    "Failed to clean up partially written version"
                );
            }
            return Err(service_error("upsert points", e));
        }

        self.versions
            .write()
            .insert(document_id.to_string(), version.clone());

        self.delete_stale(document_id, &version).await;

        Ok(())
    }
}

/// A version tag that sorts after every tag created before it.
pub(crate) fn new_version() -> String {
    format!(
        "{:020}-{}",
        Utc::now().timestamp_micros().max(0),
        Uuid::new_v4().simple()
    )
}

fn version_tag(point: &RetrievedPoint) -> Option<(String, String)> {
    let document_id = point.payload.get(DOCUMENT_FIELD)?.as_str()?.to_string();
    let version = point.payload.get(VERSION_FIELD)?.as_str()?.to_string();
    Some((document_id, version))
}

/// Newest version per document, plus the documents that also carry older ones.
pub(crate) fn latest_versions(
    tags: impl IntoIterator<Item = (String, String)>,
) -> (HashMap<String, String>, Vec<String>) {
    let mut active: HashMap<String, String> = HashMap::new();
    let mut stale: Vec<String> = Vec::new();

    for (document_id, version) in tags {
        match active.get_mut(&document_id) {
            Some(current) if *current == version => {}
            Some(current) => {
                if version > *current {
                    *current = version;
                }
                if !stale.contains(&document_id) {
                    stale.push(document_id);
                }
            }
            None => {
                active.insert(document_id, version);
            }
        }
    }

    stale.sort();
    (active, stale)
}

fn to_point(entry: IndexEntry, version: &str) -> PointStruct {
    let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
    payload.insert(DOCUMENT_FIELD.to_string(), entry.payload.document_id.into());
    payload.insert(TEXT_FIELD.to_string(), entry.payload.text.into());
    payload.insert(
        SEQUENCE_FIELD.to_string(),
        (entry.payload.sequence_index as i64).into(),
    );
    payload.insert(VERSION_FIELD.to_string(), version.to_string().into());

    PointStruct::new(entry.id, entry.vector, payload)
}

/// Points of `document_id`, restricted to `version` when one is known.
pub(crate) fn document_filter(document_id: &str, version: Option<&str>) -> Filter {
    let mut conditions = vec![Condition::matches(DOCUMENT_FIELD, document_id.to_string())];
    if let Some(version) = version {
        conditions.push(Condition::matches(VERSION_FIELD, version.to_string()));
    }
    Filter::must(conditions)
}

fn version_filter(document_id: &str, version: &str) -> Filter {
    document_filter(document_id, Some(version))
}

/// Points of `document_id` that do not belong to `live_version`.
pub(crate) fn stale_filter(document_id: &str, live_version: &str) -> Filter {
    Filter {
        must: vec![Condition::matches(DOCUMENT_FIELD, document_id.to_string())],
        must_not: vec![Condition::matches(VERSION_FIELD, live_version.to_string())],
        ..Default::default()
    }
}

fn to_retrieved(point: ScoredPoint) -> Option<RetrievedChunk> {
    let text = point.payload.get(TEXT_FIELD)?.as_str()?.to_string();
    let sequence_index = point.payload.get(SEQUENCE_FIELD)?.as_integer()? as usize;
    Some(RetrievedChunk {
        text,
        score: point.score,
        sequence_index,
    })
}

// ============================================================================
// VectorIndex Trait Implementation
// ============================================================================

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    fn provider_name(&self) -> &'static str {
        "qdrant"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        let mut grouped: BTreeMap<String, Vec<IndexEntry>> = BTreeMap::new();
        for entry in entries {
            validate_document_id(&entry.payload.document_id)?;
            validate_dimensions(self.dimensions, &entry.vector, "entry vector")?;
            grouped
                .entry(entry.payload.document_id.clone())
                .or_default()
                .push(entry);
        }

        let mut count = 0;
        for (document_id, entries) in grouped {
            let written = entries.len();
            self.replace_document(&document_id, entries).await?;
            count += written;
        }

        Ok(count)
    }

    async fn search(
        &self,
        document_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<RetrievalResult> {
        validate_k(k)?;
        validate_dimensions(self.dimensions, query, "query vector")?;

        let Some(version) = self.active_version(document_id) else {
            return Ok(RetrievalResult::empty(document_id));
        };
        let search = SearchPointsBuilder::new(&self.collection, query.to_vec(), k as u64)
            .filter(version_filter(document_id, &version))
            .with_payload(true);

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| service_error("search", e))?;

        Ok(RetrievalResult {
            document_id: document_id.to_string(),
            chunks: response.result.into_iter().filter_map(to_retrieved).collect(),
        })
    }

    async fn remove_document(&self, document_id: &str) -> Result<usize> {
        let filter = document_filter(document_id, None);
        let count = self.count(filter.clone()).await?;
        if count > 0 {
            self.delete_matching(filter).await?;
        }
        self.versions.write().remove(document_id);
        Ok(count)
    }

    async fn documents(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.versions.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn contains_document(&self, document_id: &str) -> Result<bool> {
        Ok(self.versions.read().contains_key(document_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::condition::ConditionOneOf;

    fn field_keys(conditions: &[Condition]) -> Vec<String> {
        conditions
            .iter()
            .filter_map(|c| match &c.condition_one_of {
                Some(ConditionOneOf::Field(field)) => Some(field.key.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_document_filter_with_version() {
        let filter = document_filter("a.pdf", Some("v1"));
        assert_eq!(field_keys(&filter.must), vec!["document_id", "version"]);
        assert!(filter.must_not.is_empty());
    }

    #[test]
    fn test_document_filter_without_version() {
        let filter = document_filter("a.pdf", None);
        assert_eq!(field_keys(&filter.must), vec!["document_id"]);
    }

    #[test]
    fn test_versions_sort_by_creation() {
        let first = new_version();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = new_version();
        assert!(second > first);
        assert_ne!(new_version(), new_version());
    }

    #[test]
    fn test_latest_versions_picks_newest_and_reports_stale() {
        let tag = |d: &str, v: &str| (d.to_string(), v.to_string());
        let (active, stale) = latest_versions(vec![
            tag("a.pdf", "00000000000000000001-x"),
            tag("b.pdf", "00000000000000000005-y"),
            tag("a.pdf", "00000000000000000003-z"),
            tag("b.pdf", "00000000000000000005-y"),
            tag("a.pdf", "00000000000000000002-w"),
        ]);

        assert_eq!(active["a.pdf"], "00000000000000000003-z");
        assert_eq!(active["b.pdf"], "00000000000000000005-y");
        assert_eq!(stale, vec!["a.pdf"]);
    }

    #[test]
    fn test_stale_filter_excludes_live_version() {
        let filter = stale_filter("a.pdf", "v2");
        assert_eq!(field_keys(&filter.must), vec!["document_id"]);
        assert_eq!(field_keys(&filter.must_not), vec!["version"]);
    }
}
