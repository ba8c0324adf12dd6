//! Identifier cache: persistent `item name → marketplace id` mapping.
//!
//! Ids are discovered once through the marketplace's search and then kept
//! forever: a cached id is never re-resolved. The cache file is rewritten
//! right after every new resolution so a later failure in the same run does
//! not lose what was already found.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::platforms::MarketplaceClient;
use crate::storage;
use crate::types::{Marketplace, MarketplaceId, MonitorError};

/// Cache file values may have been written as strings or bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredId {
    Text(String),
    Number(serde_json::Number),
}

impl StoredId {
    fn into_id(self) -> Option<MarketplaceId> {
        let raw = match self {
            StoredId::Text(s) => s.trim().to_string(),
            StoredId::Number(n) => n.to_string(),
        };
        (!raw.is_empty()).then(|| MarketplaceId::new(raw))
    }
}

/// Per-marketplace identifier cache backed by a JSON file.
#[derive(Debug)]
pub struct IdentifierCache {
    marketplace: Marketplace,
    path: PathBuf,
    entries: BTreeMap<String, MarketplaceId>,
}

impl IdentifierCache {
    /// Load the cache for `marketplace` from `path`.
    ///
    /// A missing or corrupt file yields an empty cache.
    pub fn load(marketplace: Marketplace, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let raw: BTreeMap<String, serde_json::Value> = storage::load_map(&path);

        let mut entries = BTreeMap::new();
        for (name, value) in raw {
            match serde_json::from_value::<StoredId>(value).ok().and_then(StoredId::into_id) {
                Some(id) => {
                    entries.insert(name, id);
                }
                None => warn!(%marketplace, item = %name, "Ignoring unusable cached id"),
            }
        }

        info!(%marketplace, path = %path.display(), entries = entries.len(), "Identifier cache loaded");

        Self {
            marketplace,
            path,
            entries,
        }
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, item: &str) -> Option<&MarketplaceId> {
        self.entries.get(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a newly discovered id and persist the whole cache.
    ///
    /// A failed write is logged; the id stays usable for this run.
    fn insert_and_persist(&mut self, item: &str, id: MarketplaceId) {
        self.entries.insert(item.to_string(), id);
        if let Err(e) = storage::save_json(&self.entries, &self.path) {
            warn!(
                marketplace = %self.marketplace,
                path = %self.path.display(),
                error = %e,
                "Failed to persist identifier cache"
            );
        }
    }

    /// Return the id for `item`, searching the marketplace on a cache miss.
    ///
    /// The search is bounded by `search_timeout`; a timeout, a search error
    /// or an empty result all end in `ResolutionFailed`.
    pub async fn resolve(
        &mut self,
        item: &str,
        client: &dyn MarketplaceClient,
        search_timeout: Duration,
    ) -> Result<MarketplaceId, MonitorError> {
        if let Some(id) = self.entries.get(item) {
            debug!(marketplace = %self.marketplace, item, id = %id, "Identifier cache hit");
            return Ok(id.clone());
        }

        info!(marketplace = %self.marketplace, item, "No cached id, searching");

        let marketplace = self.marketplace;
        let failed = || MonitorError::ResolutionFailed {
            marketplace,
            item: item.to_string(),
        };

        match tokio::time::timeout(search_timeout, client.search_for_identifier(item)).await {
            Ok(Ok(id)) => {
                info!(marketplace = %self.marketplace, item, id = %id, "Identifier resolved");
                self.insert_and_persist(item, id.clone());
                Ok(id)
            }
            Ok(Err(e)) => {
                warn!(marketplace = %self.marketplace, item, error = %e, "Identifier search failed");
                Err(failed())
            }
            Err(_) => {
                warn!(
                    marketplace = %self.marketplace,
                    item,
                    timeout_secs = search_timeout.as_secs_f64(),
                    "Identifier search timed out"
                );
                Err(failed())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
