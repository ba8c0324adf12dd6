//! One marketplace's side of a cycle: resolve ids, then collect prices.
//!
//! Items are processed sequentially within a session so requests to one
//! marketplace are never issued in parallel. Different sessions run
//! concurrently (see `pipeline`).

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

use super::collector::PriceCollector;
use super::resolver::IdentifierCache;
use crate::platforms::MarketplaceClient;
use crate::types::{MarketQuote, Marketplace, MarketplaceTable, MonitorError, PriceSummary};

/// Per-item outcome of one session.
///
/// `Err` means nothing was observed for the item: either its id could not
/// be resolved or its first page failed. An item whose first page came back
/// empty is `Ok` with an empty summary.
#[derive(Debug, Clone)]
pub struct QuoteBook {
    pub marketplace: Marketplace,
    pub quotes: BTreeMap<String, Result<PriceSummary, MonitorError>>,
}

impl QuoteBook {
    pub fn new(marketplace: Marketplace) -> Self {
        Self {
            marketplace,
            quotes: BTreeMap::new(),
        }
    }

    /// Summary for `item`, if it was resolved.
    pub fn summary(&self, item: &str) -> Option<&PriceSummary> {
        self.quotes.get(item).and_then(|r| r.as_ref().ok())
    }

    pub fn resolution_failures(&self) -> usize {
        self.quotes
            .values()
            .filter(|r| matches!(r, Err(MonitorError::ResolutionFailed { .. })))
            .count()
    }

    /// Statistics table for `items`, in the given order. Items this session
    /// never saw are absent.
    pub fn table(&self, items: &[String]) -> MarketplaceTable {
        let quotes = items
            .iter()
            .map(|item| match self.quotes.get(item) {
                Some(Ok(summary)) => MarketQuote {
                    item_name: item.clone(),
                    summary: Some(*summary),
                    error: None,
                },
                Some(Err(e)) => MarketQuote {
                    item_name: item.clone(),
                    summary: None,
                    error: Some(e.to_string()),
                },
                None => MarketQuote {
                    item_name: item.clone(),
                    summary: None,
                    error: None,
                },
            })
            .collect();

        MarketplaceTable {
            marketplace: self.marketplace,
            quotes,
        }
    }

    /// Items that resolved but whose collection failed outright.
    pub fn collection_failures(&self) -> usize {
        self.quotes
            .values()
            .filter(|r| matches!(r, Err(e) if !matches!(e, MonitorError::ResolutionFailed { .. })))
            .count()
    }
}

/// A marketplace client together with its identifier cache.
pub struct MarketSession {
    client: Box<dyn MarketplaceClient>,
    cache: IdentifierCache,
    search_timeout: Duration,
    collector: PriceCollector,
}

impl MarketSession {
    pub fn new(
        client: Box<dyn MarketplaceClient>,
        cache: IdentifierCache,
        search_timeout: Duration,
        collector: PriceCollector,
    ) -> Self {
        Self {
            client,
            cache,
            search_timeout,
            collector,
        }
    }

    pub fn marketplace(&self) -> Marketplace {
        self.client.marketplace()
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    /// Resolve and price every item in order.
    pub async fn collect_all(&mut self, items: &[String]) -> QuoteBook {
        let marketplace = self.marketplace();
        let mut book = QuoteBook::new(marketplace);

        info!(%marketplace, items = items.len(), "Collecting prices");

        for item in items {
            let outcome = match self
                .cache
                .resolve(item, self.client.as_ref(), self.search_timeout)
                .await
            {
                Ok(id) => match self.collector.summarize(self.client.as_ref(), &id).await {
                    Ok(summary) => Ok(summary),
                    Err(e) => {
                        warn!(%marketplace, item = %item, error = %e, "Collection failed, item absent on this marketplace");
                        Err(e)
                    }
                },
                Err(e) => {
                    warn!(%marketplace, item = %item, error = %e, "Item skipped on this marketplace");
                    Err(e)
                }
            };
            book.quotes.insert(item.clone(), outcome);
        }

        info!(
            %marketplace,
            resolved = book.quotes.len() - book.resolution_failures(),
            unresolved = book.resolution_failures(),
            collection_failures = book.collection_failures(),
            "Collection finished"
        );

        book
    }
}
