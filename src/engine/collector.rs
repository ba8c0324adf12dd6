//! Paginated sell-order price collection.
//!
//! Fetches up to `page_limit` pages of sell orders for one identifier and
//! accumulates every observed price. Each page call returns its own prices;
//! the running total is a local value of one `collect` call and is never
//! shared between items.

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};

use crate::platforms::MarketplaceClient;
use crate::types::{MarketplaceId, MonitorError, PriceSummary};

/// Pagination and timing policy for one marketplace.
#[derive(Debug, Clone)]
pub struct PriceCollector {
    pub page_limit: u32,
    pub page_timeout: Duration,
    /// Pause between consecutive pages of the same item.
    pub page_delay: Duration,
}

impl Default for PriceCollector {
    fn default() -> Self {
        Self {
            page_limit: 2,
            page_timeout: Duration::from_secs(6),
            page_delay: Duration::from_millis(500),
        }
    }
}

impl PriceCollector {
    pub fn new(page_limit: u32, page_timeout: Duration, page_delay: Duration) -> Self {
        Self {
            page_limit,
            page_timeout,
            page_delay,
        }
    }

    /// Collect raw prices across pages.
    ///
    /// An empty first page means "no active listings" and ends collection.
    /// A failed or timed-out first page makes the whole collection an error,
    /// since nothing was observed. A later page failure keeps what earlier
    /// pages returned.
    pub async fn collect(
        &self,
        client: &dyn MarketplaceClient,
        id: &MarketplaceId,
    ) -> Result<Vec<Decimal>, MonitorError> {
        let mut prices = Vec::new();

        for page in 1..=self.page_limit {
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let page_prices = match self.fetch_page(client, id, page).await {
                Ok(p) => p,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Page skipped");
                    Vec::new()
                }
            };

            if page == 1 && page_prices.is_empty() {
                debug!(marketplace = %client.marketplace(), id = %id, "First page empty, skipping the rest");
                break;
            }

            prices.extend(page_prices);
        }

        Ok(prices)
    }

    /// Collect and summarize in one step.
    pub async fn summarize(
        &self,
        client: &dyn MarketplaceClient,
        id: &MarketplaceId,
    ) -> Result<PriceSummary, MonitorError> {
        let prices = self.collect(client, id).await?;
        let summary = PriceSummary::from_prices(&prices);
        debug!(
            marketplace = %client.marketplace(),
            id = %id,
            observed = prices.len(),
            summary = %summary,
            "Prices summarized"
        );
        Ok(summary)
    }

    async fn fetch_page(
        &self,
        client: &dyn MarketplaceClient,
        id: &MarketplaceId,
        page: u32,
    ) -> Result<Vec<Decimal>, MonitorError> {
        let marketplace = client.marketplace();
        match tokio::time::timeout(self.page_timeout, client.fetch_sell_order_page(id, page)).await {
            Ok(Ok(prices)) => Ok(prices
                .into_iter()
                .filter(|p| *p > Decimal::ZERO)
                .collect()),
            Ok(Err(e)) => Err(MonitorError::Marketplace {
                marketplace,
                message: format!("page {page} of {id}: {e}"),
            }),
            Err(_) => Err(MonitorError::CollectionTimeout {
                marketplace,
                identifier: id.to_string(),
                page,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
