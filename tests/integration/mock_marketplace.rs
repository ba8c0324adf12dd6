//! Mock marketplace for integration testing.
//!
//! Provides a deterministic `MarketplaceClient` implementation backed by an
//! in-memory catalogue. Call counters, forced errors and artificial delays
//! are controllable from test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skinwatch::platforms::MarketplaceClient;
use skinwatch::types::{Marketplace, MarketplaceId};

/// Counters shared between a mock and the test that created it.
#[derive(Debug, Default)]
pub struct CallLog {
    pub searches: AtomicUsize,
    pub pages: AtomicUsize,
}

impl CallLog {
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn pages(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }
}

/// A mock marketplace. Items are listed as `name → (id, pages of prices)`.
pub struct MockMarketplace {
    marketplace: Marketplace,
    catalogue: HashMap<String, (String, Vec<Vec<Decimal>>)>,
    calls: Arc<CallLog>,
    /// If set, every call fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
    /// Delay applied to every page fetch.
    page_delay: Duration,
}

impl MockMarketplace {
    pub fn new(marketplace: Marketplace) -> Self {
        Self {
            marketplace,
            catalogue: HashMap::new(),
            calls: Arc::new(CallLog::default()),
            force_error: Arc::new(Mutex::new(None)),
            page_delay: Duration::ZERO,
        }
    }

    /// List `name` under `id` with a single page of `prices`.
    pub fn with_item(self, name: &str, id: &str, prices: &[Decimal]) -> Self {
        self.with_pages(name, id, vec![prices.to_vec()])
    }

    /// List `name` under `id` with explicit pages.
    pub fn with_pages(mut self, name: &str, id: &str, pages: Vec<Vec<Decimal>>) -> Self {
        self.catalogue.insert(name.to_string(), (id.to_string(), pages));
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Force all subsequent operations to return an error.
    pub fn failing(self, msg: &str) -> Self {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
        self
    }

    pub fn calls(&self) -> Arc<CallLog> {
        self.calls.clone()
    }

    fn check_error(&self) -> Result<()> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketplaceClient for MockMarketplace {
    async fn search_for_identifier(&self, name: &str) -> Result<MarketplaceId> {
        self.calls.searches.fetch_add(1, Ordering::SeqCst);
        self.check_error()?;
        self.catalogue
            .get(name)
            .map(|(id, _)| MarketplaceId::new(id.clone()))
            .ok_or_else(|| anyhow!("no search result for '{name}'"))
    }

    async fn fetch_sell_order_page(&self, id: &MarketplaceId, page: u32) -> Result<Vec<Decimal>> {
        self.calls.pages.fetch_add(1, Ordering::SeqCst);
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
        self.check_error()?;

        let pages = self
            .catalogue
            .values()
            .find(|(item_id, _)| item_id == id.as_str())
            .map(|(_, pages)| pages)
            .ok_or_else(|| anyhow!("unknown id {id}"))?;

        Ok(pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default())
    }

    fn marketplace(&self) -> Marketplace {
        self.marketplace
    }
}
