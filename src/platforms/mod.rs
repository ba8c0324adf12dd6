//! Marketplace integrations.
//!
//! Defines the `MarketplaceClient` trait and provides implementations for:
//! - BUFF: goods search suggestions and the `goods/sell_order` listing
//! - YouPin: template search and the on-sale commodity list

pub mod buff;
pub mod youpin;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{Marketplace, MarketplaceId};

/// Abstraction over a marketplace's search and sell-order listing.
///
/// Implementors own a single session. The engine calls them one item at a
/// time and enforces its own timeouts around every call, so clients are
/// free to take as long as their transport allows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Discover the marketplace's identifier for an item name from a live
    /// search. Errors when nothing matches.
    async fn search_for_identifier(&self, name: &str) -> Result<MarketplaceId>;

    /// Fetch one page (1-based) of sell orders and return the listed prices.
    async fn fetch_sell_order_page(&self, id: &MarketplaceId, page: u32) -> Result<Vec<Decimal>>;

    /// Which marketplace this client talks to.
    fn marketplace(&self) -> Marketplace;
}

/// Parse a price string as reported by a marketplace ("123.5", " 8 ").
///
/// Returns `None` for blanks, garbage and non-positive values.
pub(crate) fn parse_price(raw: &str) -> Option<Decimal> {
    raw.trim()
        .trim_start_matches(['¥', '￥'])
        .trim()
        .parse::<Decimal>()
        .ok()
        .filter(|p| *p > Decimal::ZERO)
}
