//! BUFF (buff.163.com) integration.
//!
//! Search: `GET /api/market/search/suggest?game=csgo&text=...` returns a
//! list of suggestions, each carrying the goods id of the matched item.
//! Listing: `GET /api/market/goods/sell_order?game=csgo&goods_id=..&page_num=..`
//! returns one page of active sell orders with string prices.
//!
//! Auth: most listing pages need a logged-in session cookie, supplied via
//! the env var named in config. Capturing that cookie is out of scope.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::debug;

use super::{parse_price, MarketplaceClient};
use crate::types::{Marketplace, MarketplaceId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const GAME: &str = "csgo";

// ---------------------------------------------------------------------------
// API response types (BUFF JSON → Rust)
// ---------------------------------------------------------------------------

/// Common `{ code, msg, data }` envelope.
#[derive(Debug, Deserialize)]
struct BuffEnvelope<T> {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SuggestData {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    /// Either a bare number or a comma-separated string of ids.
    goods_ids: serde_json::Value,
    /// Display text of the suggestion (the full item name).
    #[serde(default)]
    option: String,
}

#[derive(Debug, Deserialize)]
struct SellOrderData {
    #[serde(default)]
    items: Vec<SellOrder>,
}

#[derive(Debug, Deserialize)]
struct SellOrder {
    #[serde(default)]
    price: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// BUFF marketplace client.
pub struct BuffClient {
    http: Client,
    base_url: String,
    cookie: Option<Secret<String>>,
}

impl BuffClient {
    /// Create a new BUFF client.
    ///
    /// `cookie` is the raw `Cookie` header value of a logged-in session.
    pub fn new(base_url: &str, cookie: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("SKINWATCH/0.1.0 (price-monitor)")
            .build()
            .context("Failed to build HTTP client for BUFF")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: cookie.map(Secret::new),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "Fetching BUFF endpoint");

        let mut req = self.http.get(url);
        if let Some(cookie) = &self.cookie {
            req = req.header(reqwest::header::COOKIE, cookie.expose_secret().as_str());
        }

        let resp = req.send().await.context("BUFF API request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("BUFF API error {status}: {body}");
        }

        let envelope: BuffEnvelope<T> = resp
            .json()
            .await
            .context("Failed to parse BUFF response")?;

        if envelope.code != "OK" {
            anyhow::bail!(
                "BUFF API returned {}: {}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            );
        }

        envelope.data.context("BUFF response has no data")
    }
}

/// Pick the goods id for `name` from a suggestion list.
///
/// An exact (case-insensitive) match wins; otherwise the first suggestion
/// is taken, mirroring "arrow down, enter" in the search box.
fn pick_goods_id(suggestions: &[Suggestion], name: &str) -> Option<MarketplaceId> {
    let wanted = name.trim().to_lowercase();
    let chosen = suggestions
        .iter()
        .find(|s| s.option.trim().to_lowercase() == wanted)
        .or_else(|| suggestions.first())?;

    let raw = match &chosen.goods_ids {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.split(',').next().unwrap_or_default().trim().to_string(),
        _ => return None,
    };

    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(MarketplaceId::new(raw))
}

fn extract_prices(data: &SellOrderData) -> Vec<Decimal> {
    data.items
        .iter()
        .filter_map(|o| o.price.as_deref())
        .filter_map(parse_price)
        .collect()
}

#[async_trait]
impl MarketplaceClient for BuffClient {
    async fn search_for_identifier(&self, name: &str) -> Result<MarketplaceId> {
        let url = format!(
            "{}/api/market/search/suggest?game={GAME}&text={}",
            self.base_url,
            urlencoding::encode(name),
        );
        let data: SuggestData = self.get(&url).await?;
        pick_goods_id(&data.suggestions, name)
            .with_context(|| format!("No BUFF goods id found for '{name}'"))
    }

    async fn fetch_sell_order_page(&self, id: &MarketplaceId, page: u32) -> Result<Vec<Decimal>> {
        let url = format!(
            "{}/api/market/goods/sell_order?game={GAME}&goods_id={}&page_num={page}&sort_by=default",
            self.base_url,
            urlencoding::encode(id.as_str()),
        );
        let data: SellOrderData = self.get(&url).await?;
        let prices = extract_prices(&data);
        debug!(goods_id = %id, page, count = prices.len(), "BUFF sell orders captured");
        Ok(prices)
    }

    fn marketplace(&self) -> Marketplace {
        Marketplace::Buff
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
