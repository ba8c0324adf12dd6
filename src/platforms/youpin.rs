//! YouPin (youpin898.com) integration.
//!
//! Search: `POST /api/homepage/pc/goods/market/querySaleTemplate` with a
//! keyword returns matching item templates; the template id is the item's
//! identifier. Listing: `POST /api/homepage/pc/goods/market/queryOnSaleCommodityList`
//! returns one page of on-sale commodities for a template, cheapest first.
//!
//! Responses use PascalCase keys and a numeric `Code` (0 = success).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_price, MarketplaceClient};
use crate::types::{Marketplace, MarketplaceId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SEARCH_PATH: &str = "/api/homepage/pc/goods/market/querySaleTemplate";
const LISTING_PATH: &str = "/api/homepage/pc/goods/market/queryOnSaleCommodityList";

/// Steam app id for CS2.
const GAME_ID: &str = "730";

/// Commodities per listing page.
const PAGE_SIZE: u32 = 10;

/// Templates requested per search.
const SEARCH_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// API request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateQuery<'a> {
    key_words: &'a str,
    list_sort_type: u8,
    sort_type: u8,
    page_index: u32,
    page_size: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommodityQuery<'a> {
    game_id: &'a str,
    list_type: &'a str,
    template_id: &'a str,
    /// 1 = sort by price.
    list_sort_type: u8,
    /// 1 = ascending.
    sort_type: u8,
    page_index: u32,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct YouPinResponse<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SaleTemplate {
    id: serde_json::Value,
    #[serde(default)]
    commodity_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Commodity {
    /// Usually a string ("123.00"), occasionally a bare number.
    #[serde(default)]
    price: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// YouPin marketplace client.
pub struct YouPinClient {
    http: Client,
    base_url: String,
    cookie: Option<Secret<String>>,
}

impl YouPinClient {
    pub fn new(base_url: &str, cookie: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("SKINWATCH/0.1.0 (price-monitor)")
            .build()
            .context("Failed to build HTTP client for YouPin")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: cookie.map(Secret::new),
        })
    }

    async fn post<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Posting YouPin query");

        let mut req = self.http.post(&url).json(body);
        if let Some(cookie) = &self.cookie {
            req = req.header(reqwest::header::COOKIE, cookie.expose_secret().as_str());
        }

        let resp = req.send().await.context("YouPin API request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("YouPin API error {status}: {text}");
        }

        let parsed: YouPinResponse<T> = resp
            .json()
            .await
            .context("Failed to parse YouPin response")?;

        if parsed.code != 0 {
            anyhow::bail!(
                "YouPin API returned code {}: {}",
                parsed.code,
                parsed.msg.unwrap_or_default()
            );
        }

        parsed.data.context("YouPin response has no data")
    }
}

fn value_to_id(v: &serde_json::Value) -> Option<MarketplaceId> {
    let raw = match v {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then(|| MarketplaceId::new(raw))
}

/// Exact (case-insensitive) name match first, else the first template.
fn pick_template_id(templates: &[SaleTemplate], name: &str) -> Option<MarketplaceId> {
    let wanted = name.trim().to_lowercase();
    templates
        .iter()
        .find(|t| t.commodity_name.trim().to_lowercase() == wanted)
        .or_else(|| templates.first())
        .and_then(|t| value_to_id(&t.id))
}

fn extract_prices(commodities: &[Commodity]) -> Vec<Decimal> {
    commodities
        .iter()
        .filter_map(|c| match c.price.as_ref()? {
            serde_json::Value::String(s) => parse_price(s),
            serde_json::Value::Number(n) => parse_price(&n.to_string()),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl MarketplaceClient for YouPinClient {
    async fn search_for_identifier(&self, name: &str) -> Result<MarketplaceId> {
        let query = TemplateQuery {
            key_words: name,
            list_sort_type: 0,
            sort_type: 0,
            page_index: 1,
            page_size: SEARCH_SIZE,
        };
        let templates: Vec<SaleTemplate> = self.post(SEARCH_PATH, &query).await?;
        pick_template_id(&templates, name)
            .with_context(|| format!("No YouPin template found for '{name}'"))
    }

    async fn fetch_sell_order_page(&self, id: &MarketplaceId, page: u32) -> Result<Vec<Decimal>> {
        let query = CommodityQuery {
            game_id: GAME_ID,
            list_type: "10",
            template_id: id.as_str(),
            list_sort_type: 1,
            sort_type: 1,
            page_index: page,
            page_size: PAGE_SIZE,
        };
        let commodities: Vec<Commodity> = self.post(LISTING_PATH, &query).await?;
        let prices = extract_prices(&commodities);
        debug!(template_id = %id, page, count = prices.len(), "YouPin listings captured");
        Ok(prices)
    }

    fn marketplace(&self) -> Marketplace {
        Marketplace::YouPin
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
