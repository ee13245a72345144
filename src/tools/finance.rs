//! Yahoo Finance lookups
//!
//! Two capabilities: `get_symbol` resolves a company name to its ticker via
//! the search endpoint, `get_stock_price` returns the latest one-minute bar
//! of today's chart.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::core::config::FinanceConfig;
use crate::core::{Result, StockBotError};
use crate::tools::registry::Capability;
use crate::tools::schema;

/// Latest price bar for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Bar start in the exchange's UTC offset, RFC 3339
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Pick the first symbol from a search response body
pub fn parse_symbol(company: &str, body: &str) -> Result<String> {
    let response: SearchResponse = serde_json::from_str(body)?;
    response
        .quotes
        .into_iter()
        .find_map(|q| q.symbol.filter(|s| !s.is_empty()))
        .ok_or_else(|| StockBotError::LookupNotFound(company.to_string()))
}

/// Extract the most recent bar that has a close from a chart response body
pub fn parse_latest_quote(symbol: &str, body: &str) -> Result<PriceQuote> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| StockBotError::data_unavailable(symbol, format!("unreadable chart: {}", e)))?;

    if let Some(error) = response.chart.error {
        return Err(StockBotError::data_unavailable(
            symbol,
            format!("{}: {}", error.code, error.description),
        ));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| StockBotError::data_unavailable(symbol, "empty chart result"))?;

    let series = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| StockBotError::data_unavailable(symbol, "no quote series"))?;

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let i = (0..result.timestamp.len())
        .rev()
        .find(|&i| at(&series.close, i).is_some())
        .ok_or_else(|| StockBotError::data_unavailable(symbol, "no trades in the current session"))?;

    let close = at(&series.close, i).unwrap_or_default();
    let bar_start = DateTime::from_timestamp(result.timestamp[i], 0)
        .ok_or_else(|| StockBotError::data_unavailable(symbol, "bad bar timestamp"))?;
    let timestamp = match FixedOffset::east_opt(result.meta.gmtoffset) {
        Some(offset) => bar_start.with_timezone(&offset).to_rfc3339(),
        None => bar_start.to_rfc3339(),
    };

    Ok(PriceQuote {
        timestamp,
        open: at(&series.open, i).unwrap_or(close),
        high: at(&series.high, i).unwrap_or(close),
        low: at(&series.low, i).unwrap_or(close),
        close,
        volume: at(&series.volume, i).unwrap_or(0.0) as u64,
    })
}

/// HTTP client for the Yahoo Finance endpoints
#[derive(Clone)]
pub struct YahooFinance {
    client: Client,
    config: FinanceConfig,
}

impl YahooFinance {
    pub fn from_config(config: &FinanceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Search URL for a company name
    pub fn search_url(&self, company: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.config.search_url,
            &[("q", company), ("country", self.config.country.as_str())],
        )
        .map_err(|e| StockBotError::config(format!("Invalid search_url: {}", e)))
    }

    /// Chart URL for today's one-minute bars of `symbol`
    pub fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.chart_url)
            .map_err(|e| StockBotError::config(format!("Invalid chart_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StockBotError::config("chart_url cannot take path segments"))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", "1m");
        Ok(url)
    }

    /// Resolve a company name to its ticker symbol
    pub async fn symbol(&self, company: &str) -> Result<String> {
        let response = self.client.get(self.search_url(company)?).send().await?;

        if !response.status().is_success() {
            return Err(StockBotError::execution(
                "get_symbol",
                format!("symbol search returned {}", response.status()),
            ));
        }

        let body = response.text().await?;
        let symbol = parse_symbol(company, &body)?;
        tracing::debug!(company, %symbol, "Resolved symbol");
        Ok(symbol)
    }

    /// Latest price bar for `symbol`
    pub async fn latest_quote(&self, symbol: &str) -> Result<PriceQuote> {
        let response = self.client.get(self.chart_url(symbol)?).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Unknown symbols come back as a 404 with a chart error body
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(StockBotError::data_unavailable(
                symbol,
                format!("chart returned {}", status),
            ));
        }

        parse_latest_quote(symbol, &body)
    }
}

/// `get_symbol` capability
pub struct SymbolLookup {
    finance: Arc<YahooFinance>,
}

impl SymbolLookup {
    pub fn new(finance: Arc<YahooFinance>) -> Self {
        Self { finance }
    }
}

#[async_trait]
impl Capability for SymbolLookup {
    fn name(&self) -> &str {
        "get_symbol"
    }

    fn description(&self) -> &str {
        "Retrieve the stock ticker symbol for a company using Yahoo Finance search. \
         Returns the symbol as a string, e.g. 'NVDA' for Nvidia."
    }

    fn input_schema(&self) -> Value {
        schema::string_fields(&[(
            "company",
            "The name of the company to look up, e.g. 'Nvidia'",
        )])
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let company = arguments["company"].as_str().unwrap_or_default();
        Ok(Value::String(self.finance.symbol(company).await?))
    }
}

/// `get_stock_price` capability
pub struct PriceLookup {
    finance: Arc<YahooFinance>,
}

impl PriceLookup {
    pub fn new(finance: Arc<YahooFinance>) -> Self {
        Self { finance }
    }
}

#[async_trait]
impl Capability for PriceLookup {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Retrieve the most recent price data for a stock symbol from Yahoo Finance. \
         Returns timestamp, open, high, low, close and volume of the latest one-minute bar."
    }

    fn input_schema(&self) -> Value {
        schema::string_fields(&[(
            "symbol",
            "The stock ticker symbol, e.g. 'NVDA' for Nvidia",
        )])
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let symbol = arguments["symbol"].as_str().unwrap_or_default();
        let quote = self.finance.latest_quote(symbol).await?;
        Ok(serde_json::to_value(quote)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE_MARKET_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "NVDA", "gmtoffset": -14400 },
                "timestamp": [1718208000],
                "indicators": { "quote": [{ "close": [null] }] }
            }],
            "error": null
        }
    }"#;

    fn chart_body() -> String {
        serde_json::json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "NVDA", "gmtoffset": -14400 },
                    "timestamp": [1718208000, 1718208060, 1718208120],
                    "indicators": { "quote": [{
                        "open":   [120.0, 120.3, null],
                        "high":   [120.6, 120.9, null],
                        "low":    [119.8, 120.1, null],
                        "close":  [120.2, 120.5, null],
                        "volume": [150000, 98000, null]
                    }]}
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_symbol_takes_first_quote() {
        let body = r#"{"quotes":[{"symbol":"NVDA","shortname":"NVIDIA Corporation"},{"symbol":"NVD.F"}]}"#;
        assert_eq!(parse_symbol("Nvidia", body).unwrap(), "NVDA");
    }

    #[test]
    fn test_parse_symbol_not_found() {
        let err = parse_symbol("Nonexistent Widgets", r#"{"quotes":[]}"#).unwrap_err();
        assert!(matches!(err, StockBotError::LookupNotFound(ref c) if c == "Nonexistent Widgets"));
    }

    #[test]
    fn test_parse_latest_quote_skips_open_bar() {
        let quote = parse_latest_quote("NVDA", &chart_body()).unwrap();
        assert_eq!(quote.close, 120.5);
        assert_eq!(quote.open, 120.3);
        assert_eq!(quote.volume, 98000);
        assert_eq!(quote.timestamp, "2024-06-12T12:01:00-04:00");
    }

    #[test]
    fn test_parse_chart_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_latest_quote("ZZZZ", body).unwrap_err();
        assert!(matches!(err, StockBotError::DataUnavailable { ref symbol, .. } if symbol == "ZZZZ"));
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_chart_without_trades_is_data_unavailable() {
        let err = parse_latest_quote("NVDA", PRE_MARKET_CHART).unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");

        let err = parse_latest_quote("NVDA", "<html>rate limited</html>").unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");
    }

    #[test]
    fn test_urls() {
        let finance = YahooFinance::from_config(&FinanceConfig::default()).unwrap();

        let search = finance.search_url("Nvidia").unwrap();
        assert!(search.as_str().starts_with("https://query2.finance.yahoo.com/v1/finance/search?"));
        assert!(search.as_str().contains("q=Nvidia"));
        assert!(search.as_str().contains("country=United+States"));

        let chart = finance.chart_url("BRK-B").unwrap();
        assert_eq!(
            chart.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/BRK-B?range=1d&interval=1m"
        );
    }

    #[test]
    fn test_capability_schemas() {
        let finance = Arc::new(YahooFinance::from_config(&FinanceConfig::default()).unwrap());
        let symbol = SymbolLookup::new(finance.clone());
        let price = PriceLookup::new(finance);

        assert_eq!(symbol.name(), "get_symbol");
        assert_eq!(symbol.input_schema()["required"][0], "company");
        assert_eq!(price.name(), "get_stock_price");
        assert_eq!(price.input_schema()["required"][0], "symbol");
    }
}
