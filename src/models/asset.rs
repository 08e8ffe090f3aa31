use serde::{Deserialize, Serialize};
use serde_json::Value;

const LOGO_BASE_URL: &str = "https://cryptologos.cc/logos";

/// One row of the market snapshot, as cached under `cryptoData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change24h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    pub image_url: String,
}

/// Full market read. Always replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSnapshot(pub Vec<Asset>);

impl MarketSnapshot {
    pub fn assets(&self) -> &[Asset] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Asset> {
        self.0.iter().find(|a| a.id == id)
    }

    /// Symbols are derived and may repeat; the first match wins.
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Asset> {
        self.0.iter().find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }
}

impl From<Vec<Asset>> for MarketSnapshot {
    fn from(assets: Vec<Asset>) -> Self {
        Self(assets)
    }
}

// Backend `/home` response (GeckoTerminal pool listing)
#[derive(Debug, Clone, Deserialize)]
pub struct HomeResponse {
    #[serde(default)]
    pub data: Vec<PoolEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    pub id: String,
    pub attributes: PoolAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_token_price_usd: Option<Value>,
    #[serde(default)]
    pub price_change_percentage: PeriodValues,
    #[serde(default)]
    pub volume_usd: PeriodValues,
    #[serde(default)]
    pub market_cap_usd: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodValues {
    #[serde(default)]
    pub h24: Option<Value>,
}

impl From<PoolEntry> for Asset {
    fn from(entry: PoolEntry) -> Self {
        // ids look like "<network>_<token>"
        let segment = entry
            .id
            .split('_')
            .nth(1)
            .filter(|s| !s.is_empty())
            .unwrap_or(entry.id.as_str())
            .to_string();

        Asset {
            name: entry.attributes.name,
            symbol: segment.to_uppercase(),
            price: parse_number(entry.attributes.base_token_price_usd.as_ref()).unwrap_or(0.0),
            change24h: parse_number(entry.attributes.price_change_percentage.h24.as_ref())
                .unwrap_or(0.0),
            market_cap: parse_number(entry.attributes.market_cap_usd.as_ref()),
            volume: parse_number(entry.attributes.volume_usd.h24.as_ref()),
            image_url: format!("{}/{}.png", LOGO_BASE_URL, segment),
            id: entry.id,
        }
    }
}

impl From<HomeResponse> for MarketSnapshot {
    fn from(response: HomeResponse) -> Self {
        MarketSnapshot(response.data.into_iter().map(Asset::from).collect())
    }
}

/// Decimal strings and plain numbers are both accepted. NaN and infinities are dropped.
fn parse_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
