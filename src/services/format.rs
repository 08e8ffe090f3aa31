//! Display formatting for prices, market caps and percentage changes.

/// Decimals grow as the price shrinks: `< 0.01` gets 6, `< 1` gets 5, everything else 2.
pub fn format_price(price: f64) -> String {
    if price < 0.01 {
        format!("{:.6}", price)
    } else if price < 1.0 {
        format!("{:.5}", price)
    } else {
        format!("{:.2}", price)
    }
}

pub fn format_market_cap(value: f64) -> String {
    if value >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("${:.2}K", value / 1e3)
    } else {
        format!("${:.2}", value)
    }
}

/// Same scale as market cap; absent volumes render as `N/A`.
pub fn format_volume(volume: Option<f64>) -> String {
    match volume {
        Some(v) => format_market_cap(v),
        None => "N/A".to_string(),
    }
}

pub fn format_change(change: f64) -> String {
    if change >= 0.0 {
        format!("+{:.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}
