//! Read-only market analytics over completed auctions.

use {
    crate::{CardId, Credits},
    chrono::{DateTime, Duration, Utc},
    serde::{Deserialize, Serialize},
    strum::EnumString,
};

/// The lookback window for market trend queries.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq, EnumString, strum::Display,
)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    #[strum(serialize = "24h")]
    Day,
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Week,
    #[serde(rename = "30d")]
    #[strum(serialize = "30d")]
    Month,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }
}

/// One completed sale, used for price history charts.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub card_id: CardId,
    pub price: Credits,
    pub sold_at: DateTime<Utc>,
}

/// Aggregated market statistics for a time window, optionally restricted to
/// a single card.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrends {
    pub total_sales: i64,
    pub total_volume: Credits,
    pub average_price: f64,
    pub price_history: Vec<PricePoint>,
}
