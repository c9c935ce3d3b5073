//! Module defining a card auction listing and its lifecycle states.

use {
    crate::{AuctionId, CardId, Credits, UserId},
    chrono::{DateTime, Duration, Utc},
    serde::{Deserialize, Serialize},
    strum::EnumString,
};

/// Lifecycle state of an auction.
///
/// The only legal transitions are `Active -> Completed` (buyout or expiry
/// with a standing bidder) and `Active -> Cancelled` (seller cancellation or
/// expiry without bids). Terminal states are never left.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq, Hash, EnumString,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// How long a new listing runs before it expires. Only two durations are
/// offered to keep the market moving.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(try_from = "u32", into = "u32")]
pub enum ListingDuration {
    ThirtyMinutes,
    SixtyMinutes,
}

impl ListingDuration {
    pub fn minutes(&self) -> i64 {
        match self {
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl TryFrom<u32> for ListingDuration {
    type Error = InvalidListingDuration;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            30 => Ok(Self::ThirtyMinutes),
            60 => Ok(Self::SixtyMinutes),
            other => Err(InvalidListingDuration(other)),
        }
    }
}

impl From<ListingDuration> for u32 {
    fn from(duration: ListingDuration) -> Self {
        match duration {
            ListingDuration::ThirtyMinutes => 30,
            ListingDuration::SixtyMinutes => 60,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("listing duration must be 30 or 60 minutes, got {0}")]
pub struct InvalidListingDuration(pub u32);

/// A single auction listing as exposed over the API.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: AuctionId,
    pub card_id: CardId,
    pub seller_id: UserId,
    /// Minimum (starting) price. Also the initial value of `current_bid`.
    pub ask_price: Credits,
    /// Optional immediate-purchase price, strictly greater than `ask_price`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyout_price: Option<Credits>,
    /// Highest accepted bid; equals `ask_price` until the first bid lands.
    pub current_bid: Credits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_bidder_id: Option<UserId>,
    /// Deadline in simulation time. Pushed forward by the anti-snipe rule.
    pub ends_at: DateTime<Utc>,
    pub is_featured: bool,
    pub status: AuctionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_price: Option<Credits>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a new listing.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuctionCreation {
    pub seller_id: UserId,
    pub card_id: CardId,
    pub starting_price: Credits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyout_price: Option<Credits>,
    pub duration: ListingDuration,
    #[serde(default)]
    pub is_featured: bool,
}

/// Filters for the active-listings query.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuctionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub featured_only: bool,
}

/// A page of active listings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAuctions {
    pub auctions: Vec<Auction>,
    /// Total number of listings matching the filter, ignoring pagination.
    pub total: i64,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn listing_duration_accepts_only_offered_values() {
        assert_eq!(
            ListingDuration::try_from(30).unwrap(),
            ListingDuration::ThirtyMinutes
        );
        assert_eq!(
            ListingDuration::try_from(60).unwrap(),
            ListingDuration::SixtyMinutes
        );
        for minutes in [0, 1, 29, 31, 45, 61, 120] {
            assert!(ListingDuration::try_from(minutes).is_err());
        }
    }

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_value(AuctionStatus::Active).unwrap(),
            json!("ACTIVE")
        );
        assert_eq!(
            serde_json::from_value::<AuctionStatus>(json!("CANCELLED")).unwrap(),
            AuctionStatus::Cancelled
        );
    }

    #[test]
    fn auction_roundtrip() {
        let auction = Auction {
            id: 7,
            card_id: "card-123".into(),
            seller_id: "seller".into(),
            ask_price: 10,
            buyout_price: Some(50),
            current_bid: 12,
            current_bidder_id: Some("bidder".into()),
            ends_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            is_featured: true,
            status: AuctionStatus::Active,
            winner_id: None,
            final_price: None,
            created_at: DateTime::from_timestamp(1_699_999_000, 0).unwrap(),
        };
        let value = serde_json::to_value(&auction).unwrap();
        assert_eq!(value["cardId"], json!("card-123"));
        assert_eq!(value["buyoutPrice"], json!(50));
        assert_eq!(value["status"], json!("ACTIVE"));
        assert!(value.get("winnerId").is_none());
        let back: Auction = serde_json::from_value(value).unwrap();
        assert_eq!(auction, back);
    }

    #[test]
    fn creation_request_deserializes_duration_minutes() {
        let request: AuctionCreation = serde_json::from_value(json!({
            "sellerId": "seller",
            "cardId": "card-1",
            "startingPrice": 10,
            "buyoutPrice": 50,
            "duration": 30,
            "isFeatured": false,
        }))
        .unwrap();
        assert_eq!(request.duration, ListingDuration::ThirtyMinutes);
        assert_eq!(request.duration.minutes(), 30);

        let invalid = serde_json::from_value::<AuctionCreation>(json!({
            "sellerId": "seller",
            "cardId": "card-1",
            "startingPrice": 10,
            "duration": 45,
        }));
        assert!(invalid.is_err());
    }
}
