//! Bid history records. Bids are append-only; they are never mutated or
//! deleted, even when the bidder is refunded after being outbid.

use {
    crate::{AuctionId, Credits, UserId},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Credits,
    pub placed_at: DateTime<Utc>,
    /// Landed within the final minute of the auction. Analytics only; has no
    /// effect on settlement.
    pub is_snipe: bool,
}

/// Request payload for placing a bid.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub bidder_id: UserId,
    pub amount: Credits,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn bid_serialization() {
        let bid = Bid {
            auction_id: 1,
            bidder_id: "bidder".into(),
            amount: 11,
            placed_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            is_snipe: true,
        };
        let value = serde_json::to_value(&bid).unwrap();
        assert_eq!(value["bidderId"], json!("bidder"));
        assert_eq!(value["isSnipe"], json!(true));
    }
}
