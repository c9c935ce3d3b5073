//! Domain and API types for the card auction house.
//!
//! These types define the wire format (camelCase JSON) shared between the
//! API crate, the database layer and external consumers. They deliberately
//! contain no persistence or business logic.

pub mod auction;
pub mod bid;
pub mod market;

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Identifier of an auction row.
pub type AuctionId = i64;

/// Credit amounts (IxC) as used for prices and bids. Whole credits only;
/// fractional amounts exist only inside the ledger (fee refunds).
pub type Credits = i64;

/// Identifier of a platform user (seller, bidder, buyer).
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a card. The ownership unit being auctioned is the
/// (owner, card) pair; see [`auction::Auction`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
