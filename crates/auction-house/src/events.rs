//! Fire-and-forget auction notifications. Events are emitted after the
//! owning transaction committed; delivery is best effort and a failure to
//! deliver must never fail or roll back the operation that produced it.

use {
    model::{AuctionId, Credits, UserId},
    tokio::sync::broadcast,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuctionEvent {
    BidPlaced {
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Credits,
    },
    /// The previous high bidder was refunded their reservation.
    Outbid {
        auction_id: AuctionId,
        bidder_id: UserId,
        refunded: Credits,
    },
    AuctionWon {
        auction_id: AuctionId,
        winner_id: UserId,
        final_price: Credits,
    },
    /// The auction expired without a single bid; the card went back to the
    /// seller.
    ExpiredUnsold {
        auction_id: AuctionId,
        seller_id: UserId,
    },
    Cancelled {
        auction_id: AuctionId,
        seller_id: UserId,
    },
}

#[cfg_attr(test, mockall::automock)]
pub trait AuctionEvents: Send + Sync {
    fn notify(&self, event: AuctionEvent);
}

/// Publishes events on a broadcast channel that interested subsystems
/// (notification delivery, live market feeds) can subscribe to. Lagging or
/// absent subscribers drop events.
pub struct BroadcastEvents {
    sender: broadcast::Sender<AuctionEvent>,
}

impl BroadcastEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEvents {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AuctionEvents for BroadcastEvents {
    fn notify(&self, event: AuctionEvent) {
        tracing::debug!(?event, "auction event");
        // An Err here only means nobody is subscribed right now.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_subscribers() {
        let events = BroadcastEvents::new(8);
        let mut receiver = events.subscribe();
        let event = AuctionEvent::BidPlaced {
            auction_id: 1,
            bidder_id: "bidder".into(),
            amount: 11,
        };
        events.notify(event.clone());
        assert_eq!(receiver.recv().await.unwrap(), event);
    }

    #[test]
    fn notify_without_subscribers_does_not_panic() {
        let events = BroadcastEvents::new(8);
        events.notify(AuctionEvent::Cancelled {
            auction_id: 1,
            seller_id: "seller".into(),
        });
    }
}
