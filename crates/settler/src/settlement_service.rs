//! Sweeps expired auctions and settles them through the auction engine.
//! Settlement is idempotent, so a crashed sweep simply retries the same
//! auctions on the next run.

use {
    anyhow::{Context, Result},
    auction_house::auction_house::{AuctionHouse, SettlementOutcome},
    std::sync::Arc,
};

pub struct SettlementService {
    auction_house: Arc<AuctionHouse>,
    max_batch_size: i64,
}

impl SettlementService {
    pub fn new(auction_house: Arc<AuctionHouse>, max_batch_size: i64) -> Self {
        Self {
            auction_house,
            max_batch_size,
        }
    }

    /// Settles every due auction once and returns how many reached a
    /// terminal state. A failure on one auction does not stop the sweep.
    pub async fn settle_all_due(&self) -> Result<usize> {
        let due = self
            .auction_house
            .due_auctions(self.max_batch_size)
            .await
            .context("failed to query due auctions")?;
        let mut settled = 0;
        for id in due {
            match self.auction_house.settle_auction(id).await {
                Ok(SettlementOutcome::Sold { auction, .. }) => {
                    tracing::info!(auction = id, winner = ?auction.winner_id, "auction sold");
                    settled += 1;
                }
                Ok(SettlementOutcome::ReturnedUnsold { .. }) => {
                    tracing::info!(auction = id, "auction expired unsold");
                    settled += 1;
                }
                // Someone else settled it between the query and the lock.
                Ok(SettlementOutcome::Skipped | SettlementOutcome::NotDue) => (),
                Err(err) => {
                    tracing::error!(auction = id, ?err, "failed to settle auction");
                }
            }
        }
        Ok(settled)
    }
}
