//! The transactional [`AuctionStoring`] implementation. Every state
//! transition locks the auction row (and the ownership unit where cards
//! move) with `SELECT ... FOR UPDATE`, so concurrent bids, buyouts,
//! settlements and cancellations on the same auction serialize in the
//! database. A returned value always reflects a committed transaction.

use {
    super::{Metrics, Postgres, auction_from_row},
    crate::{
        auction_house::{
            AuctionStoring, BidOutcome, BuyoutError, BuyoutOutcome, CancelError,
            CreateAuctionError, PlaceBidError, SettlementOutcome,
        },
        domain::{bidding, fees},
    },
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    database::{auctions, bids, cards, ledger, ownerships},
    model::{
        AuctionId, CardId, Credits, UserId,
        auction::{Auction, AuctionCreation, AuctionFilter},
        bid::Bid,
        market::PricePoint,
    },
};

const LISTING_FEE_CATEGORY: &str = "auction_listing_fee";
const BID_RESERVE_CATEGORY: &str = "auction_bid_reserve";
const BID_REFUND_CATEGORY: &str = "auction_bid_refund";
const BUYOUT_CATEGORY: &str = "auction_buyout";
const PROCEEDS_CATEGORY: &str = "auction_sale_proceeds";
const FEE_REFUND_CATEGORY: &str = "auction_fee_refund";

fn credits(amount: Credits) -> BigDecimal {
    BigDecimal::from(amount)
}

#[async_trait::async_trait]
impl AuctionStoring for Postgres {
    async fn create_auction(
        &self,
        request: &AuctionCreation,
        now: DateTime<Utc>,
    ) -> Result<Auction, CreateAuctionError> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["create_auction"])
            .start_timer();

        let mut ex = self.pool.begin().await?;

        // Ownership is checked before the price sanity checks so that a
        // seller probing someone else's card sees a permission error, not a
        // validation error.
        let unit = ownerships::single_for_update(
            &mut ex,
            request.seller_id.as_str(),
            request.card_id.as_str(),
        )
        .await?;
        let available = unit.is_some_and(|unit| unit.quantity >= 1 && !unit.is_locked);
        if !available {
            return Err(CreateAuctionError::NotOwned);
        }

        if request.starting_price < 1 {
            return Err(CreateAuctionError::InvalidStartingPrice);
        }
        if let Some(buyout) = request.buyout_price {
            if buyout <= request.starting_price {
                return Err(CreateAuctionError::InvalidBuyoutPrice);
            }
        }

        let fee = fees::listing_fee(request.is_featured);
        let paid = ledger::spend(
            &mut ex,
            request.seller_id.as_str(),
            &credits(fee),
            LISTING_FEE_CATEGORY,
            "listing fee",
            now,
        )
        .await?;
        if !paid {
            return Err(CreateAuctionError::InsufficientFee { required: fee });
        }

        ownerships::set_locked(
            &mut ex,
            request.seller_id.as_str(),
            request.card_id.as_str(),
            true,
        )
        .await?;

        let listing = auctions::Listing {
            card_id: request.card_id.to_string(),
            seller_id: request.seller_id.to_string(),
            ask_price: request.starting_price,
            buyout_price: request.buyout_price,
            ends_at: now + request.duration.duration(),
            is_featured: request.is_featured,
            created_at: now,
        };
        let id = auctions::insert(&mut ex, &listing)
            .await
            .map_err(|err| match err.as_database_error() {
                Some(db) if db.constraint() == Some("auctions_one_active_per_unit") => {
                    CreateAuctionError::AlreadyListed
                }
                _ => CreateAuctionError::Database(err),
            })?;
        let auction = auctions::single(&mut ex, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        ex.commit().await?;
        Ok(auction_from_row(auction))
    }

    async fn place_bid(
        &self,
        auction: AuctionId,
        bidder: &UserId,
        amount: Credits,
        now: DateTime<Utc>,
    ) -> Result<BidOutcome, PlaceBidError> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["place_bid"])
            .start_timer();

        let mut ex = self.pool.begin().await?;

        let row = auctions::single_for_update(&mut ex, auction)
            .await?
            .ok_or(PlaceBidError::NotFound)?;
        if row.status != auctions::AuctionStatus::Active {
            return Err(PlaceBidError::NotActive);
        }
        if row.seller_id == bidder.as_str() {
            return Err(PlaceBidError::SelfBid);
        }
        // A lazy check; the settler sweeps expired auctions on its own.
        if row.ends_at <= now {
            return Err(PlaceBidError::Expired);
        }

        // `current_bid` starts out at the ask, so the increment rule also
        // applies to the first bid.
        let minimum = bidding::minimum_raise(row.current_bid);
        if amount < minimum {
            return Err(PlaceBidError::BidTooLow { minimum });
        }

        let reserved = ledger::spend(
            &mut ex,
            bidder.as_str(),
            &credits(amount),
            BID_RESERVE_CATEGORY,
            &format!("bid on auction {auction}"),
            now,
        )
        .await?;
        if !reserved {
            return Err(PlaceBidError::InsufficientBalance { amount });
        }

        // Return the previous reservation. This also applies when a bidder
        // raises their own bid, so exactly one reservation per auction is
        // ever outstanding.
        let refunded = match &row.current_bidder_id {
            Some(previous) => {
                ledger::earn(
                    &mut ex,
                    previous,
                    &credits(row.current_bid),
                    BID_REFUND_CATEGORY,
                    &format!("outbid on auction {auction}"),
                    now,
                )
                .await?;
                Some((UserId::from(previous.clone()), row.current_bid))
            }
            None => None,
        };

        let is_snipe = bidding::is_snipe(row.ends_at, now);
        let extension = bidding::extend_deadline(row.ends_at, now);
        let ends_at = extension.unwrap_or(row.ends_at);

        auctions::record_bid(&mut ex, auction, amount, bidder.as_str(), ends_at).await?;
        bids::insert(
            &mut ex,
            &bids::Bid {
                auction_id: auction,
                bidder_id: bidder.to_string(),
                amount,
                placed_at: now,
                is_snipe,
            },
        )
        .await?;

        ex.commit().await?;
        Ok(BidOutcome {
            auction: auction_from_row(auctions::Auction {
                current_bid: amount,
                current_bidder_id: Some(bidder.to_string()),
                ends_at,
                ..row
            }),
            refunded,
            extended: extension.is_some(),
            is_snipe,
        })
    }

    async fn execute_buyout(
        &self,
        auction: AuctionId,
        buyer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<BuyoutOutcome, BuyoutError> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["execute_buyout"])
            .start_timer();

        let mut ex = self.pool.begin().await?;

        let row = auctions::single_for_update(&mut ex, auction)
            .await?
            .ok_or(BuyoutError::NotFound)?;
        // No buyout price means there is nothing to address, checked before
        // the state of the auction.
        let price = row.buyout_price.ok_or(BuyoutError::NoBuyoutPrice)?;
        if row.status != auctions::AuctionStatus::Active {
            return Err(BuyoutError::NotActive);
        }
        if row.ends_at <= now {
            return Err(BuyoutError::Expired);
        }
        if row.seller_id == buyer.as_str() {
            return Err(BuyoutError::SelfBuyout);
        }

        let paid = ledger::spend(
            &mut ex,
            buyer.as_str(),
            &credits(price),
            BUYOUT_CATEGORY,
            &format!("buyout of auction {auction}"),
            now,
        )
        .await?;
        if !paid {
            return Err(BuyoutError::InsufficientBalance { amount: price });
        }

        let refunded = match &row.current_bidder_id {
            Some(previous) => {
                ledger::earn(
                    &mut ex,
                    previous,
                    &credits(row.current_bid),
                    BID_REFUND_CATEGORY,
                    &format!("auction {auction} bought out"),
                    now,
                )
                .await?;
                Some((UserId::from(previous.clone()), row.current_bid))
            }
            None => None,
        };

        let fee = fees::sale_fee(price);
        let proceeds = fees::seller_proceeds(price);
        ledger::earn(
            &mut ex,
            &row.seller_id,
            &credits(proceeds),
            PROCEEDS_CATEGORY,
            &format!("sale of auction {auction}"),
            now,
        )
        .await?;
        ownerships::transfer_unit(&mut ex, &row.seller_id, buyer.as_str(), &row.card_id).await?;
        auctions::complete(&mut ex, auction, buyer.as_str(), price, now).await?;
        cards::set_market_value(&mut ex, &row.card_id, price).await?;

        ex.commit().await?;
        Ok(BuyoutOutcome {
            auction: auction_from_row(auctions::Auction {
                status: auctions::AuctionStatus::Completed,
                winner_id: Some(buyer.to_string()),
                final_price: Some(price),
                closed_at: Some(now),
                ..row
            }),
            refunded,
            fee,
            proceeds,
        })
    }

    async fn settle(
        &self,
        auction: AuctionId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["settle"])
            .start_timer();

        let mut ex = self.pool.begin().await?;

        let Some(row) = auctions::single_for_update(&mut ex, auction).await? else {
            return Ok(SettlementOutcome::Skipped);
        };
        if row.status != auctions::AuctionStatus::Active {
            return Ok(SettlementOutcome::Skipped);
        }
        if row.ends_at > now {
            return Ok(SettlementOutcome::NotDue);
        }

        let outcome = match &row.current_bidder_id {
            Some(winner) => {
                // The winning reservation was debited when the bid was
                // placed, so settling only pays out the seller.
                let price = row.current_bid;
                let fee = fees::sale_fee(price);
                let proceeds = fees::seller_proceeds(price);
                ledger::earn(
                    &mut ex,
                    &row.seller_id,
                    &credits(proceeds),
                    PROCEEDS_CATEGORY,
                    &format!("sale of auction {auction}"),
                    now,
                )
                .await?;
                ownerships::transfer_unit(&mut ex, &row.seller_id, winner, &row.card_id).await?;
                auctions::complete(&mut ex, auction, winner, price, now).await?;
                cards::set_market_value(&mut ex, &row.card_id, price).await?;
                SettlementOutcome::Sold {
                    auction: auction_from_row(auctions::Auction {
                        status: auctions::AuctionStatus::Completed,
                        winner_id: Some(winner.clone()),
                        final_price: Some(price),
                        closed_at: Some(now),
                        ..row.clone()
                    }),
                    fee,
                    proceeds,
                }
            }
            None => {
                // Expiring without a bid returns half the listing fee, same
                // as a seller cancellation.
                ledger::earn(
                    &mut ex,
                    &row.seller_id,
                    &fees::cancellation_refund(row.is_featured),
                    FEE_REFUND_CATEGORY,
                    &format!("auction {auction} expired unsold"),
                    now,
                )
                .await?;
                ownerships::set_locked(&mut ex, &row.seller_id, &row.card_id, false).await?;
                auctions::cancel(&mut ex, auction, now).await?;
                SettlementOutcome::ReturnedUnsold {
                    auction: auction_from_row(auctions::Auction {
                        status: auctions::AuctionStatus::Cancelled,
                        closed_at: Some(now),
                        ..row
                    }),
                }
            }
        };

        ex.commit().await?;
        Ok(outcome)
    }

    async fn cancel(
        &self,
        auction: AuctionId,
        seller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Auction, CancelError> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["cancel"])
            .start_timer();

        let mut ex = self.pool.begin().await?;

        let row = auctions::single_for_update(&mut ex, auction)
            .await?
            .ok_or(CancelError::NotFound)?;
        if row.seller_id != seller.as_str() {
            return Err(CancelError::NotSeller);
        }
        if row.status != auctions::AuctionStatus::Active {
            return Err(CancelError::NotActive);
        }
        // The recorded bid history decides, not the live high-bid column.
        if bids::count(&mut ex, auction).await? > 0 {
            return Err(CancelError::HasBids);
        }

        ledger::earn(
            &mut ex,
            &row.seller_id,
            &fees::cancellation_refund(row.is_featured),
            FEE_REFUND_CATEGORY,
            &format!("cancelled auction {auction}"),
            now,
        )
        .await?;
        ownerships::set_locked(&mut ex, &row.seller_id, &row.card_id, false).await?;
        auctions::cancel(&mut ex, auction, now).await?;

        ex.commit().await?;
        Ok(auction_from_row(auctions::Auction {
            status: auctions::AuctionStatus::Cancelled,
            closed_at: Some(now),
            ..row
        }))
    }

    async fn single_auction(&self, auction: AuctionId) -> Result<Option<Auction>, sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["single_auction"])
            .start_timer();

        let mut ex = self.pool.acquire().await?;
        let row = auctions::single(&mut ex, auction).await?;
        Ok(row.map(auction_from_row))
    }

    async fn auction_bids(&self, auction: AuctionId) -> Result<Vec<Bid>, sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["auction_bids"])
            .start_timer();

        let mut ex = self.pool.acquire().await?;
        let rows = bids::for_auction(&mut ex, auction).await?;
        Ok(rows
            .into_iter()
            .map(|bid| Bid {
                auction_id: bid.auction_id,
                bidder_id: bid.bidder_id.into(),
                amount: bid.amount,
                placed_at: bid.placed_at,
                is_snipe: bid.is_snipe,
            })
            .collect())
    }

    async fn active_auctions(
        &self,
        filter: &AuctionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Auction>, i64), sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["active_auctions"])
            .start_timer();

        let mut ex = self.pool.acquire().await?;
        let db_filter = auctions::Filter {
            card_id: filter.card_id.as_ref().map(CardId::as_str),
            seller_id: filter.seller_id.as_ref().map(UserId::as_str),
            featured_only: filter.featured_only,
        };
        let rows = auctions::active(&mut ex, &db_filter, limit, offset).await?;
        let total = auctions::count_active(&mut ex, &db_filter).await?;
        Ok((rows.into_iter().map(auction_from_row).collect(), total))
    }

    async fn completed_sales<'a>(
        &self,
        card: Option<&'a CardId>,
        since: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["completed_sales"])
            .start_timer();

        let mut ex = self.pool.acquire().await?;
        let sales =
            auctions::completed_sales(&mut ex, card.map(|card| card.as_str()), since).await?;
        Ok(sales
            .into_iter()
            .map(|sale| PricePoint {
                card_id: sale.card_id.into(),
                price: sale.final_price,
                sold_at: sale.closed_at,
            })
            .collect())
    }

    async fn due_auctions(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AuctionId>, sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["due_auctions"])
            .start_timer();

        let mut ex = self.pool.acquire().await?;
        auctions::due(&mut ex, now, limit).await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        let _timer = Metrics::get()
            .database_queries
            .with_label_values(&["ping"])
            .start_timer();

        sqlx::query("SELECT 1;").execute(&self.pool).await?;
        Ok(())
    }
}
