use {
    crate::{
        clock::SimClock,
        events::{AuctionEvent, AuctionEvents},
    },
    chrono::{DateTime, Utc},
    model::{
        AuctionId, CardId, Credits, UserId,
        auction::{ActiveAuctions, Auction, AuctionCreation, AuctionFilter},
        bid::Bid,
        market::{MarketTrends, PricePoint, TimeRange},
    },
    observe::metrics::LivenessChecking,
    std::sync::Arc,
    thiserror::Error,
};

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "auction_house")]
struct Metrics {
    /// Number of auctions listed.
    auctions_created: prometheus::IntCounter,
    /// Number of bids accepted.
    bids_placed: prometheus::IntCounter,
    /// Number of bids turned away.
    bids_rejected: prometheus::IntCounter,
    /// Number of auctions ended by buyout.
    buyouts_executed: prometheus::IntCounter,
    /// Number of expired auctions settled, by outcome.
    #[metric(labels("outcome"))]
    auctions_settled: prometheus::IntCounterVec,
    /// Number of auctions cancelled by their seller.
    auctions_cancelled: prometheus::IntCounter,
}

impl Metrics {
    fn get() -> &'static Self {
        Self::instance(observe::metrics::get_storage_registry())
            .expect("unexpected error getting metrics instance")
    }
}

#[derive(Debug, Error)]
pub enum CreateAuctionError {
    #[error("seller does not own an available copy of this card")]
    NotOwned,
    #[error("seller already has an active listing for this card")]
    AlreadyListed,
    #[error("starting price must be at least 1 credit")]
    InvalidStartingPrice,
    #[error("buyout price must be greater than the starting price")]
    InvalidBuyoutPrice,
    #[error("insufficient balance for the {required} credit listing fee")]
    InsufficientFee { required: Credits },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum PlaceBidError {
    #[error("auction not found")]
    NotFound,
    #[error("auction is no longer active")]
    NotActive,
    #[error("auction has already ended")]
    Expired,
    #[error("sellers cannot bid on their own auctions")]
    SelfBid,
    #[error("bid must be at least {minimum} credits")]
    BidTooLow { minimum: Credits },
    #[error("insufficient balance to reserve {amount} credits")]
    InsufficientBalance { amount: Credits },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum BuyoutError {
    #[error("auction not found")]
    NotFound,
    #[error("auction is no longer active")]
    NotActive,
    #[error("auction has already ended")]
    Expired,
    #[error("auction has no buyout price")]
    NoBuyoutPrice,
    #[error("sellers cannot buy out their own auctions")]
    SelfBuyout,
    #[error("insufficient balance to pay {amount} credits")]
    InsufficientBalance { amount: Credits },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("auction not found")]
    NotFound,
    #[error("only the seller may cancel an auction")]
    NotSeller,
    #[error("auction is no longer active")]
    NotActive,
    #[error("auctions with bids cannot be cancelled")]
    HasBids,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The result of a successfully placed bid.
#[derive(Clone, Debug)]
pub struct BidOutcome {
    pub auction: Auction,
    /// The previous high bidder and the reservation returned to them.
    pub refunded: Option<(UserId, Credits)>,
    /// Whether the bid triggered an anti-snipe deadline extension.
    pub extended: bool,
    pub is_snipe: bool,
}

/// The result of a successful buyout.
#[derive(Clone, Debug)]
pub struct BuyoutOutcome {
    pub auction: Auction,
    /// The outbid high bidder and their returned reservation, if any.
    pub refunded: Option<(UserId, Credits)>,
    pub fee: Credits,
    pub proceeds: Credits,
}

/// What settling an expired auction did.
#[derive(Clone, Debug)]
pub enum SettlementOutcome {
    Sold {
        auction: Auction,
        fee: Credits,
        proceeds: Credits,
    },
    /// No bids were placed; the card went back to the seller.
    ReturnedUnsold { auction: Auction },
    /// The auction was already completed or cancelled by the time the row was
    /// locked. Settlement is idempotent so this is not an error.
    Skipped,
    /// The deadline has not passed yet.
    NotDue,
}

/// Storage backend for the auction house. All multi-step operations run in a
/// single database transaction behind this trait, so a returned value
/// reflects a committed state change.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuctionStoring: Send + Sync {
    async fn create_auction(
        &self,
        request: &AuctionCreation,
        now: DateTime<Utc>,
    ) -> Result<Auction, CreateAuctionError>;

    async fn place_bid(
        &self,
        auction: AuctionId,
        bidder: &UserId,
        amount: Credits,
        now: DateTime<Utc>,
    ) -> Result<BidOutcome, PlaceBidError>;

    async fn execute_buyout(
        &self,
        auction: AuctionId,
        buyer: &UserId,
        now: DateTime<Utc>,
    ) -> Result<BuyoutOutcome, BuyoutError>;

    async fn settle(
        &self,
        auction: AuctionId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, sqlx::Error>;

    async fn cancel(
        &self,
        auction: AuctionId,
        seller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Auction, CancelError>;

    async fn single_auction(&self, auction: AuctionId) -> Result<Option<Auction>, sqlx::Error>;

    async fn auction_bids(&self, auction: AuctionId) -> Result<Vec<Bid>, sqlx::Error>;

    /// Active auctions matching the filter plus the total number of matches
    /// ignoring the limit and offset.
    async fn active_auctions(
        &self,
        filter: &AuctionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Auction>, i64), sqlx::Error>;

    /// Completed sales since the given instant, newest first, optionally
    /// narrowed to a single card.
    async fn completed_sales<'a>(
        &self,
        card: Option<&'a CardId>,
        since: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, sqlx::Error>;

    /// Active auctions whose deadline has passed, oldest deadline first.
    async fn due_auctions(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AuctionId>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

pub struct AuctionHouse {
    store: Arc<dyn AuctionStoring>,
    clock: Arc<dyn SimClock>,
    events: Arc<dyn AuctionEvents>,
}

impl AuctionHouse {
    pub fn new(
        store: Arc<dyn AuctionStoring>,
        clock: Arc<dyn SimClock>,
        events: Arc<dyn AuctionEvents>,
    ) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    pub async fn create_auction(
        &self,
        request: &AuctionCreation,
    ) -> Result<Auction, CreateAuctionError> {
        let auction = self.store.create_auction(request, self.clock.now()).await?;
        Metrics::get().auctions_created.inc();
        tracing::debug!(auction = auction.id, seller = %auction.seller_id, "auction created");
        Ok(auction)
    }

    pub async fn place_bid(
        &self,
        auction: AuctionId,
        bidder: &UserId,
        amount: Credits,
    ) -> Result<BidOutcome, PlaceBidError> {
        let outcome = self
            .store
            .place_bid(auction, bidder, amount, self.clock.now())
            .await
            .inspect_err(|_| Metrics::get().bids_rejected.inc())?;
        Metrics::get().bids_placed.inc();
        if let Some((previous, refunded)) = &outcome.refunded {
            self.events.notify(AuctionEvent::Outbid {
                auction_id: auction,
                bidder_id: previous.clone(),
                refunded: *refunded,
            });
        }
        self.events.notify(AuctionEvent::BidPlaced {
            auction_id: auction,
            bidder_id: bidder.clone(),
            amount,
        });
        Ok(outcome)
    }

    pub async fn execute_buyout(
        &self,
        auction: AuctionId,
        buyer: &UserId,
    ) -> Result<BuyoutOutcome, BuyoutError> {
        let outcome = self
            .store
            .execute_buyout(auction, buyer, self.clock.now())
            .await?;
        Metrics::get().buyouts_executed.inc();
        if let Some((previous, refunded)) = &outcome.refunded {
            self.events.notify(AuctionEvent::Outbid {
                auction_id: auction,
                bidder_id: previous.clone(),
                refunded: *refunded,
            });
        }
        self.events.notify(AuctionEvent::AuctionWon {
            auction_id: auction,
            winner_id: buyer.clone(),
            final_price: outcome.auction.final_price.unwrap_or_default(),
        });
        Ok(outcome)
    }

    /// Settles an expired auction. Safe to call repeatedly and for auctions
    /// that are not actually due.
    pub async fn settle_auction(
        &self,
        auction: AuctionId,
    ) -> Result<SettlementOutcome, sqlx::Error> {
        let outcome = self.store.settle(auction, self.clock.now()).await?;
        match &outcome {
            SettlementOutcome::Sold { auction, .. } => {
                Metrics::get().auctions_settled.with_label_values(&["sold"]).inc();
                if let Some(winner) = &auction.winner_id {
                    self.events.notify(AuctionEvent::AuctionWon {
                        auction_id: auction.id,
                        winner_id: winner.clone(),
                        final_price: auction.final_price.unwrap_or_default(),
                    });
                }
            }
            SettlementOutcome::ReturnedUnsold { auction } => {
                Metrics::get()
                    .auctions_settled
                    .with_label_values(&["unsold"])
                    .inc();
                self.events.notify(AuctionEvent::ExpiredUnsold {
                    auction_id: auction.id,
                    seller_id: auction.seller_id.clone(),
                });
            }
            SettlementOutcome::Skipped | SettlementOutcome::NotDue => (),
        }
        Ok(outcome)
    }

    pub async fn cancel_auction(
        &self,
        auction: AuctionId,
        seller: &UserId,
    ) -> Result<Auction, CancelError> {
        let cancelled = self.store.cancel(auction, seller, self.clock.now()).await?;
        Metrics::get().auctions_cancelled.inc();
        self.events.notify(AuctionEvent::Cancelled {
            auction_id: cancelled.id,
            seller_id: cancelled.seller_id.clone(),
        });
        Ok(cancelled)
    }

    pub async fn get_auction(&self, auction: AuctionId) -> Result<Option<Auction>, sqlx::Error> {
        self.store.single_auction(auction).await
    }

    pub async fn auction_bids(&self, auction: AuctionId) -> Result<Vec<Bid>, sqlx::Error> {
        self.store.auction_bids(auction).await
    }

    pub async fn active_auctions(
        &self,
        filter: &AuctionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<ActiveAuctions, sqlx::Error> {
        let (auctions, total) = self.store.active_auctions(filter, limit, offset).await?;
        let has_more = offset + i64::try_from(auctions.len()).unwrap_or(i64::MAX) < total;
        Ok(ActiveAuctions {
            auctions,
            total,
            has_more,
        })
    }

    pub async fn market_trends(
        &self,
        card: Option<&CardId>,
        range: TimeRange,
    ) -> Result<MarketTrends, sqlx::Error> {
        let since = self.clock.now() - range.duration();
        let price_history = self.store.completed_sales(card, since).await?;
        let total_sales = i64::try_from(price_history.len()).unwrap_or(i64::MAX);
        let total_volume: Credits = price_history.iter().map(|point| point.price).sum();
        let average_price = if total_sales == 0 {
            0.0
        } else {
            total_volume as f64 / total_sales as f64
        };
        Ok(MarketTrends {
            total_sales,
            total_volume,
            average_price,
            price_history,
        })
    }

    pub async fn due_auctions(&self, limit: i64) -> Result<Vec<AuctionId>, sqlx::Error> {
        self.store.due_auctions(self.clock.now(), limit).await
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[async_trait::async_trait]
impl LivenessChecking for AuctionHouse {
    async fn is_alive(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            clock::FixedClock,
            events::MockAuctionEvents,
        },
        chrono::{Duration, TimeZone},
        model::auction::AuctionStatus,
        std::sync::Mutex,
    };

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn auction() -> Auction {
        Auction {
            id: 7,
            card_id: "card-1".into(),
            seller_id: "seller".into(),
            ask_price: 10,
            buyout_price: Some(100),
            current_bid: 10,
            current_bidder_id: None,
            ends_at: now() + Duration::minutes(30),
            is_featured: false,
            status: AuctionStatus::Active,
            winner_id: None,
            final_price: None,
            created_at: now(),
        }
    }

    fn house(store: MockAuctionStoring, events: MockAuctionEvents) -> AuctionHouse {
        observe::metrics::setup_registry_reentrant(Some("test".to_string()), None);
        AuctionHouse::new(
            Arc::new(store),
            Arc::new(FixedClock(now())),
            Arc::new(events),
        )
    }

    #[tokio::test]
    async fn bid_with_refund_emits_outbid_then_bid_placed() {
        let mut store = MockAuctionStoring::new();
        store.expect_place_bid().returning(|id, bidder, amount, _| {
            let mut auction = auction();
            auction.id = id;
            auction.current_bid = amount;
            auction.current_bidder_id = Some(bidder.clone());
            Ok(BidOutcome {
                auction,
                refunded: Some(("alice".into(), 10)),
                extended: false,
                is_snipe: false,
            })
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = MockAuctionEvents::new();
        let sink = seen.clone();
        events
            .expect_notify()
            .times(2)
            .returning(move |event| sink.lock().unwrap().push(event));

        let outcome = house(store, events)
            .place_bid(7, &"bob".into(), 11)
            .await
            .unwrap();
        assert_eq!(outcome.auction.current_bid, 11);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                AuctionEvent::Outbid {
                    auction_id: 7,
                    bidder_id: "alice".into(),
                    refunded: 10,
                },
                AuctionEvent::BidPlaced {
                    auction_id: 7,
                    bidder_id: "bob".into(),
                    amount: 11,
                },
            ]
        );
    }

    #[tokio::test]
    async fn settling_unsold_auction_notifies_seller() {
        let mut store = MockAuctionStoring::new();
        store.expect_settle().returning(|_, _| {
            let mut auction = auction();
            auction.status = AuctionStatus::Cancelled;
            Ok(SettlementOutcome::ReturnedUnsold { auction })
        });
        let mut events = MockAuctionEvents::new();
        events
            .expect_notify()
            .withf(|event| {
                matches!(
                    event,
                    AuctionEvent::ExpiredUnsold { auction_id: 7, .. }
                )
            })
            .times(1)
            .return_const(());

        let outcome = house(store, events).settle_auction(7).await.unwrap();
        assert!(matches!(outcome, SettlementOutcome::ReturnedUnsold { .. }));
    }

    #[tokio::test]
    async fn settlement_noops_stay_silent() {
        let mut store = MockAuctionStoring::new();
        store
            .expect_settle()
            .returning(|_, _| Ok(SettlementOutcome::Skipped));
        let events = MockAuctionEvents::new();

        let outcome = house(store, events).settle_auction(7).await.unwrap();
        assert!(matches!(outcome, SettlementOutcome::Skipped));
    }

    #[tokio::test]
    async fn market_trends_aggregates_history() {
        let mut store = MockAuctionStoring::new();
        store.expect_completed_sales().returning(|_, _| {
            Ok(vec![
                PricePoint {
                    card_id: "card-1".into(),
                    price: 300,
                    sold_at: now(),
                },
                PricePoint {
                    card_id: "card-1".into(),
                    price: 100,
                    sold_at: now() - Duration::hours(1),
                },
            ])
        });
        let events = MockAuctionEvents::new();

        let trends = house(store, events)
            .market_trends(Some(&"card-1".into()), TimeRange::Day)
            .await
            .unwrap();
        assert_eq!(trends.total_sales, 2);
        assert_eq!(trends.total_volume, 400);
        assert_eq!(trends.average_price, 200.0);
    }

    #[tokio::test]
    async fn empty_market_has_zero_average() {
        let mut store = MockAuctionStoring::new();
        store.expect_completed_sales().returning(|_, _| Ok(vec![]));
        let events = MockAuctionEvents::new();

        let trends = house(store, events)
            .market_trends(None, TimeRange::Week)
            .await
            .unwrap();
        assert_eq!(trends.total_sales, 0);
        assert_eq!(trends.average_price, 0.0);
    }

    #[tokio::test]
    async fn pagination_reports_remaining_pages() {
        let mut store = MockAuctionStoring::new();
        store
            .expect_active_auctions()
            .returning(|_, _, _| Ok((vec![auction(), auction()], 5)));
        let events = MockAuctionEvents::new();

        let page = house(store, events)
            .active_auctions(&AuctionFilter::default(), 2, 2)
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert!(page.has_more);
    }
}
