pub mod store;

use {
    anyhow::Result,
    model::auction::{Auction, AuctionStatus},
    sqlx::PgPool,
};

// The pool uses an Arc internally.
#[derive(Clone)]
pub struct Postgres {
    pub pool: PgPool,
}

impl Postgres {
    pub fn new(uri: &str) -> Result<Self> {
        Ok(Self {
            pool: PgPool::connect_lazy(uri)?,
        })
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
struct Metrics {
    /// Timing of db queries.
    #[metric(name = "auction_house_database_queries", labels("type"))]
    database_queries: prometheus::HistogramVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}

fn auction_from_row(row: database::auctions::Auction) -> Auction {
    Auction {
        id: row.id,
        card_id: row.card_id.into(),
        seller_id: row.seller_id.into(),
        ask_price: row.ask_price,
        buyout_price: row.buyout_price,
        current_bid: row.current_bid,
        current_bidder_id: row.current_bidder_id.map(Into::into),
        ends_at: row.ends_at,
        is_featured: row.is_featured,
        status: match row.status {
            database::auctions::AuctionStatus::Active => AuctionStatus::Active,
            database::auctions::AuctionStatus::Completed => AuctionStatus::Completed,
            database::auctions::AuctionStatus::Cancelled => AuctionStatus::Cancelled,
        },
        winner_id: row.winner_id.map(Into::into),
        final_price: row.final_price,
        created_at: row.created_at,
    }
}
