//! Append-only bid history. Rows are never updated or deleted; the live
//! high bid is tracked on the auction row itself.

use {
    crate::AuctionId,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
};

#[derive(Clone, Debug, Default, Eq, PartialEq, sqlx::FromRow)]
pub struct Bid {
    pub auction_id: AuctionId,
    pub bidder_id: String,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
    pub is_snipe: bool,
}

pub async fn insert(ex: &mut PgConnection, bid: &Bid) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO bids (auction_id, bidder_id, amount, placed_at, is_snipe)
VALUES ($1, $2, $3, $4, $5)
    "#;
    sqlx::query(QUERY)
        .bind(bid.auction_id)
        .bind(&bid.bidder_id)
        .bind(bid.amount)
        .bind(bid.placed_at)
        .bind(bid.is_snipe)
        .execute(ex)
        .await
        .map(|_| ())
}

pub async fn count(ex: &mut PgConnection, auction_id: AuctionId) -> Result<i64, sqlx::Error> {
    const QUERY: &str = "SELECT COUNT(*) FROM bids WHERE auction_id = $1;";
    let (count,) = sqlx::query_as(QUERY).bind(auction_id).fetch_one(ex).await?;
    Ok(count)
}

pub async fn for_auction(
    ex: &mut PgConnection,
    auction_id: AuctionId,
) -> Result<Vec<Bid>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT auction_id, bidder_id, amount, placed_at, is_snipe
FROM bids
WHERE auction_id = $1
ORDER BY placed_at ASC, id ASC
    "#;
    sqlx::query_as(QUERY).bind(auction_id).fetch_all(ex).await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auctions::{self, Listing},
        chrono::TimeZone,
        sqlx::Connection,
    };

    #[tokio::test]
    #[ignore]
    async fn postgres_bid_history() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let auction_id = auctions::insert(
            &mut db,
            &Listing {
                card_id: "card-1".to_string(),
                seller_id: "seller".to_string(),
                ask_price: 10,
                ends_at: t0,
                created_at: t0,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(count(&mut db, auction_id).await.unwrap(), 0);

        let first = Bid {
            auction_id,
            bidder_id: "alice".to_string(),
            amount: 11,
            placed_at: t0,
            is_snipe: false,
        };
        let second = Bid {
            auction_id,
            bidder_id: "bob".to_string(),
            amount: 12,
            placed_at: t0 + chrono::Duration::seconds(30),
            is_snipe: true,
        };
        insert(&mut db, &first).await.unwrap();
        insert(&mut db, &second).await.unwrap();

        assert_eq!(count(&mut db, auction_id).await.unwrap(), 2);
        let history = for_auction(&mut db, auction_id).await.unwrap();
        assert_eq!(history, vec![first, second]);
        // Amounts never decrease across the ordered history.
        assert!(history.windows(2).all(|w| w[0].amount <= w[1].amount));
    }
}
