use {
    crate::AuctionId,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
};

/// Lifecycle state of an auction row. Rows only ever move from `Active` to
/// one of the terminal states.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, sqlx::Type)]
#[sqlx(type_name = "AuctionStatus")]
#[sqlx(rename_all = "lowercase")]
pub enum AuctionStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, sqlx::FromRow)]
pub struct Auction {
    pub id: AuctionId,
    pub card_id: String,
    pub seller_id: String,
    pub ask_price: i64,
    pub buyout_price: Option<i64>,
    pub current_bid: i64,
    pub current_bidder_id: Option<String>,
    pub ends_at: DateTime<Utc>,
    pub is_featured: bool,
    pub status: AuctionStatus,
    pub winner_id: Option<String>,
    pub final_price: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Fields of a new listing; the id is assigned by the database and the row
/// starts out `Active` with `current_bid = ask_price`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Listing {
    pub card_id: String,
    pub seller_id: String,
    pub ask_price: i64,
    pub buyout_price: Option<i64>,
    pub ends_at: DateTime<Utc>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn insert(ex: &mut PgConnection, listing: &Listing) -> Result<AuctionId, sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO auctions (
    card_id, seller_id, ask_price, buyout_price, current_bid, ends_at,
    is_featured, status, created_at
)
VALUES ($1, $2, $3, $4, $3, $5, $6, 'active', $7)
RETURNING id;
    "#;
    let (id,) = sqlx::query_as(QUERY)
        .bind(&listing.card_id)
        .bind(&listing.seller_id)
        .bind(listing.ask_price)
        .bind(listing.buyout_price)
        .bind(listing.ends_at)
        .bind(listing.is_featured)
        .bind(listing.created_at)
        .fetch_one(ex)
        .await?;
    Ok(id)
}

pub async fn single(ex: &mut PgConnection, id: AuctionId) -> Result<Option<Auction>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT * FROM auctions
WHERE id = $1
    "#;
    sqlx::query_as(QUERY).bind(id).fetch_optional(ex).await
}

/// Reads the auction while taking a row lock that is held until the
/// surrounding transaction ends. All state transitions go through this so
/// that concurrent bids, buyouts and settlements serialize per auction.
pub async fn single_for_update(
    ex: &mut PgConnection,
    id: AuctionId,
) -> Result<Option<Auction>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT * FROM auctions
WHERE id = $1
FOR UPDATE
    "#;
    sqlx::query_as(QUERY).bind(id).fetch_optional(ex).await
}

pub async fn record_bid(
    ex: &mut PgConnection,
    id: AuctionId,
    amount: i64,
    bidder_id: &str,
    ends_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
UPDATE auctions
SET current_bid = $2, current_bidder_id = $3, ends_at = $4
WHERE id = $1
    "#;
    sqlx::query(QUERY)
        .bind(id)
        .bind(amount)
        .bind(bidder_id)
        .bind(ends_at)
        .execute(ex)
        .await
        .map(|_| ())
}

pub async fn complete(
    ex: &mut PgConnection,
    id: AuctionId,
    winner_id: &str,
    final_price: i64,
    closed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
UPDATE auctions
SET status = 'completed', winner_id = $2, final_price = $3, closed_at = $4
WHERE id = $1
    "#;
    sqlx::query(QUERY)
        .bind(id)
        .bind(winner_id)
        .bind(final_price)
        .bind(closed_at)
        .execute(ex)
        .await
        .map(|_| ())
}

pub async fn cancel(
    ex: &mut PgConnection,
    id: AuctionId,
    closed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
UPDATE auctions
SET status = 'cancelled', closed_at = $2
WHERE id = $1
    "#;
    sqlx::query(QUERY)
        .bind(id)
        .bind(closed_at)
        .execute(ex)
        .await
        .map(|_| ())
}

/// Active auctions whose deadline has passed, oldest deadline first. Used by
/// the settlement loop.
pub async fn due(
    ex: &mut PgConnection,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<AuctionId>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT id FROM auctions
WHERE status = 'active' AND ends_at <= $1
ORDER BY ends_at ASC
LIMIT $2
    "#;
    let ids: Vec<(AuctionId,)> = sqlx::query_as(QUERY)
        .bind(now)
        .bind(limit)
        .fetch_all(ex)
        .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

#[derive(Clone, Debug, Default)]
pub struct Filter<'a> {
    pub card_id: Option<&'a str>,
    pub seller_id: Option<&'a str>,
    pub featured_only: bool,
}

const ACTIVE_FILTER: &str = r#"
WHERE status = 'active'
AND ($1::text IS NULL OR card_id = $1)
AND ($2::text IS NULL OR seller_id = $2)
AND (NOT $3 OR is_featured)
"#;

/// A page of active auctions, featured listings first, then soonest ending.
pub async fn active(
    ex: &mut PgConnection,
    filter: &Filter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Auction>, sqlx::Error> {
    const QUERY: &str = const_format::concatcp!(
        "SELECT * FROM auctions",
        ACTIVE_FILTER,
        "ORDER BY is_featured DESC, ends_at ASC LIMIT $4 OFFSET $5",
    );
    sqlx::query_as(QUERY)
        .bind(filter.card_id)
        .bind(filter.seller_id)
        .bind(filter.featured_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(ex)
        .await
}

pub async fn count_active(
    ex: &mut PgConnection,
    filter: &Filter<'_>,
) -> Result<i64, sqlx::Error> {
    const QUERY: &str =
        const_format::concatcp!("SELECT COUNT(*) FROM auctions", ACTIVE_FILTER);
    let (count,) = sqlx::query_as(QUERY)
        .bind(filter.card_id)
        .bind(filter.seller_id)
        .bind(filter.featured_only)
        .fetch_one(ex)
        .await?;
    Ok(count)
}

#[derive(Clone, Debug, Eq, PartialEq, sqlx::FromRow)]
pub struct Sale {
    pub card_id: String,
    pub final_price: i64,
    pub closed_at: DateTime<Utc>,
}

/// Completed sales since the given point in time, newest first. Feeds the
/// market trends aggregation.
pub async fn completed_sales(
    ex: &mut PgConnection,
    card_id: Option<&str>,
    since: DateTime<Utc>,
) -> Result<Vec<Sale>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT card_id, final_price, closed_at
FROM auctions
WHERE status = 'completed'
AND closed_at >= $2
AND ($1::text IS NULL OR card_id = $1)
ORDER BY closed_at DESC
    "#;
    sqlx::query_as(QUERY)
        .bind(card_id)
        .bind(since)
        .fetch_all(ex)
        .await
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, sqlx::Connection};

    fn listing(card: &str, seller: &str, ends_at: DateTime<Utc>) -> Listing {
        Listing {
            card_id: card.to_string(),
            seller_id: seller.to_string(),
            ask_price: 10,
            buyout_price: Some(50),
            ends_at,
            is_featured: false,
            created_at: ends_at - chrono::Duration::minutes(30),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_insert_roundtrip() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let ends_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let id = insert(&mut db, &listing("card-1", "seller", ends_at))
            .await
            .unwrap();
        let auction = single(&mut db, id).await.unwrap().unwrap();
        assert_eq!(auction.id, id);
        assert_eq!(auction.card_id, "card-1");
        assert_eq!(auction.status, AuctionStatus::Active);
        assert_eq!(auction.current_bid, auction.ask_price);
        assert_eq!(auction.current_bidder_id, None);
        assert_eq!(auction.ends_at, ends_at);
        assert_eq!(auction.closed_at, None);

        assert!(single(&mut db, id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_bid_and_complete() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let ends_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let id = insert(&mut db, &listing("card-1", "seller", ends_at))
            .await
            .unwrap();

        let extended = ends_at + chrono::Duration::minutes(1);
        record_bid(&mut db, id, 11, "bidder", extended).await.unwrap();
        let auction = single_for_update(&mut db, id).await.unwrap().unwrap();
        assert_eq!(auction.current_bid, 11);
        assert_eq!(auction.current_bidder_id.as_deref(), Some("bidder"));
        assert_eq!(auction.ends_at, extended);

        complete(&mut db, id, "bidder", 11, extended).await.unwrap();
        let auction = single(&mut db, id).await.unwrap().unwrap();
        assert_eq!(auction.status, AuctionStatus::Completed);
        assert_eq!(auction.winner_id.as_deref(), Some("bidder"));
        assert_eq!(auction.final_price, Some(11));
        assert_eq!(auction.closed_at, Some(extended));
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_due_and_cancel() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let early = insert(&mut db, &listing("card-1", "a", t0)).await.unwrap();
        let late = insert(
            &mut db,
            &listing("card-2", "b", t0 + chrono::Duration::minutes(30)),
        )
        .await
        .unwrap();

        assert_eq!(due(&mut db, t0, 10).await.unwrap(), vec![early]);
        let both = due(&mut db, t0 + chrono::Duration::hours(1), 10)
            .await
            .unwrap();
        assert_eq!(both, vec![early, late]);

        cancel(&mut db, early, t0).await.unwrap();
        assert_eq!(
            due(&mut db, t0 + chrono::Duration::hours(1), 10)
                .await
                .unwrap(),
            vec![late]
        );
        let auction = single(&mut db, early).await.unwrap().unwrap();
        assert_eq!(auction.status, AuctionStatus::Cancelled);
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_active_filters_and_pagination() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut featured = listing("card-1", "a", t0 + chrono::Duration::minutes(20));
        featured.is_featured = true;
        let featured = insert(&mut db, &featured).await.unwrap();
        let soon = insert(
            &mut db,
            &listing("card-2", "a", t0 + chrono::Duration::minutes(5)),
        )
        .await
        .unwrap();
        let later = insert(
            &mut db,
            &listing("card-1", "b", t0 + chrono::Duration::minutes(10)),
        )
        .await
        .unwrap();

        // Featured first, then by deadline.
        let all = active(&mut db, &Filter::default(), 10, 0).await.unwrap();
        let ids: Vec<_> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![featured, soon, later]);
        assert_eq!(count_active(&mut db, &Filter::default()).await.unwrap(), 3);

        let filter = Filter {
            card_id: Some("card-1"),
            ..Default::default()
        };
        let ids: Vec<_> = active(&mut db, &filter, 10, 0)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![featured, later]);
        assert_eq!(count_active(&mut db, &filter).await.unwrap(), 2);

        let filter = Filter {
            featured_only: true,
            ..Default::default()
        };
        let ids: Vec<_> = active(&mut db, &filter, 10, 0)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![featured]);

        let page = active(&mut db, &Filter::default(), 2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, later);
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_completed_sales_window() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let a = insert(&mut db, &listing("card-1", "a", t0)).await.unwrap();
        let b = insert(&mut db, &listing("card-2", "b", t0)).await.unwrap();
        complete(&mut db, a, "w", 100, t0).await.unwrap();
        complete(&mut db, b, "w", 200, t0 + chrono::Duration::hours(1))
            .await
            .unwrap();

        let sales = completed_sales(&mut db, None, t0).await.unwrap();
        assert_eq!(sales.len(), 2);
        // Newest first.
        assert_eq!(sales[0].final_price, 200);

        let sales = completed_sales(&mut db, Some("card-1"), t0).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].final_price, 100);

        let sales = completed_sales(&mut db, None, t0 + chrono::Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
    }
}
