//! Card ownership units keyed by (user, card) with a quantity and a lock
//! flag. The lock is the mutual-exclusion primitive that keeps a unit from
//! being auctioned, traded or gifted twice at the same time; every subsystem
//! that moves cards must respect it.

use {crate::PgTransaction, sqlx::PgConnection};

#[derive(Clone, Debug, Default, Eq, PartialEq, sqlx::FromRow)]
pub struct Ownership {
    pub user_id: String,
    pub card_id: String,
    pub quantity: i64,
    pub is_locked: bool,
}

pub async fn single(
    ex: &mut PgConnection,
    user_id: &str,
    card_id: &str,
) -> Result<Option<Ownership>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT * FROM ownerships
WHERE user_id = $1 AND card_id = $2
    "#;
    sqlx::query_as(QUERY)
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(ex)
        .await
}

/// Like [`single`] but takes a row lock for the surrounding transaction so
/// listing and transfer cannot race on the same unit.
pub async fn single_for_update(
    ex: &mut PgConnection,
    user_id: &str,
    card_id: &str,
) -> Result<Option<Ownership>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT * FROM ownerships
WHERE user_id = $1 AND card_id = $2
FOR UPDATE
    "#;
    sqlx::query_as(QUERY)
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(ex)
        .await
}

/// Adds `delta` units to the (user, card) row, creating it if needed.
pub async fn add_quantity(
    ex: &mut PgConnection,
    user_id: &str,
    card_id: &str,
    delta: i64,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO ownerships (user_id, card_id, quantity)
VALUES ($1, $2, $3)
ON CONFLICT (user_id, card_id) DO UPDATE
SET quantity = ownerships.quantity + $3
    "#;
    sqlx::query(QUERY)
        .bind(user_id)
        .bind(card_id)
        .bind(delta)
        .execute(ex)
        .await
        .map(|_| ())
}

/// Sets the lock flag. Returns false when the row does not exist.
pub async fn set_locked(
    ex: &mut PgConnection,
    user_id: &str,
    card_id: &str,
    locked: bool,
) -> Result<bool, sqlx::Error> {
    const QUERY: &str = r#"
UPDATE ownerships
SET is_locked = $3
WHERE user_id = $1 AND card_id = $2
    "#;
    let result = sqlx::query(QUERY)
        .bind(user_id)
        .bind(card_id)
        .bind(locked)
        .execute(ex)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Moves one unit from seller to buyer and clears the seller's lock. The
/// seller row keeps existing with quantity 0 so the audit trail of the pair
/// stays queryable.
pub async fn transfer_unit(
    ex: &mut PgTransaction<'_>,
    from: &str,
    to: &str,
    card_id: &str,
) -> Result<(), sqlx::Error> {
    const DEBIT: &str = r#"
UPDATE ownerships
SET quantity = quantity - 1, is_locked = false
WHERE user_id = $1 AND card_id = $2 AND quantity >= 1
    "#;
    let result = sqlx::query(DEBIT)
        .bind(from)
        .bind(card_id)
        .execute(&mut **ex)
        .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    add_quantity(ex, to, card_id, 1).await
}

#[cfg(test)]
mod tests {
    use {super::*, sqlx::Connection};

    #[tokio::test]
    #[ignore]
    async fn postgres_lock_roundtrip() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        add_quantity(&mut db, "alice", "card-1", 2).await.unwrap();
        let unit = single(&mut db, "alice", "card-1").await.unwrap().unwrap();
        assert_eq!(unit.quantity, 2);
        assert!(!unit.is_locked);

        assert!(set_locked(&mut db, "alice", "card-1", true).await.unwrap());
        let unit = single_for_update(&mut db, "alice", "card-1")
            .await
            .unwrap()
            .unwrap();
        assert!(unit.is_locked);

        // Unknown rows report failure instead of silently doing nothing.
        assert!(!set_locked(&mut db, "alice", "card-2", true).await.unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_transfer_unit() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        add_quantity(&mut db, "seller", "card-1", 1).await.unwrap();
        set_locked(&mut db, "seller", "card-1", true).await.unwrap();

        transfer_unit(&mut db, "seller", "buyer", "card-1")
            .await
            .unwrap();

        let seller = single(&mut db, "seller", "card-1").await.unwrap().unwrap();
        assert_eq!(seller.quantity, 0);
        assert!(!seller.is_locked);
        let buyer = single(&mut db, "buyer", "card-1").await.unwrap().unwrap();
        assert_eq!(buyer.quantity, 1);
        assert!(!buyer.is_locked);

        // A second transfer has nothing left to move.
        let err = transfer_unit(&mut db, "seller", "buyer", "card-1").await;
        assert!(matches!(err, Err(sqlx::Error::RowNotFound)));
    }
}
