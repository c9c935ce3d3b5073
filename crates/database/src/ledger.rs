//! Credit (IxC) ledger operations the auction engine composes into its own
//! transactions. Balances are NUMERIC because fee refunds can be fractional
//! (half of a 5 credit listing fee); prices and bids stay whole credits.
//!
//! Every movement writes an append-only `ledger_entries` audit row with a
//! category and a human-readable reason.

use {
    crate::PgTransaction,
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
};

pub async fn balance(ex: &mut PgConnection, user_id: &str) -> Result<BigDecimal, sqlx::Error> {
    const QUERY: &str = "SELECT amount FROM balances WHERE user_id = $1;";
    let row: Option<(BigDecimal,)> = sqlx::query_as(QUERY)
        .bind(user_id)
        .fetch_optional(ex)
        .await?;
    Ok(row.map(|(amount,)| amount).unwrap_or_default())
}

/// Debits `amount` from the user if and only if the balance covers it.
/// Returns whether the debit happened; an uncovered debit leaves the ledger
/// untouched and must abort the caller's transaction if partial effects were
/// already applied.
pub async fn spend(
    ex: &mut PgTransaction<'_>,
    user_id: &str,
    amount: &BigDecimal,
    category: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    const QUERY: &str = r#"
UPDATE balances
SET amount = amount - $2
WHERE user_id = $1 AND amount >= $2
    "#;
    let result = sqlx::query(QUERY)
        .bind(user_id)
        .bind(amount)
        .execute(&mut **ex)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    append_entry(ex, user_id, &-amount.clone(), category, reason, now).await?;
    Ok(true)
}

/// Credits `amount` to the user, creating the balance row if needed.
/// Returns the new balance.
pub async fn earn(
    ex: &mut PgTransaction<'_>,
    user_id: &str,
    amount: &BigDecimal,
    category: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<BigDecimal, sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO balances (user_id, amount)
VALUES ($1, $2)
ON CONFLICT (user_id) DO UPDATE
SET amount = balances.amount + $2
RETURNING amount
    "#;
    let (new_balance,) = sqlx::query_as(QUERY)
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut **ex)
        .await?;
    append_entry(ex, user_id, amount, category, reason, now).await?;
    Ok(new_balance)
}

async fn append_entry(
    ex: &mut PgConnection,
    user_id: &str,
    amount: &BigDecimal,
    category: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO ledger_entries (user_id, amount, category, reason, created_at)
VALUES ($1, $2, $3, $4, $5)
    "#;
    sqlx::query(QUERY)
        .bind(user_id)
        .bind(amount)
        .bind(category)
        .bind(reason)
        .bind(now)
        .execute(ex)
        .await
        .map(|_| ())
}
