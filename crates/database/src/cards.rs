//! Card catalogue data the auction house touches. Only the recorded market
//! value matters here; everything else about a card lives elsewhere.

use sqlx::PgConnection;

pub async fn market_value(
    ex: &mut PgConnection,
    card_id: &str,
) -> Result<Option<i64>, sqlx::Error> {
    const QUERY: &str = "SELECT market_value FROM cards WHERE id = $1;";
    let row: Option<(i64,)> = sqlx::query_as(QUERY).bind(card_id).fetch_optional(ex).await?;
    Ok(row.map(|(value,)| value))
}

/// Records the latest sale price as the card's market value.
pub async fn set_market_value(
    ex: &mut PgConnection,
    card_id: &str,
    value: i64,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO cards (id, market_value)
VALUES ($1, $2)
ON CONFLICT (id) DO UPDATE SET market_value = $2
    "#;
    sqlx::query(QUERY)
        .bind(card_id)
        .bind(value)
        .execute(ex)
        .await
        .map(|_| ())
}
