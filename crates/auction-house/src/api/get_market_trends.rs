use {
    crate::api::{AppState, internal_error_reply},
    axum::{
        Json,
        extract::{Query, State},
        response::{IntoResponse, Response},
    },
    model::{CardId, market::TimeRange},
    serde::Deserialize,
    std::sync::Arc,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrendsQuery {
    pub card_id: Option<CardId>,
    pub time_range: Option<TimeRange>,
}

pub async fn get_market_trends_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarketTrendsQuery>,
) -> Response {
    let range = query.time_range.unwrap_or(TimeRange::Day);
    match state
        .auction_house
        .market_trends(query.card_id.as_ref(), range)
        .await
    {
        Ok(trends) => Json(trends).into_response(),
        Err(err) => {
            tracing::error!(card = ?query.card_id, ?err, "database error computing trends");
            internal_error_reply()
        }
    }
}
