use {
    crate::api::{AppState, error, internal_error_reply},
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    model::AuctionId,
    std::sync::Arc,
};

pub async fn get_auction_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AuctionId>,
) -> Response {
    match state.auction_house.get_auction(id).await {
        Ok(Some(auction)) => Json(auction).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error("AuctionNotFound", "auction not found"),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(auction = id, ?err, "database error fetching auction");
            internal_error_reply()
        }
    }
}
