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

pub async fn get_bids_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AuctionId>,
) -> Response {
    let auction = match state.auction_house.get_auction(id).await {
        Ok(Some(auction)) => auction,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error("AuctionNotFound", "auction not found"),
            )
                .into_response();
        }
        Err(err) => {
            tracing::error!(auction = id, ?err, "database error fetching auction");
            return internal_error_reply();
        }
    };
    match state.auction_house.auction_bids(auction.id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(err) => {
            tracing::error!(auction = id, ?err, "database error fetching bids");
            internal_error_reply()
        }
    }
}
