use {
    crate::{
        api::{AppState, error, internal_error_reply},
        auction_house::CancelError,
    },
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    model::{AuctionId, UserId},
    serde::Deserialize,
    std::sync::Arc,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequest {
    pub seller_id: UserId,
}

pub async fn cancel_auction_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AuctionId>,
    Json(request): Json<CancellationRequest>,
) -> Response {
    match state
        .auction_house
        .cancel_auction(id, &request.seller_id)
        .await
    {
        Ok(auction) => Json(auction).into_response(),
        Err(err) => {
            tracing::debug!(auction = id, seller = %request.seller_id, ?err, "error cancelling auction");
            err.into_response()
        }
    }
}

impl IntoResponse for CancelError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                error("AuctionNotFound", "auction not found"),
            )
                .into_response(),
            Self::NotSeller => (
                StatusCode::FORBIDDEN,
                error("NotSeller", "only the seller may cancel an auction"),
            )
                .into_response(),
            Self::NotActive => (
                StatusCode::BAD_REQUEST,
                error("AuctionNotActive", "auction is no longer active"),
            )
                .into_response(),
            Self::HasBids => (
                StatusCode::BAD_REQUEST,
                error("AuctionHasBids", "auctions with bids cannot be cancelled"),
            )
                .into_response(),
            Self::Database(err) => {
                tracing::error!(?err, "database error cancelling auction");
                internal_error_reply()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_by_stranger_is_forbidden() {
        let response = CancelError::NotSeller.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = CancelError::HasBids.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
