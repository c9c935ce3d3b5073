use {
    crate::{
        api::{AppState, error, internal_error_reply},
        auction_house::PlaceBidError,
    },
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    model::{AuctionId, auction::Auction, bid::BidRequest},
    serde::Serialize,
    std::sync::Arc,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BidResponse {
    auction: Auction,
    /// Whether the anti-snipe rule pushed the deadline.
    extended: bool,
    is_snipe: bool,
}

pub async fn post_bid_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AuctionId>,
    Json(request): Json<BidRequest>,
) -> Response {
    match state
        .auction_house
        .place_bid(id, &request.bidder_id, request.amount)
        .await
    {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(BidResponse {
                auction: outcome.auction,
                extended: outcome.extended,
                is_snipe: outcome.is_snipe,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::debug!(auction = id, ?request, ?err, "error placing bid");
            err.into_response()
        }
    }
}

impl IntoResponse for PlaceBidError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                error("AuctionNotFound", "auction not found"),
            )
                .into_response(),
            Self::NotActive => (
                StatusCode::BAD_REQUEST,
                error("AuctionNotActive", "auction is no longer active"),
            )
                .into_response(),
            Self::Expired => (
                StatusCode::BAD_REQUEST,
                error("AuctionExpired", "auction has already ended"),
            )
                .into_response(),
            Self::SelfBid => (
                StatusCode::BAD_REQUEST,
                error("SelfBid", "sellers cannot bid on their own auctions"),
            )
                .into_response(),
            Self::BidTooLow { minimum } => (
                StatusCode::BAD_REQUEST,
                error(
                    "BidTooLow",
                    format!("bid must be at least {minimum} credits"),
                ),
            )
                .into_response(),
            Self::InsufficientBalance { amount } => (
                StatusCode::BAD_REQUEST,
                error(
                    "InsufficientBalance",
                    format!("insufficient balance to reserve {amount} credits"),
                ),
            )
                .into_response(),
            Self::Database(err) => {
                tracing::error!(?err, "database error placing bid");
                internal_error_reply()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::api::response_body};

    #[tokio::test]
    async fn bid_too_low_reports_the_minimum() {
        let response = PlaceBidError::BidTooLow { minimum: 11 }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_body(response).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errorType"], "BidTooLow");
        assert_eq!(json["description"], "bid must be at least 11 credits");
    }

    #[tokio::test]
    async fn missing_auction_is_not_found() {
        let response = PlaceBidError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
