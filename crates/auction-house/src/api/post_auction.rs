use {
    crate::{
        api::{AppState, error, internal_error_reply},
        auction_house::CreateAuctionError,
    },
    axum::{
        Json,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    model::auction::AuctionCreation,
    std::sync::Arc,
};

pub async fn post_auction_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuctionCreation>,
) -> Response {
    match state.auction_house.create_auction(&request).await {
        Ok(auction) => (StatusCode::CREATED, Json(auction)).into_response(),
        Err(err) => {
            tracing::debug!(?request, ?err, "error creating auction");
            err.into_response()
        }
    }
}

impl IntoResponse for CreateAuctionError {
    fn into_response(self) -> Response {
        match self {
            Self::NotOwned => (
                StatusCode::FORBIDDEN,
                error(
                    "CardNotOwned",
                    "seller does not own an available copy of this card",
                ),
            )
                .into_response(),
            Self::AlreadyListed => (
                StatusCode::BAD_REQUEST,
                error(
                    "AlreadyListed",
                    "seller already has an active listing for this card",
                ),
            )
                .into_response(),
            Self::InvalidStartingPrice => (
                StatusCode::BAD_REQUEST,
                error(
                    "InvalidStartingPrice",
                    "starting price must be at least 1 credit",
                ),
            )
                .into_response(),
            Self::InvalidBuyoutPrice => (
                StatusCode::BAD_REQUEST,
                error(
                    "InvalidBuyoutPrice",
                    "buyout price must be greater than the starting price",
                ),
            )
                .into_response(),
            Self::InsufficientFee { required } => (
                StatusCode::BAD_REQUEST,
                error(
                    "InsufficientBalance",
                    format!("insufficient balance for the {required} credit listing fee"),
                ),
            )
                .into_response(),
            Self::Database(err) => {
                tracing::error!(?err, "database error creating auction");
                internal_error_reply()
            }
        }
    }
}
