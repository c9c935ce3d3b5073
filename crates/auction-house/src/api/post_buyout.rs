use {
    crate::{
        api::{AppState, error, internal_error_reply},
        auction_house::BuyoutError,
    },
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    model::{AuctionId, Credits, UserId, auction::Auction},
    serde::{Deserialize, Serialize},
    std::sync::Arc,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyoutRequest {
    pub buyer_id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuyoutResponse {
    auction: Auction,
    /// The house's cut of the sale.
    fee: Credits,
    /// What the seller received.
    proceeds: Credits,
}

pub async fn post_buyout_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AuctionId>,
    Json(request): Json<BuyoutRequest>,
) -> Response {
    match state
        .auction_house
        .execute_buyout(id, &request.buyer_id)
        .await
    {
        Ok(outcome) => Json(BuyoutResponse {
            auction: outcome.auction,
            fee: outcome.fee,
            proceeds: outcome.proceeds,
        })
        .into_response(),
        Err(err) => {
            tracing::debug!(auction = id, buyer = %request.buyer_id, ?err, "error executing buyout");
            err.into_response()
        }
    }
}

impl IntoResponse for BuyoutError {
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
            // An auction without a buyout price has no buyout resource to
            // address, so this is a 404 rather than a validation error.
            Self::NoBuyoutPrice => (
                StatusCode::NOT_FOUND,
                error("NoBuyoutPrice", "auction has no buyout price"),
            )
                .into_response(),
            Self::SelfBuyout => (
                StatusCode::BAD_REQUEST,
                error("SelfBuyout", "sellers cannot buy out their own auctions"),
            )
                .into_response(),
            Self::InsufficientBalance { amount } => (
                StatusCode::BAD_REQUEST,
                error(
                    "InsufficientBalance",
                    format!("insufficient balance to pay {amount} credits"),
                ),
            )
                .into_response(),
            Self::Database(err) => {
                tracing::error!(?err, "database error executing buyout");
                internal_error_reply()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::api::response_body};

    #[tokio::test]
    async fn buyout_error_statuses() {
        for err in [
            BuyoutError::SelfBuyout,
            BuyoutError::InsufficientBalance { amount: 200 },
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        for err in [BuyoutError::NotFound, BuyoutError::NoBuyoutPrice] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let response = BuyoutError::NotFound.into_response();
        let body = response_body(response).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errorType"], "AuctionNotFound");
    }
}
