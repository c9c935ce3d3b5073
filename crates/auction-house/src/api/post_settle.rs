use {
    crate::{
        api::{AppState, internal_error_reply},
        auction_house::SettlementOutcome,
    },
    axum::{
        Json,
        extract::{Path, State},
        response::{IntoResponse, Response},
    },
    model::{AuctionId, auction::Auction},
    serde::Serialize,
    std::sync::Arc,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettlementResponse {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auction: Option<Auction>,
}

/// Settles an expired auction on demand. The settler loop calls the same
/// engine operation; this endpoint exists so settlement can also be nudged
/// manually. It is idempotent.
pub async fn post_settle_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AuctionId>,
) -> Response {
    match state.auction_house.settle_auction(id).await {
        Ok(outcome) => {
            let response = match outcome {
                SettlementOutcome::Sold { auction, .. } => SettlementResponse {
                    outcome: "SOLD",
                    auction: Some(auction),
                },
                SettlementOutcome::ReturnedUnsold { auction } => SettlementResponse {
                    outcome: "RETURNED_UNSOLD",
                    auction: Some(auction),
                },
                SettlementOutcome::Skipped => SettlementResponse {
                    outcome: "SKIPPED",
                    auction: None,
                },
                SettlementOutcome::NotDue => SettlementResponse {
                    outcome: "NOT_DUE",
                    auction: None,
                },
            };
            Json(response).into_response()
        }
        Err(err) => {
            tracing::error!(auction = id, ?err, "database error settling auction");
            internal_error_reply()
        }
    }
}
