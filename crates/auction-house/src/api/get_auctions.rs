use {
    crate::api::{AppState, internal_error_reply},
    axum::{
        Json,
        extract::{Query, State},
        response::{IntoResponse, Response},
    },
    model::{
        CardId, UserId,
        auction::AuctionFilter,
    },
    serde::Deserialize,
    std::sync::Arc,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAuctionsQuery {
    pub card_id: Option<CardId>,
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub featured_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

pub async fn get_auctions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActiveAuctionsQuery>,
) -> Response {
    let filter = AuctionFilter {
        card_id: query.card_id,
        seller_id: query.seller_id,
        featured_only: query.featured_only,
    };
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.max(0);
    match state
        .auction_house
        .active_auctions(&filter, limit, offset)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(err) => {
            tracing::error!(?err, "database error listing auctions");
            internal_error_reply()
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, axum::http::Uri};

    fn parse(uri: &str) -> ActiveAuctionsQuery {
        let uri: Uri = uri.parse().unwrap();
        let Query(query) = Query::try_from_uri(&uri).unwrap();
        query
    }

    #[test]
    fn query_defaults() {
        let query = parse("/api/v1/auctions");
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert!(!query.featured_only);
        assert!(query.card_id.is_none());

        let query = parse("/api/v1/auctions?cardId=card-1&featuredOnly=true&limit=5&offset=10");
        assert_eq!(query.card_id, Some("card-1".into()));
        assert!(query.featured_only);
        assert_eq!(query.limit, 5);
        assert_eq!(query.offset, 10);
    }
}
