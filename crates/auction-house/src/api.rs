use {
    crate::auction_house::AuctionHouse,
    axum::{
        Router,
        extract::DefaultBodyLimit,
        http::{Request, StatusCode},
        middleware::{self, Next},
        response::{IntoResponse, Json, Response},
    },
    serde::{Deserialize, Serialize},
    std::{borrow::Cow, sync::Arc, time::Instant},
    tower_http::{cors::CorsLayer, trace::TraceLayer},
};

mod cancel_auction;
mod get_auction;
mod get_auctions;
mod get_bids;
mod get_market_trends;
mod post_auction;
mod post_bid;
mod post_buyout;
mod post_settle;
mod version;

/// Centralized application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    pub auction_house: Arc<AuctionHouse>,
}

/// Middleware that automatically tracks metrics using Axum's MatchedPath
async fn with_matched_path_metric(req: Request<axum::body::Body>, next: Next) -> Response {
    let metrics = ApiMetrics::instance(observe::metrics::get_storage_registry()).unwrap();

    let method = req.method().as_str();
    let matched_path = req
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or("unknown");

    // Label in format "METHOD /path"
    let label = format!("{method} {matched_path}");

    let timer = Instant::now();
    let response = next.run(req).await;
    let status = response.status();

    metrics.on_request_completed(&label, status, timer);
    if status.is_client_error() || status.is_server_error() {
        metrics
            .requests_rejected
            .with_label_values(&[status.as_str()])
            .inc();
    }

    response
}

const MAX_JSON_BODY_PAYLOAD: u64 = 1024 * 16;

pub fn handle_all_routes(auction_house: Arc<AuctionHouse>) -> Router {
    let state = Arc::new(AppState { auction_house });

    let metrics = ApiMetrics::instance(observe::metrics::get_storage_registry()).unwrap();
    metrics.reset_requests_rejected();

    let api_router = Router::new()
        .route(
            "/v1/auctions",
            axum::routing::post(post_auction::post_auction_handler)
                .merge(axum::routing::get(get_auctions::get_auctions_handler)),
        )
        .route(
            "/v1/auctions/{id}",
            axum::routing::get(get_auction::get_auction_handler)
                .merge(axum::routing::delete(cancel_auction::cancel_auction_handler)),
        )
        .route(
            "/v1/auctions/{id}/bids",
            axum::routing::post(post_bid::post_bid_handler)
                .merge(axum::routing::get(get_bids::get_bids_handler)),
        )
        .route(
            "/v1/auctions/{id}/buyout",
            axum::routing::post(post_buyout::post_buyout_handler),
        )
        .route(
            "/v1/auctions/{id}/settle",
            axum::routing::post(post_settle::post_settle_handler),
        )
        .route(
            "/v1/market/trends",
            axum::routing::get(get_market_trends::get_market_trends_handler),
        )
        .route("/v1/version", axum::routing::get(version::version_handler))
        .with_state(state)
        .layer(middleware::from_fn(with_matched_path_metric));

    finalize_router(api_router)
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "api")]
struct ApiMetrics {
    /// Number of completed API requests.
    #[metric(labels("method", "status_code"))]
    requests_complete: prometheus::IntCounterVec,

    /// Number of rejected API requests.
    #[metric(labels("status_code"))]
    requests_rejected: prometheus::IntCounterVec,

    /// Execution time for each API request.
    #[metric(labels("method"), buckets(0.1, 0.5, 1, 2, 4, 6, 8, 10))]
    requests_duration_seconds: prometheus::HistogramVec,
}

impl ApiMetrics {
    const INITIAL_STATUSES: &'static [StatusCode] = &[
        StatusCode::OK,
        StatusCode::CREATED,
        StatusCode::BAD_REQUEST,
        StatusCode::FORBIDDEN,
        StatusCode::NOT_FOUND,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::SERVICE_UNAVAILABLE,
    ];

    fn reset_requests_rejected(&self) {
        for status in Self::INITIAL_STATUSES {
            self.requests_rejected
                .with_label_values(&[status.as_str()])
                .reset();
        }
    }

    fn on_request_completed(&self, method: &str, status: StatusCode, timer: Instant) {
        self.requests_complete
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.requests_duration_seconds
            .with_label_values(&[method])
            .observe(timer.elapsed().as_secs_f64());
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    pub error_type: Cow<'static, str>,
    pub description: Cow<'static, str>,
}

pub fn error(error_type: &'static str, description: impl AsRef<str>) -> Json<Error> {
    Json(Error {
        error_type: error_type.into(),
        description: Cow::Owned(description.as_ref().to_owned()),
    })
}

pub fn internal_error_reply() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error("InternalServerError", ""),
    )
        .into_response()
}

/// Sets up basic metrics, cors and proper log tracing for all routes.
/// Takes a router with versioned routes and nests under /api, then applies
/// middleware.
fn finalize_router(api_router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(vec![
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(vec![
            axum::http::header::ORIGIN,
            axum::http::header::CONTENT_TYPE,
        ]);

    let trace_layer = TraceLayer::new_for_http();

    Router::new()
        .nest("/api", api_router)
        .layer(DefaultBodyLimit::max(MAX_JSON_BODY_PAYLOAD as usize))
        .layer(cors)
        .layer(trace_layer)
}

#[cfg(test)]
pub async fn response_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
