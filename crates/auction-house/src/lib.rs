pub mod api;
pub mod arguments;
pub mod auction_house;
pub mod clock;
pub mod database;
pub mod domain;
pub mod events;

use {
    crate::auction_house::AuctionHouse,
    anyhow::{Context, Result},
    std::{future::Future, net::SocketAddr, sync::Arc},
};

/// Serves the auction API on `address` until `shutdown_receiver` resolves,
/// then finishes in-flight requests before returning.
pub async fn serve_api(
    auction_house: Arc<AuctionHouse>,
    address: SocketAddr,
    shutdown_receiver: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = api::handle_all_routes(auction_house);
    tracing::info!(%address, "serving auction api");
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .context("failed to bind api address")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_receiver)
        .await
        .context("api server failed")
}
