pub mod arguments;
pub mod settlement_service;

use {
    auction_house::{
        auction_house::AuctionHouse,
        clock::IxClock,
        database::Postgres,
        events::BroadcastEvents,
    },
    settlement_service::SettlementService,
    std::sync::Arc,
};

pub async fn main(args: arguments::Arguments) {
    let postgres = Postgres::new(args.db_url.as_str()).expect("failed to create database");
    let clock = Arc::new(IxClock {
        epoch: args.ix_epoch,
        anchor: args.ix_anchor,
        multiplier: args.ix_multiplier,
    });
    let events = Arc::new(BroadcastEvents::default());
    let auction_house = Arc::new(AuctionHouse::new(Arc::new(postgres), clock, events));
    let settler = SettlementService::new(auction_house, args.max_batch_size);
    loop {
        tracing::debug!("starting a new settlement sweep");
        match settler.settle_all_due().await {
            Ok(0) => (),
            Ok(settled) => tracing::info!(settled, "settlement sweep finished"),
            Err(err) => tracing::error!(?err, "error while settling due auctions"),
        }
        tokio::time::sleep(args.settle_interval).await;
    }
}
