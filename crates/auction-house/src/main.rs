use {
    auction_house::{
        auction_house::AuctionHouse,
        clock::IxClock,
        database::Postgres,
        events::BroadcastEvents,
    },
    clap::Parser,
    observe::metrics::serve_metrics,
    std::{sync::Arc, time::Duration},
};

#[tokio::main]
async fn main() {
    let args = auction_house::arguments::Arguments::parse();
    observe::tracing::initialize(&args.log_filter, args.log_stderr_threshold);
    tracing::info!("running auction house with validated arguments:\n{}", args);

    observe::metrics::setup_registry(Some("auction_house".into()), None);

    let postgres = Postgres::new(args.db_url.as_str()).expect("failed to create database");
    let clock = Arc::new(IxClock {
        epoch: args.ix_epoch,
        anchor: args.ix_anchor,
        multiplier: args.ix_multiplier,
    });
    let events = Arc::new(BroadcastEvents::new(args.event_channel_capacity));
    let auction_house = Arc::new(AuctionHouse::new(Arc::new(postgres), clock, events));
    check_database_connection(&auction_house).await;

    let (shutdown_sender, shutdown_receiver) = tokio::sync::oneshot::channel();
    let serve_api = auction_house::serve_api(auction_house.clone(), args.bind_address, async {
        let _ = shutdown_receiver.await;
    });

    let mut metrics_address = args.bind_address;
    metrics_address.set_port(args.metrics_port);
    let metrics_task = serve_metrics(auction_house, metrics_address);

    futures::pin_mut!(serve_api);
    tokio::select! {
        result = &mut serve_api => tracing::error!(?result, "API task exited"),
        result = metrics_task => tracing::error!(?result, "metrics task exited"),
        _ = shutdown_signal() => {
            tracing::info!("Gracefully shutting down API");
            shutdown_sender.send(()).expect("failed to send shutdown signal");
            match tokio::time::timeout(Duration::from_secs(10), serve_api).await {
                Ok(inner) => inner.expect("API failed during shutdown"),
                Err(_) => tracing::error!("API shutdown exceeded timeout"),
            }
        }
    };
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept main signals for graceful shutdown
    // Kubernetes sends sigterm, whereas locally sigint (ctrl-c) is most common
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .unwrap()
            .recv()
            .await
    };
    let sigint = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .unwrap()
            .recv()
            .await;
    };
    futures::pin_mut!(sigint);
    futures::pin_mut!(sigterm);
    futures::future::select(sigterm, sigint).await;
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on windows
    std::future::pending().await
}

async fn check_database_connection(auction_house: &AuctionHouse) {
    auction_house
        .get_auction(0)
        .await
        .expect("failed to connect to database");
}
