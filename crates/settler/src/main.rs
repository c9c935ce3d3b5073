use clap::Parser;

#[tokio::main]
async fn main() {
    let args = settler::arguments::Arguments::parse();
    observe::tracing::initialize(&args.log_filter, tracing::Level::ERROR.into());
    observe::metrics::setup_registry(Some("auction_settler".into()), None);
    tracing::info!("running settler with validated arguments:\n{}", args);
    settler::main(args).await;
}
