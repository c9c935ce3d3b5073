use {
    chrono::{DateTime, Utc},
    clap::Parser,
    std::time::Duration,
    url::Url,
};

#[derive(Parser)]
pub struct Arguments {
    #[clap(
        long,
        env,
        default_value = "warn,settler=debug,auction_house=debug,database=debug"
    )]
    pub log_filter: String,

    /// Url of the Postgres database. By default connects to locally running
    /// postgres.
    #[clap(long, env, default_value = "postgresql://")]
    pub db_url: Url,

    /// Pause between settlement sweeps. Expired auctions are settled at most
    /// this long after their deadline.
    #[clap(
        long,
        env,
        default_value = "10s",
        value_parser = humantime::parse_duration,
    )]
    pub settle_interval: Duration,

    /// Maximum number of due auctions settled per sweep.
    #[clap(long, env, default_value = "50")]
    pub max_batch_size: i64,

    /// Simulation time shown at the moment the service anchors its clock.
    #[clap(long, env, default_value = "2040-01-01T00:00:00Z")]
    pub ix_epoch: DateTime<Utc>,

    /// Wall-clock instant at which the simulation showed `ix_epoch`.
    #[clap(long, env, default_value = "2026-01-01T00:00:00Z")]
    pub ix_anchor: DateTime<Utc>,

    /// How much faster simulation time runs than wall-clock time.
    #[clap(long, env, default_value = "4.0")]
    pub ix_multiplier: f64,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "log_filter: {}", self.log_filter)?;
        writeln!(f, "db_url: SECRET")?;
        writeln!(f, "settle_interval: {:?}", self.settle_interval)?;
        writeln!(f, "max_batch_size: {}", self.max_batch_size)?;
        writeln!(f, "ix_epoch: {}", self.ix_epoch)?;
        writeln!(f, "ix_anchor: {}", self.ix_anchor)?;
        writeln!(f, "ix_multiplier: {}", self.ix_multiplier)?;
        Ok(())
    }
}
