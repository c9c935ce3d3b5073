use {
    chrono::{DateTime, Utc},
    std::{fmt, fmt::Display, net::SocketAddr},
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(clap::Parser)]
pub struct Arguments {
    #[clap(
        long,
        env,
        default_value = "warn,auction_house=debug,database=debug,settler=debug"
    )]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,

    /// Url of the Postgres database. By default connects to locally running
    /// postgres.
    #[clap(long, env, default_value = "postgresql://")]
    pub db_url: Url,

    /// Port on which /metrics and /liveness are served.
    #[clap(long, env, default_value_t = observe::metrics::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Simulation time shown at the moment the service anchors its clock.
    #[clap(long, env, default_value = "2040-01-01T00:00:00Z")]
    pub ix_epoch: DateTime<Utc>,

    /// Wall-clock instant at which the simulation showed `ix_epoch`.
    #[clap(long, env, default_value = "2026-01-01T00:00:00Z")]
    pub ix_anchor: DateTime<Utc>,

    /// How much faster simulation time runs than wall-clock time.
    #[clap(long, env, default_value = "4.0")]
    pub ix_multiplier: f64,

    /// Capacity of the in-process auction event channel. Events published
    /// while no subscriber keeps up are dropped.
    #[clap(long, env, default_value = "1024")]
    pub event_channel_capacity: usize,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            bind_address,
            db_url: _,
            metrics_port,
            ix_epoch,
            ix_anchor,
            ix_multiplier,
            event_channel_capacity,
        } = self;
        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "bind_address: {bind_address}")?;
        writeln!(f, "db_url: SECRET")?;
        writeln!(f, "metrics_port: {metrics_port}")?;
        writeln!(f, "ix_epoch: {ix_epoch}")?;
        writeln!(f, "ix_anchor: {ix_anchor}")?;
        writeln!(f, "ix_multiplier: {ix_multiplier}")?;
        writeln!(f, "event_channel_capacity: {event_channel_capacity}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn defaults_parse() {
        let args = Arguments::parse_from(["auction-house"]);
        assert_eq!(args.bind_address.port(), 8080);
        assert_eq!(args.metrics_port, observe::metrics::DEFAULT_METRICS_PORT);
        assert_eq!(args.ix_multiplier, 4.0);
        // The database url never ends up in the startup log.
        assert!(!args.to_string().contains("postgresql"));
    }

    #[test]
    fn clock_arguments_parse() {
        let args = Arguments::parse_from([
            "auction-house",
            "--ix-epoch",
            "2041-06-01T12:00:00Z",
            "--ix-multiplier",
            "2.0",
        ]);
        assert_eq!(args.ix_multiplier, 2.0);
        assert_eq!(args.ix_epoch.to_rfc3339(), "2041-06-01T12:00:00+00:00");
    }
}
