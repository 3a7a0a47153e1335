//! Bridge orchestration
//!
//! One task owns the ingress socket and the tracker, and multiplexes socket
//! reads with the expiry tick. Tracker mutations are therefore serialized
//! without a lock. Render commands leave through the dispatcher, which never
//! makes the socket loop wait.

use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::error::Result;
use crate::ingress::Ingress;
use crate::normalizer::{Normalizer, RowStrategy};
use crate::stats::{BridgeStats, StatsSnapshot};
use crate::tracker::Tracker;
use bridge_config::BridgeConfig;
use message_sink::CommandSink;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

pub struct Bridge {
    ingress: Ingress,
    tracker: Tracker,
    dispatcher: DispatcherHandle,
    stats: Arc<BridgeStats>,
    poll_interval: Duration,
    stats_interval: Option<Duration>,
}

impl Bridge {
    /// Validate `config`, bind the ingress socket and start the dispatcher
    pub async fn bind(config: &BridgeConfig, sink: Arc<dyn CommandSink>) -> Result<Self> {
        config.validate()?;

        let keys = config.streams.key_range()?;
        let stats = Arc::new(BridgeStats::new());

        let normalizer = Normalizer::new(
            config.ingress.address.clone(),
            keys,
            RowStrategy::from(&config.normalizer),
        );
        let ingress = Ingress::bind(
            config.ingress.socket_addr()?,
            config.ingress.buffer_size,
            normalizer,
            stats.clone(),
        )
        .await?;

        let dispatcher = Dispatcher::spawn(sink, &config.dispatcher, stats.clone());

        let stats_interval = match config.logging.stats_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        info!(
            keys = %keys,
            poll_ms = config.tracker.expiry_poll_ms,
            queue = config.dispatcher.queue_capacity,
            "Bridge ready"
        );

        Ok(Self {
            ingress,
            tracker: Tracker::new(keys),
            dispatcher,
            stats,
            poll_interval: config.tracker.poll_interval(),
            stats_interval,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.ingress.local_addr()
    }

    pub fn stats(&self) -> Arc<BridgeStats> {
        self.stats.clone()
    }

    /// Run until `shutdown` completes
    ///
    /// The socket closes on return. Highlights still on screen are not
    /// cleared and queued commands are not flushed.
    pub async fn run<F>(self, shutdown: F) -> Result<StatsSnapshot>
    where
        F: Future<Output = ()>,
    {
        let Self {
            mut ingress,
            mut tracker,
            dispatcher,
            stats,
            poll_interval,
            stats_interval,
        } = self;

        let mut expiry = interval(poll_interval);
        expiry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut report = interval(stats_interval.unwrap_or(Duration::from_secs(3600)));
        report.set_missed_tick_behavior(MissedTickBehavior::Skip);
        report.tick().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }

                received = ingress.recv() => match received {
                    Ok((datagram, from)) => {
                        let now = Instant::now().into_std();
                        for command in ingress.process(&datagram, from, now, &mut tracker) {
                            dispatcher.emit(command);
                        }
                    }
                    Err(e) => {
                        stats.record_recv_error();
                        warn!("Receive failed, continuing: {}", e);
                    }
                },

                _ = expiry.tick() => {
                    let now = Instant::now().into_std();
                    for command in tracker.expire(now) {
                        dispatcher.emit(command);
                    }
                }

                _ = report.tick(), if stats_interval.is_some() => {
                    stats.log_summary();
                }
            }
        }

        drop(ingress);
        if !tracker.is_empty() {
            info!(active = tracker.len(), "Leaving active highlights in place");
        }
        dispatcher.shutdown().await;

        stats.log_summary();
        Ok(stats.snapshot())
    }
}
