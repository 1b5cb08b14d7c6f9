use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stbl_common::cache::Expirable;
use stbl_common::concurrency::Sequencer;
use stbl_common::service::{Error as ServiceError, Service};
use stbl_common::{service_debug, service_warn};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::{Client, Error, PriceSnapshot, SymbolPrice};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Result of a single poll. Failures are absorbed here and never reach the caller
/// as an error; the previous snapshot is kept as is.
#[derive(Debug)]
pub enum PollOutcome {
    Updated,
    Retained(Error),
    /// A poll issued later already applied its snapshot
    Outdated,
}

struct FeedState {
    snapshot: Expirable<PriceSnapshot>,
    applied: u64,
}

/// Last known prices of the ticker symbols.
#[derive(Clone)]
pub struct PriceFeed {
    client: Client,
    period: Duration,

    polls: Sequencer,
    state: Arc<RwLock<FeedState>>,
    // Ticket of the last applied poll
    updates: Arc<watch::Sender<u64>>,
}

impl PriceFeed {
    pub fn new(client: Client, period: Duration) -> Self {
        // A snapshot turns stale once a scheduled poll is missed, with half a period of grace
        // for the poll in flight
        let validity = period + period / 2;

        Self {
            client,
            period,

            polls: Sequencer::new(),
            state: Arc::new(RwLock::new(FeedState {
                snapshot: Expirable::empty(validity),
                applied: 0,
            })),
            updates: Arc::new(watch::Sender::new(0)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Notified every time a poll replaces the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub async fn poll(&self) -> PollOutcome {
        let ticket = self.polls.advance();

        let snapshot = match self.client.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return PollOutcome::Retained(e),
        };

        let mut state = self.state.write().await;
        if ticket <= state.applied {
            return PollOutcome::Outdated;
        }

        state.applied = ticket;
        state.snapshot.refresh_with(snapshot);
        self.updates.send_replace(ticket);

        PollOutcome::Updated
    }

    pub async fn snapshot(&self) -> PriceSnapshot {
        (*self.state.read().await.snapshot).clone()
    }

    pub async fn price(&self, symbol: &str) -> Option<SymbolPrice> {
        self.state.read().await.snapshot.get(symbol)
    }

    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.snapshot.updated_at
    }

    /// Returns true if no poll succeeded recently, including before the first success.
    pub async fn is_stale(&self) -> bool {
        self.state.read().await.snapshot.is_stale()
    }
}

#[derive(Clone)]
pub struct PriceFeedContext {
    pub feed: PriceFeed,
}

pub struct PriceFeedService {
    feed: PriceFeed,
    polls: JoinSet<()>,
}

#[async_trait]
impl Service for PriceFeedService {
    type Context = PriceFeedContext;

    const NAME: &'static str = "PriceFeed";

    async fn new(context: PriceFeedContext) -> Self {
        Self {
            feed: context.feed,
            polls: JoinSet::new(),
        }
    }

    async fn run(mut self) -> Result<(), ServiceError> {
        // First tick completes immediately. Polls are spawned so a slow poll never
        // delays the next tick.
        let mut ticker = time::interval(self.feed.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let feed = self.feed.clone();
                    self.polls.spawn(async move {
                        match feed.poll().await {
                            PollOutcome::Updated => {
                                service_debug!("price snapshot updated");
                            },
                            PollOutcome::Retained(e) => {
                                service_warn!("price poll failed, keeping previous snapshot: {}", e);
                            },
                            PollOutcome::Outdated => {
                                service_debug!("discarding outdated price snapshot");
                            },
                        }
                    });
                },
                Some(_) = self.polls.join_next() => {},
            }
        }
    }
}
