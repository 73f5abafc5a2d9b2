use crate::client::Transport;
use crate::error::{DecodeError, EntityKind, FetchError};
use crate::fetch::ExplorerApi;
use crate::types::pool_from_transactions;
use crate::view_model::{Epoch, ViewModel};
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

/// Timer abstraction driving the poller
#[async_trait]
pub trait Ticker: Send + 'static {
    /// Wait for the next tick; `false` once the ticker can never fire again
    async fn tick(&mut self) -> bool;
}

/// Wall-clock ticker. The first tick fires immediately so the view fills on start.
pub struct IntervalTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        let period = self.period;
        let timer = self.interval.get_or_insert_with(|| {
            let mut i = interval(period);
            i.set_missed_tick_behavior(MissedTickBehavior::Skip);
            i
        });
        timer.tick().await;
        true
    }
}

/// Ticker fired by hand through a [`TickHandle`]
pub struct ManualTicker {
    rx: UnboundedReceiver<()>,
}

#[derive(Clone)]
pub struct TickHandle {
    tx: UnboundedSender<()>,
}

impl TickHandle {
    /// Fire one tick; `false` if the ticker is gone
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

pub fn manual_ticker() -> (TickHandle, ManualTicker) {
    let (tx, rx) = unbounded_channel();
    (TickHandle { tx }, ManualTicker { rx })
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// What to do when a tick fires while the previous one is still fetching
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Drop the new tick
    #[default]
    Skip,
    /// Issue the new fetches anyway
    Allow,
}

impl std::str::FromStr for OverlapPolicy {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(OverlapPolicy::Skip),
            "allow" => Ok(OverlapPolicy::Allow),
            _ => Err(anyhow!("Invalid overlap policy '{s}'. Valid options: skip, allow")),
        }
    }
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlapPolicy::Skip => write!(f, "skip"),
            OverlapPolicy::Allow => write!(f, "allow"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Active,
}

/// Result of one half of a tick
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Snapshot replaced; `rejected` elements failed to decode and were left out
    Applied { items: usize, rejected: usize },
    /// Fetch finished after the poller was stopped
    Discarded,
    /// Previous snapshot kept
    Failed(FetchError),
}

/// Sent to the observer once both halves of a tick have finished
#[derive(Clone, Debug, PartialEq)]
pub struct PollReport {
    pub tick: u64,
    pub blocks: TickOutcome,
    pub pool: TickOutcome,
}

struct TickContext<T> {
    api: Arc<ExplorerApi<T>>,
    view: ViewModel,
    epoch: Epoch,
    generation: u64,
    overlap: OverlapPolicy,
    in_flight: AtomicUsize,
    reports: Option<UnboundedSender<PollReport>>,
}

/// Periodically refreshes the chain summary and pending pool in the view model
pub struct Poller<T> {
    api: Arc<ExplorerApi<T>>,
    view: ViewModel,
    overlap: OverlapPolicy,
    reports: Option<UnboundedSender<PollReport>>,
    epoch: Epoch,
    task: Option<JoinHandle<()>>,
}

impl<T: Transport> Poller<T> {
    pub fn new(api: Arc<ExplorerApi<T>>, view: ViewModel) -> Self {
        Self {
            api,
            view,
            overlap: OverlapPolicy::default(),
            reports: None,
            epoch: Epoch::default(),
            task: None,
        }
    }

    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Receive a [`PollReport`] after every finished tick
    pub fn with_reports(mut self, reports: UnboundedSender<PollReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn state(&self) -> PollerState {
        if self.task.is_some() {
            PollerState::Active
        } else {
            PollerState::Idle
        }
    }

    /// `idle -> active`; a no-op when already active
    pub fn start<K: Ticker>(&mut self, ticker: K) {
        if self.task.is_some() {
            log::debug!("poller already active");
            return;
        }
        let generation = self.epoch.advance();
        let ctx = Arc::new(TickContext {
            api: self.api.clone(),
            view: self.view.clone(),
            epoch: self.epoch.clone(),
            generation,
            overlap: self.overlap,
            in_flight: AtomicUsize::new(0),
            reports: self.reports.clone(),
        });
        log::info!("poller started (overlap: {})", self.overlap);
        self.task = Some(tokio::spawn(run_ticks(ctx, ticker)));
    }

    /// `active -> idle`. In-flight fetches may still finish; their results are dropped.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            self.epoch.advance();
            task.abort();
            log::info!("poller stopped");
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.epoch.advance();
            task.abort();
        }
    }
}

async fn run_ticks<T: Transport, K: Ticker>(ctx: Arc<TickContext<T>>, mut ticker: K) {
    let mut tick: u64 = 0;
    while ticker.tick().await {
        if !ctx.epoch.is_current(ctx.generation) {
            break;
        }
        tick += 1;

        if ctx.overlap == OverlapPolicy::Skip && ctx.in_flight.load(Ordering::SeqCst) > 0 {
            log::debug!("poll tick {tick} skipped: previous tick still in flight");
            continue;
        }

        ctx.in_flight.fetch_add(1, Ordering::SeqCst);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let report = ctx.run_tick(tick).await;
            ctx.in_flight.fetch_sub(1, Ordering::SeqCst);
            if let Some(reports) = &ctx.reports {
                let _ = reports.send(report);
            }
        });
    }
    log::debug!("poll ticker finished after {tick} ticks");
}

impl<T: Transport> TickContext<T> {
    async fn run_tick(&self, tick: u64) -> PollReport {
        log::debug!("poll tick {tick}");
        // Both requests go out together; each half lands on its own
        let (blocks, pool) =
            futures::future::join(self.refresh_blocks(tick), self.refresh_pool(tick)).await;
        PollReport { tick, blocks, pool }
    }

    async fn refresh_blocks(&self, tick: u64) -> TickOutcome {
        match self.api.fetch_chain_summary().await {
            Ok(batch) => {
                log_rejected(tick, EntityKind::ChainSummary, &batch.errors);
                let (items, rejected) = (batch.items.len(), batch.errors.len());
                let applied = self
                    .epoch
                    .write_if_current(self.generation, || self.view.replace_blocks(batch.items));
                if applied {
                    TickOutcome::Applied { items, rejected }
                } else {
                    TickOutcome::Discarded
                }
            }
            Err(e) => {
                log::warn!("poll tick {tick}: {e}; keeping previous blocks");
                TickOutcome::Failed(e)
            }
        }
    }

    async fn refresh_pool(&self, tick: u64) -> TickOutcome {
        match self.api.fetch_pending_pool().await {
            Ok(batch) => {
                log_rejected(tick, EntityKind::PendingPool, &batch.errors);
                let rejected = batch.errors.len();
                let pool = pool_from_transactions(batch.items);
                let items = pool.len();
                let applied = self
                    .epoch
                    .write_if_current(self.generation, || self.view.replace_pending_pool(pool));
                if applied {
                    TickOutcome::Applied { items, rejected }
                } else {
                    TickOutcome::Discarded
                }
            }
            Err(e) => {
                log::warn!("poll tick {tick}: {e}; keeping previous pending pool");
                TickOutcome::Failed(e)
            }
        }
    }
}

fn log_rejected(tick: u64, kind: EntityKind, errors: &[DecodeError]) {
    for e in errors {
        log::warn!("poll tick {tick}: dropped undecodable {kind} entry: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_policy_parses() {
        assert_eq!("skip".parse::<OverlapPolicy>().unwrap(), OverlapPolicy::Skip);
        assert_eq!("ALLOW".parse::<OverlapPolicy>().unwrap(), OverlapPolicy::Allow);
        assert!("queue".parse::<OverlapPolicy>().is_err());
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Skip);
    }

    #[tokio::test]
    async fn manual_ticker_stops_when_handle_dropped() {
        let (handle, mut ticker) = manual_ticker();
        assert!(handle.tick());
        assert!(ticker.tick().await);
        drop(handle);
        assert!(!ticker.tick().await);
    }

    #[tokio::test]
    async fn interval_ticker_fires_immediately() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(3600));
        let fired = tokio::time::timeout(Duration::from_secs(1), ticker.tick()).await;
        assert_eq!(fired.ok(), Some(true));
    }
}
