//! Read-only view state consumed by presentation.
//!
//! Each field sits behind its own `watch` channel, so a write replaces the
//! whole value at once and readers never see half of an old list mixed with
//! half of a new one. There is no multi-field transaction.

use crate::error::FetchError;
use crate::route::Route;
use crate::types::{Block, Detail, PendingPool};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// What the detail slot currently shows
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DetailState {
    /// No detail route active
    #[default]
    None,
    /// Route entered, fetch in flight
    Loading(Route),
    Ready { route: Route, detail: Detail },
    Failed { route: Route, error: FetchError },
}

impl DetailState {
    pub fn route(&self) -> Option<&Route> {
        match self {
            DetailState::None => None,
            DetailState::Loading(route)
            | DetailState::Ready { route, .. }
            | DetailState::Failed { route, .. } => Some(route),
        }
    }

    pub fn detail(&self) -> Option<&Detail> {
        match self {
            DetailState::Ready { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Point-in-time copy of every field
#[derive(Clone, Debug)]
pub struct ViewSnapshot {
    pub blocks: Arc<Vec<Block>>,
    pub pending_pool: Arc<PendingPool>,
    pub detail: DetailState,
}

struct Channels {
    blocks: watch::Sender<Arc<Vec<Block>>>,
    pending_pool: watch::Sender<Arc<PendingPool>>,
    detail: watch::Sender<DetailState>,
}

/// Shared handle; clones observe and update the same state
#[derive(Clone)]
pub struct ViewModel {
    inner: Arc<Channels>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModel {
    /// Empty block list, empty pool, no detail
    pub fn new() -> Self {
        let (blocks, _) = watch::channel(Arc::new(Vec::new()));
        let (pending_pool, _) = watch::channel(Arc::new(PendingPool::default()));
        let (detail, _) = watch::channel(DetailState::None);
        Self {
            inner: Arc::new(Channels {
                blocks,
                pending_pool,
                detail,
            }),
        }
    }

    pub fn blocks(&self) -> Arc<Vec<Block>> {
        self.inner.blocks.borrow().clone()
    }

    pub fn pending_pool(&self) -> Arc<PendingPool> {
        self.inner.pending_pool.borrow().clone()
    }

    pub fn detail(&self) -> DetailState {
        self.inner.detail.borrow().clone()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            blocks: self.blocks(),
            pending_pool: self.pending_pool(),
            detail: self.detail(),
        }
    }

    pub fn subscribe_blocks(&self) -> watch::Receiver<Arc<Vec<Block>>> {
        self.inner.blocks.subscribe()
    }

    pub fn subscribe_pending_pool(&self) -> watch::Receiver<Arc<PendingPool>> {
        self.inner.pending_pool.subscribe()
    }

    pub fn subscribe_detail(&self) -> watch::Receiver<DetailState> {
        self.inner.detail.subscribe()
    }

    pub(crate) fn replace_blocks(&self, blocks: Vec<Block>) {
        self.inner.blocks.send_replace(Arc::new(blocks));
    }

    pub(crate) fn replace_pending_pool(&self, pool: PendingPool) {
        self.inner.pending_pool.send_replace(Arc::new(pool));
    }

    pub(crate) fn set_detail(&self, state: DetailState) {
        self.inner.detail.send_replace(state);
    }
}

/// Generation counter guarding writes into the view model
///
/// A writer captures the generation when it starts work and may only write
/// while that generation is still current. Advancing and guarded writes hold
/// the same lock, so a late result can never land after its successor.
#[derive(Clone, Default)]
pub(crate) struct Epoch(Arc<Mutex<u64>>);

impl Epoch {
    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Invalidate every outstanding writer and return the new generation
    pub(crate) fn advance(&self) -> u64 {
        self.advance_then(|_| ()).0
    }

    /// Advance and run `f` before any guarded write can observe the new generation
    pub(crate) fn advance_then<R>(&self, f: impl FnOnce(u64) -> R) -> (u64, R) {
        let mut current = self.lock();
        *current += 1;
        let generation = *current;
        (generation, f(generation))
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        *self.lock() == generation
    }

    /// Run `f` only if `generation` is still current; returns whether it ran
    pub(crate) fn write_if_current(&self, generation: u64, f: impl FnOnce()) -> bool {
        let current = self.lock();
        if *current != generation {
            return false;
        }
        f();
        true
    }
}
