use crate::client::Transport;
use crate::error::{FetchError, RouteError};
use crate::fetch::ExplorerApi;
use crate::route::{self, Route, TxLocator};
use crate::types::Detail;
use crate::view_model::{DetailState, Epoch, ViewModel};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fetcher invocation a route calls for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetailRequest {
    Block { id: String },
    Account { hash: String },
    Transaction(TxLocator),
}

impl DetailRequest {
    /// `/` has no detail entity; every other route maps to exactly one fetch
    pub fn for_route(route: &Route) -> Option<Self> {
        match route {
            Route::Home => None,
            Route::Block { id } => Some(DetailRequest::Block { id: id.clone() }),
            Route::Account { hash } => Some(DetailRequest::Account { hash: hash.clone() }),
            Route::Transaction(locator) => Some(DetailRequest::Transaction(locator.clone())),
        }
    }

    pub async fn run<T: Transport>(&self, api: &ExplorerApi<T>) -> Result<Detail, FetchError> {
        match self {
            DetailRequest::Block { id } => api.fetch_block_detail(id).await.map(Detail::Block),
            DetailRequest::Account { hash } => api.fetch_account(hash).await.map(Detail::Account),
            DetailRequest::Transaction(locator) => api
                .fetch_transaction_detail(locator)
                .await
                .map(Detail::Transaction),
        }
    }
}

/// Loads the detail entity for the active route into the view model
///
/// Re-resolving the active route is a no-op; a different route supersedes any
/// fetch still in flight and its result is dropped when it arrives.
pub struct RouteResolver<T> {
    api: Arc<ExplorerApi<T>>,
    view: ViewModel,
    epoch: Epoch,
    active: Option<Route>,
}

impl<T: Transport> RouteResolver<T> {
    pub fn new(api: Arc<ExplorerApi<T>>, view: ViewModel) -> Self {
        Self {
            api,
            view,
            epoch: Epoch::default(),
            active: None,
        }
    }

    pub fn active_route(&self) -> Option<&Route> {
        self.active.as_ref()
    }

    /// Enter `route`. Returns the spawned fetch, if one was needed.
    pub fn resolve(&mut self, route: Route) -> Option<JoinHandle<()>> {
        if self.active.as_ref() == Some(&route) {
            log::debug!("route {route} unchanged, keeping detail");
            return None;
        }
        log::info!("route -> {route}");
        self.active = Some(route.clone());
        self.load(route)
    }

    /// Parse and enter a path; unknown paths leave the current detail alone
    pub fn resolve_path(&mut self, path: &str) -> Result<Option<JoinHandle<()>>, RouteError> {
        match route::parse(path) {
            Some(route) => Ok(self.resolve(route)),
            None => {
                log::warn!("ignoring unrecognized route {path:?}");
                Err(RouteError::Unrecognized(path.to_string()))
            }
        }
    }

    /// Fetch the active route again, e.g. after it failed
    pub fn reload(&mut self) -> Option<JoinHandle<()>> {
        let route = self.active.clone()?;
        log::info!("reloading {route}");
        self.load(route)
    }

    /// Leave the detail view: clear the slot and drop anything still in flight
    pub fn teardown(&mut self) {
        self.active = None;
        self.epoch
            .advance_then(|_| self.view.set_detail(DetailState::None));
    }

    fn load(&mut self, route: Route) -> Option<JoinHandle<()>> {
        let request = DetailRequest::for_route(&route);
        let initial = if route.has_detail() {
            DetailState::Loading(route.clone())
        } else {
            DetailState::None
        };
        let (generation, ()) = self.epoch.advance_then(|_| self.view.set_detail(initial));
        let request = request?;

        let api = self.api.clone();
        let view = self.view.clone();
        let epoch = self.epoch.clone();
        Some(tokio::spawn(async move {
            let state = match request.run(&api).await {
                Ok(detail) => DetailState::Ready {
                    route: route.clone(),
                    detail,
                },
                Err(error) => {
                    log::warn!("loading {route} failed: {error}");
                    DetailState::Failed {
                        route: route.clone(),
                        error,
                    }
                }
            };
            if !epoch.write_if_current(generation, || view.set_detail(state)) {
                log::debug!("discarding late result for {route}");
            }
        }))
    }
}

impl<T> Drop for RouteResolver<T> {
    fn drop(&mut self) {
        // Results still in flight must not land in the view
        self.epoch.advance();
    }
}
