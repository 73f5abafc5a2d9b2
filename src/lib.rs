//! bfsx - explorer client core for a bfs chain node
//!
//! The crate keeps a live, read-only view of a node's explorer API:
//! - [`poller::Poller`] refreshes recent blocks and the pending pool on a timer
//! - [`resolver::RouteResolver`] loads the block, account or transaction a route names
//! - [`view_model::ViewModel`] holds the result for whatever presents it
//!
//! Every backend payload goes through [`envelope`], which undoes the API's
//! habit of wrapping JSON inside JSON strings.
//!
//! ## Usage
//! ```bash
//! API_URL=http://localhost:5000/ cargo run -- /block/12
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod poller;
pub mod resolver;
pub mod route;
pub mod types;
pub mod util_text;
pub mod view_model;

// Re-export commonly used types
pub use client::{HttpTransport, Transport};
pub use config::Config;
pub use error::{DecodeError, EntityKind, FetchError, RouteError};
pub use fetch::ExplorerApi;
pub use poller::{IntervalTicker, OverlapPolicy, Poller};
pub use resolver::RouteResolver;
pub use route::{Route, TxLocator};
pub use types::{Account, Block, Decimal, Detail, PendingPool, Transaction};
pub use view_model::{DetailState, ViewModel, ViewSnapshot};
