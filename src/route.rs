//! Path router for the explorer views
//!
//! Maps a navigated path onto the detail entity it shows. Routes mirror the
//! backend endpoints one to one.
//!
//! ## Supported Routes
//!
//! - `/` - Landing view (chain summary + pending pool only)
//! - `/block/<id>` - Block detail; `id` is a hash or, as the summary list links it, a number
//! - `/acc/<hash>` - Account (also `/account/<hash>`)
//! - `/tx/<block_number>/<hash>` - Mined transaction
//! - `/tx/<hash>` - Pending transaction, looked up in the pool
//!
//! `/tx/undefined/<hash>` is what older clients emit for pool transactions and
//! resolves as pending too.
//!
//! ## Robust Parsing
//!
//! - Query and fragment stripping: `/block/0xabc?ref=1#top`
//! - Repeated slashes: `//acc///0x01`
//! - Hash routing: `#/tx/0xabc`
//! - Full URLs: `http://localhost:3000/block/7`
//!
//! ## Example
//!
//! ```rust
//! use bfsx::route::{parse, Route, TxLocator};
//!
//! let route = parse("/tx/12/0xfeed").unwrap();
//! assert_eq!(
//!     route,
//!     Route::Transaction(TxLocator::Confirmed { block_number: 12, hash: "0xfeed".into() })
//! );
//! assert_eq!(route.to_string(), "/tx/12/0xfeed");
//! ```

use std::fmt;

/// Spelling of a missing block number in links built by older clients
const UNDEFINED_SEGMENT: &str = "undefined";

/// Strip query and fragment from URL path
#[inline]
fn strip_query_frag(s: &str) -> &str {
    match s.find(['?', '#']) {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Drop `scheme://host` from a full URL, keeping the path
#[inline]
fn after_authority(raw: &str) -> &str {
    match raw.find("://") {
        Some(pos) => {
            let rest = &raw[pos + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => raw,
    }
}

/// Where a transaction lives: in a mined block or still in the pool
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxLocator {
    Confirmed { block_number: u64, hash: String },
    Pending { hash: String },
}

impl TxLocator {
    pub fn hash(&self) -> &str {
        match self {
            TxLocator::Confirmed { hash, .. } | TxLocator::Pending { hash } => hash,
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        match self {
            TxLocator::Confirmed { block_number, .. } => Some(*block_number),
            TxLocator::Pending { .. } => None,
        }
    }
}

/// Explorer view addressed by a path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing view: `/`
    Home,
    /// Block detail: `/block/<id>`
    Block { id: String },
    /// Account: `/acc/<hash>`
    Account { hash: String },
    /// Transaction detail: `/tx/<block_number>/<hash>` or `/tx/<hash>`
    Transaction(TxLocator),
}

impl Route {
    pub fn block(id: impl Into<String>) -> Self {
        Route::Block { id: id.into() }
    }

    pub fn account(hash: impl Into<String>) -> Self {
        Route::Account { hash: hash.into() }
    }

    /// Link to a transaction; `None` for the block number means it is pending
    pub fn transaction(block_number: Option<u64>, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        Route::Transaction(match block_number {
            Some(block_number) => TxLocator::Confirmed { block_number, hash },
            None => TxLocator::Pending { hash },
        })
    }

    /// True for routes that put an entity in the detail slot
    pub fn has_detail(&self) -> bool {
        !matches!(self, Route::Home)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Block { id } => write!(f, "/block/{id}"),
            Route::Account { hash } => write!(f, "/acc/{hash}"),
            Route::Transaction(TxLocator::Confirmed { block_number, hash }) => {
                write!(f, "/tx/{block_number}/{hash}")
            }
            Route::Transaction(TxLocator::Pending { hash }) => write!(f, "/tx/{hash}"),
        }
    }
}

/// Parse a route from a path, hash fragment, or full URL
///
/// Returns `None` for paths that do not address an explorer view.
pub fn parse(raw: &str) -> Option<Route> {
    let s = raw.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    let path = strip_query_frag(after_authority(s));

    let mut segments = path.split('/').filter(|s| !s.is_empty());

    let page = match segments.next() {
        None => return Some(Route::Home),
        Some(page) => page.to_ascii_lowercase(),
    };

    let route = match page.as_str() {
        "block" => Route::Block {
            id: segments.next()?.to_string(),
        },
        "acc" | "account" => Route::Account {
            hash: segments.next()?.to_string(),
        },
        "tx" => {
            let first = segments.next()?;
            match segments.next() {
                None => Route::Transaction(TxLocator::Pending {
                    hash: first.to_string(),
                }),
                Some(hash) if first == UNDEFINED_SEGMENT => Route::Transaction(TxLocator::Pending {
                    hash: hash.to_string(),
                }),
                Some(hash) => Route::Transaction(TxLocator::Confirmed {
                    block_number: first.parse::<u64>().ok()?,
                    hash: hash.to_string(),
                }),
            }
        }
        _ => return None, // Unknown view
    };

    // Trailing segments mean a path we do not serve
    if segments.next().is_some() {
        return None;
    }
    Some(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_home() {
        assert_eq!(parse("/").unwrap(), Route::Home);
        assert_eq!(parse("").unwrap(), Route::Home);
        assert_eq!(parse("#/").unwrap(), Route::Home);
        assert_eq!(parse("http://localhost:3000").unwrap(), Route::Home);
    }

    #[test]
    fn test_parse_block() {
        assert_eq!(parse("/block/0xabc").unwrap(), Route::block("0xabc"));
        assert_eq!(parse("/block/17").unwrap(), Route::block("17"));
        assert!(parse("/block/").is_none());
    }

    #[test]
    fn test_parse_account() {
        assert_eq!(parse("/acc/0x01").unwrap(), Route::account("0x01"));
        assert_eq!(parse("/account/0x01").unwrap(), Route::account("0x01"));
        assert!(parse("/acc").is_none());
    }

    #[test]
    fn test_parse_confirmed_tx() {
        let route = parse("/tx/12/0xfeed").unwrap();
        assert_eq!(route, Route::transaction(Some(12), "0xfeed"));
        match route {
            Route::Transaction(loc) => {
                assert_eq!(loc.block_number(), Some(12));
                assert_eq!(loc.hash(), "0xfeed");
            }
            _ => panic!("Expected Transaction route"),
        }
    }

    #[test]
    fn test_parse_pending_tx() {
        assert_eq!(parse("/tx/0xfeed").unwrap(), Route::transaction(None, "0xfeed"));
        assert_eq!(
            parse("/tx/undefined/0xfeed").unwrap(),
            Route::transaction(None, "0xfeed")
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("/tx/abc/0xfeed").is_none()); // Non-numeric block number
        assert!(parse("/tx/").is_none()); // Missing hash
        assert!(parse("/blocks").is_none()); // Unknown view
        assert!(parse("/block/1/extra").is_none()); // Trailing segment
    }

    #[test]
    fn test_parse_query_and_fragment() {
        assert_eq!(parse("/block/0xabc?ref=1").unwrap(), Route::block("0xabc"));
        assert_eq!(parse("/acc/0x01#balance").unwrap(), Route::account("0x01"));
        assert_eq!(
            parse("/tx/3/0xfe?x=1#y").unwrap(),
            Route::transaction(Some(3), "0xfe")
        );
    }

    #[test]
    fn test_parse_slashes_and_urls() {
        assert_eq!(parse("//acc///0x01").unwrap(), Route::account("0x01"));
        assert_eq!(parse("#/tx/0xabc").unwrap(), Route::transaction(None, "0xabc"));
        assert_eq!(
            parse("http://localhost:3000/block/7").unwrap(),
            Route::block("7")
        );
        assert_eq!(parse("/BLOCK/7").unwrap(), Route::block("7"));
    }

    #[test]
    fn test_display_round_trips() {
        for route in [
            Route::Home,
            Route::block("0xabc"),
            Route::account("0x01"),
            Route::transaction(Some(4), "0xfe"),
            Route::transaction(None, "0xfe"),
        ] {
            assert_eq!(parse(&route.to_string()).unwrap(), route);
        }
    }
}
