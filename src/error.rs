//! Typed errors for decoding, transport and entity fetches.
//!
//! Fetch errors always carry the entity kind and the key that was asked for,
//! so the poller can log them and the route resolver can park them in the
//! detail slot without losing context.

use std::fmt;
use thiserror::Error;

/// Raw fragments longer than this are cut when displayed.
const FRAGMENT_PREVIEW: usize = 120;

/// Which backend entity a request was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ChainSummary,
    PendingPool,
    Block,
    Account,
    Transaction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::ChainSummary => write!(f, "chain summary"),
            EntityKind::PendingPool => write!(f, "pending pool"),
            EntityKind::Block => write!(f, "block"),
            EntityKind::Account => write!(f, "account"),
            EntityKind::Transaction => write!(f, "transaction"),
        }
    }
}

/// A payload that did not match the expected envelope or record shape.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason} (at {}) in `{}`", location(.index), preview(.fragment))]
pub struct DecodeError {
    /// Position inside the enclosing list, when the failure was a list element.
    pub index: Option<usize>,
    pub reason: String,
    /// The offending raw JSON text, untruncated.
    pub fragment: String,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            index: None,
            reason: reason.into(),
            fragment: fragment.into(),
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

fn location(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("item {i}"),
        None => "payload".to_string(),
    }
}

fn preview(fragment: &str) -> String {
    if fragment.chars().count() <= FRAGMENT_PREVIEW {
        return fragment.to_string();
    }
    let cut: String = fragment.chars().take(FRAGMENT_PREVIEW).collect();
    format!("{cut}...")
}

/// Failure below the decoder: the request itself did not produce JSON.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("http status {0}")]
    Status(u16),

    #[error("response body is not json: {0}")]
    Body(String),
}

/// Error surfaced by an entity fetcher.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error fetching {kind} {key}: {message}")]
    Network {
        kind: EntityKind,
        key: String,
        message: String,
    },

    #[error("http {status} fetching {kind} {key}")]
    Http {
        kind: EntityKind,
        key: String,
        status: u16,
    },

    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },

    #[error("could not decode {kind} {key}: {source}")]
    Decode {
        kind: EntityKind,
        key: String,
        #[source]
        source: DecodeError,
    },
}

impl FetchError {
    pub fn kind(&self) -> EntityKind {
        match self {
            FetchError::Network { kind, .. }
            | FetchError::Http { kind, .. }
            | FetchError::NotFound { kind, .. }
            | FetchError::Decode { kind, .. } => *kind,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            FetchError::Network { key, .. }
            | FetchError::Http { key, .. }
            | FetchError::NotFound { key, .. }
            | FetchError::Decode { key, .. } => key,
        }
    }

    pub(crate) fn from_transport(kind: EntityKind, key: &str, err: TransportError) -> Self {
        let key = key.to_string();
        match err {
            TransportError::Network(message) => FetchError::Network { kind, key, message },
            TransportError::Status(404) => FetchError::NotFound { kind, key },
            TransportError::Status(status) => FetchError::Http { kind, key, status },
            TransportError::Body(raw) => FetchError::Decode {
                kind,
                key,
                source: DecodeError::new("response body is not valid json", raw),
            },
        }
    }

    pub(crate) fn decode(kind: EntityKind, key: &str, source: DecodeError) -> Self {
        FetchError::Decode {
            kind,
            key: key.to_string(),
            source,
        }
    }
}

/// A path that does not map onto any explorer view.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unrecognized route: {0}")]
    Unrecognized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_split_from_other_statuses() {
        let nf = FetchError::from_transport(EntityKind::Account, "0xa", TransportError::Status(404));
        assert_eq!(
            nf,
            FetchError::NotFound {
                kind: EntityKind::Account,
                key: "0xa".into()
            }
        );

        let http = FetchError::from_transport(EntityKind::Block, "7", TransportError::Status(502));
        assert!(matches!(http, FetchError::Http { status: 502, .. }));
        assert_eq!(http.kind(), EntityKind::Block);
        assert_eq!(http.key(), "7");
    }

    #[test]
    fn non_json_body_becomes_decode_error_with_fragment() {
        let err = FetchError::from_transport(
            EntityKind::ChainSummary,
            "blocks",
            TransportError::Body("<html>".into()),
        );
        match err {
            FetchError::Decode { source, .. } => assert_eq!(source.fragment, "<html>"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn long_fragments_are_cut_in_display_only() {
        let raw = "x".repeat(500);
        let err = DecodeError::new("bad", raw.clone()).at(3);
        let shown = err.to_string();
        assert!(shown.contains("item 3"));
        assert!(shown.ends_with("...`"));
        assert_eq!(err.fragment, raw);
    }
}
