//! Entity fetchers: one round trip per call, normalized through the envelope decoder.
//!
//! Fetchers never retry. Whoever called them (poller, route resolver) decides
//! what a failure means.

use crate::client::{path_segment, Transport};
use crate::envelope::{decode_list, decode_record, envelope_field, Batch, NULL_PAYLOAD};
use crate::error::{DecodeError, EntityKind, FetchError};
use crate::route::TxLocator;
use crate::types::{Account, AccountWire, Block, Transaction};
use serde_json::Value;

const BLOCKS_PATH: &str = "blocks";
const POOL_PATH: &str = "txs_pool";

pub struct ExplorerApi<T> {
    transport: T,
}

impl<T: Transport> ExplorerApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn get(&self, kind: EntityKind, key: &str, path: &str) -> Result<Value, FetchError> {
        self.transport
            .get_json(path)
            .await
            .map_err(|e| FetchError::from_transport(kind, key, e))
    }

    /// `GET /blocks`: recent blocks at summary fidelity, in backend order
    pub async fn fetch_chain_summary(&self) -> Result<Batch<Block>, FetchError> {
        let kind = EntityKind::ChainSummary;
        let body = self.get(kind, BLOCKS_PATH, BLOCKS_PATH).await?;
        envelope_field(body, "blocks")
            .and_then(decode_list::<Block>)
            .map_err(|e| FetchError::decode(kind, BLOCKS_PATH, e))
    }

    /// `GET /txs_pool`: unconfirmed transactions
    pub async fn fetch_pending_pool(&self) -> Result<Batch<Transaction>, FetchError> {
        let kind = EntityKind::PendingPool;
        let body = self.get(kind, POOL_PATH, POOL_PATH).await?;
        envelope_field(body, "txs_pool")
            .and_then(decode_list::<Transaction>)
            .map_err(|e| FetchError::decode(kind, POOL_PATH, e))
    }

    /// `GET /block/{id}`: a block with its embedded transactions
    pub async fn fetch_block_detail(&self, id: &str) -> Result<Block, FetchError> {
        let kind = EntityKind::Block;
        let body = self
            .get(kind, id, &format!("block/{}", path_segment(id)))
            .await?;
        let block = single(kind, id, decode_record::<Block>(body))?;
        if !block.is_detailed() {
            return Err(FetchError::decode(
                kind,
                id,
                DecodeError::new("block detail without `txs`", block.hash),
            ));
        }
        Ok(block)
    }

    /// `GET /acc/{hash}`
    pub async fn fetch_account(&self, hash: &str) -> Result<Account, FetchError> {
        let kind = EntityKind::Account;
        let body = self
            .get(kind, hash, &format!("acc/{}", path_segment(hash)))
            .await?;
        let wire = single(kind, hash, decode_record::<AccountWire>(body))?;
        Account::from_wire(hash, wire).map_err(|e| FetchError::decode(kind, hash, e))
    }

    /// Mined transactions resolve against `/tx/{n}/{hash}`, pending ones against `/tx_pool/{hash}`
    pub async fn fetch_transaction_detail(
        &self,
        locator: &TxLocator,
    ) -> Result<Transaction, FetchError> {
        let kind = EntityKind::Transaction;
        let key = locator.hash();
        let path = match locator {
            TxLocator::Confirmed { block_number, hash } => {
                format!("tx/{block_number}/{}", path_segment(hash))
            }
            TxLocator::Pending { hash } => format!("tx_pool/{}", path_segment(hash)),
        };
        let body = self.get(kind, key, &path).await?;
        let field = envelope_field(body, "tx").map_err(|e| FetchError::decode(kind, key, e))?;
        single(kind, key, decode_record::<Transaction>(field))
    }
}

/// An absent single-entity payload (`null`, `"null"`) means the backend has nothing under that key
fn single<R>(kind: EntityKind, key: &str, decoded: Result<R, DecodeError>) -> Result<R, FetchError> {
    decoded.map_err(|e| {
        if e.reason == NULL_PAYLOAD {
            FetchError::NotFound {
                kind,
                key: key.to_string(),
            }
        } else {
            FetchError::decode(kind, key, e)
        }
    })
}
