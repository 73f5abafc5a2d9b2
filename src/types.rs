use crate::envelope::decode_list;
use crate::error::DecodeError;
use crate::route::Route;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Arbitrary precision amount (volume, value, fee, balance, reward)
///
/// Accepted from the wire as a JSON string or number; always written back as a
/// string so no precision is lost on the way out.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }
}

impl From<BigDecimal> for Decimal {
    fn from(value: BigDecimal) -> Self {
        Decimal(value)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(BigDecimal::from(value))
    }
}

impl FromStr for Decimal {
    type Err = bigdecimal::ParseBigDecimalError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigDecimal::from_str(s.trim()).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(serde_json::Number),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s,
            Repr::Number(n) => n.to_string(),
        };
        text.parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal `{text}`")))
    }
}

/// A transaction, either in the pending pool or included in a block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    #[serde(rename = "fr", alias = "from")]
    pub from: String,
    pub to: String,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    pub nonce: u64,
    #[serde(rename = "time")]
    pub timestamp_seconds: i64,
    #[serde(default)]
    pub signed: bool,
}

/// A block at summary fidelity (`transactions == None`) or detail fidelity
///
/// `reward` and `difficulty` are only ever present on mined blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockWire")]
pub struct Block {
    pub number: u64,
    pub hash: String,
    #[serde(rename = "root", skip_serializing_if = "Option::is_none")]
    pub root_hash: Option<String>,
    #[serde(rename = "time", skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<i64>,
    #[serde(rename = "n_txs")]
    pub transaction_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    pub mined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<Decimal>,
    #[serde(rename = "diff", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u64>,
    #[serde(rename = "txs", skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    /// Embedded transactions that failed to decode (detail fidelity only)
    #[serde(skip)]
    pub rejected_transactions: Vec<DecodeError>,
}

impl Block {
    pub fn is_detailed(&self) -> bool {
        self.transactions.is_some()
    }

    /// Link to this block's detail view, keyed the way the summary list links
    pub fn route(&self) -> Route {
        Route::block(self.number.to_string())
    }
}

#[derive(Deserialize)]
struct BlockWire {
    number: u64,
    hash: String,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    n_txs: Option<u64>,
    #[serde(default)]
    volume: Option<Decimal>,
    #[serde(default)]
    mined: bool,
    #[serde(default)]
    reward: Option<Decimal>,
    #[serde(default)]
    diff: Option<u64>,
    #[serde(default)]
    txs: Option<Value>,
}

impl TryFrom<BlockWire> for Block {
    type Error = DecodeError;

    fn try_from(wire: BlockWire) -> Result<Self, Self::Error> {
        let (transactions, rejected_transactions) = match wire.txs {
            None | Some(Value::Null) => (None, Vec::new()),
            Some(raw) => {
                let batch = decode_list::<Transaction>(raw)?;
                (Some(batch.items), batch.errors)
            }
        };

        let transaction_count = match &transactions {
            Some(items) => {
                let loaded = items.len() as u64;
                if let Some(advertised) = wire.n_txs.filter(|n| *n != loaded) {
                    log::warn!(
                        "block {} advertises {} txs but carries {} ({} undecodable)",
                        wire.hash,
                        advertised,
                        loaded,
                        rejected_transactions.len()
                    );
                }
                loaded
            }
            None => match wire.n_txs {
                Some(n) => n,
                None => {
                    return Err(DecodeError::new(
                        "summary block without `n_txs`",
                        wire.hash,
                    ))
                }
            },
        };

        let (reward, difficulty) = if wire.mined {
            (wire.reward, wire.diff)
        } else {
            (None, None)
        };

        Ok(Block {
            number: wire.number,
            hash: wire.hash,
            root_hash: wire.root,
            timestamp_seconds: wire.time,
            transaction_count,
            volume: wire.volume,
            mined: wire.mined,
            reward,
            difficulty,
            transactions,
            rejected_transactions,
        })
    }
}

/// Account state as reported by `/acc/{hash}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub hash: String,
    pub balance: Decimal,
    pub nonce: u64,
}

/// `/acc/{hash}` body; the hash only lives in the request path
#[derive(Debug, Deserialize)]
pub(crate) struct AccountWire {
    pub balance: Decimal,
    pub nonce: u64,
}

impl Account {
    pub(crate) fn from_wire(hash: &str, wire: AccountWire) -> Result<Self, DecodeError> {
        if wire.balance.is_negative() {
            return Err(DecodeError::new(
                "account balance is negative",
                wire.balance.to_string(),
            ));
        }
        Ok(Account {
            hash: hash.to_string(),
            balance: wire.balance,
            nonce: wire.nonce,
        })
    }
}

/// Unconfirmed transactions keyed by hash, in the order the backend sent them
pub type PendingPool = IndexMap<String, Transaction>;

pub fn pool_from_transactions(txs: Vec<Transaction>) -> PendingPool {
    txs.into_iter().map(|tx| (tx.hash.clone(), tx)).collect()
}

/// The entity behind a detail route
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detail {
    Block(Block),
    Account(Account),
    Transaction(Transaction),
}
