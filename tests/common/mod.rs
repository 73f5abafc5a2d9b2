//! In-memory transport scripted per path, shared by the integration tests

use async_trait::async_trait;
use bfsx::client::Transport;
use bfsx::error::TransportError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;

type Reply = Result<Value, TransportError>;

/// Answers each path with whatever was last scripted for it, 404 otherwise
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<HashMap<String, usize>>,
    requests: UnboundedSender<String>,
}

impl ScriptedTransport {
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (requests, rx) = unbounded_channel();
        let transport = Self {
            replies: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            requests,
        };
        (transport, rx)
    }

    pub fn reply(&self, path: &str, body: Value) {
        self.replies.lock().unwrap().insert(path.to_string(), Ok(body));
    }

    pub fn fail(&self, path: &str, err: TransportError) {
        self.replies.lock().unwrap().insert(path.to_string(), Err(err));
    }

    /// Hold requests for `path` until permits are added to the returned gate
    #[allow(dead_code)]
    pub fn gate(&self, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    #[allow(dead_code)]
    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let path = path.trim_start_matches('/').to_string();
        *self.calls.lock().unwrap().entry(path.clone()).or_default() += 1;
        let _ = self.requests.send(path.clone());

        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        self.replies
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

/// Let spawned tasks on the current-thread test runtime catch up
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Wrap a value the way the backend does: as a JSON string of itself
pub fn encoded(value: &Value) -> Value {
    Value::String(value.to_string())
}

pub fn summary_block(number: u64, hash: &str) -> Value {
    json!({
        "number": number,
        "hash": hash,
        "root": format!("0xroot{number}"),
        "time": 1_700_000_000 + number as i64,
        "n_txs": 1,
        "volume": "10.5",
        "mined": true,
        "reward": "2",
        "diff": 3
    })
}

pub fn tx(hash: &str) -> Value {
    json!({
        "hash": hash,
        "fr": "0xalice",
        "to": "0xbob",
        "value": "1.25",
        "nonce": 7,
        "time": 1_700_000_100,
        "signed": true
    })
}

/// `/blocks` body: a string holding an array of strings holding objects
#[allow(dead_code)]
pub fn blocks_body(blocks: &[Value]) -> Value {
    let elements: Vec<Value> = blocks.iter().map(encoded).collect();
    json!({ "blocks": encoded(&Value::Array(elements)) })
}

/// `/txs_pool` body: an array of strings holding objects
#[allow(dead_code)]
pub fn pool_body(txs: &[Value]) -> Value {
    json!({ "txs_pool": txs.iter().map(encoded).collect::<Vec<_>>() })
}
