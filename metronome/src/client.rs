use crate::beat::Beat;
use crate::cache::BeatCache;
use crate::config::MetronomeConfig;
use crate::errors::MetronomeError;
use crate::transport::{HttpTransport, RpcTransport};
use crypto_hashes::Hash;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Attempts per RPC before giving up
pub const MAX_RETRIES: usize = 3;

/// Read access to metronome beats, as needed by retargeting and the mining loop
pub trait BeatSource: Send + Sync {
    /// Beat for `hash`, or `None` if the metronome does not know it
    fn fetch_beat(&self, hash: &Hash) -> Result<Option<Beat>, MetronomeError>;

    /// Beat at the metronome's current tip
    fn fetch_latest_beat(&self) -> Result<Option<Beat>, MetronomeError>;
}

/// Metronome RPC client with bounded retry and a read-through [`BeatCache`]
pub struct MetronomeClient<T: RpcTransport = HttpTransport> {
    transport: T,
    cache: Arc<BeatCache>,
    max_attempts: usize,
}

impl MetronomeClient<HttpTransport> {
    pub fn connect(config: &MetronomeConfig, cache: Arc<BeatCache>) -> Result<Self, MetronomeError> {
        let transport = HttpTransport::new(config)?;
        debug!("Metronome RPC endpoint {}", transport.endpoint());
        Ok(Self::new(transport, cache))
    }
}

impl<T: RpcTransport> MetronomeClient<T> {
    pub fn new(transport: T, cache: Arc<BeatCache>) -> Self {
        Self { transport, cache, max_attempts: MAX_RETRIES }
    }

    pub fn cache(&self) -> &Arc<BeatCache> {
        &self.cache
    }

    /// Run `method` up to `max_attempts` times; every failure kind is retried.
    fn resilient_call(&self, method: &str, params: Value) -> Result<Value, MetronomeError> {
        let mut last = None;
        for attempt in 1..=self.max_attempts {
            match self.transport.call(method, &params) {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!("Metronome call {} failed (attempt {}/{}): {}", method, attempt, self.max_attempts, e);
                    last = Some(e);
                }
            }
        }

        Err(MetronomeError::RetriesExhausted {
            method: method.to_string(),
            attempts: self.max_attempts,
            last: Box::new(last.unwrap_or(MetronomeError::EmptyResponse)),
        })
    }

    /// `getblockchaininfo.bestblockhash`, or `None` if the node reports an
    /// error or the field is missing
    pub fn fetch_best_hash(&self) -> Result<Option<Hash>, MetronomeError> {
        let reply = self.resilient_call("getblockchaininfo", json!([]))?;
        let Some(result) = successful_result(&reply) else {
            return Ok(None);
        };

        Ok(result
            .get("bestblockhash")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Hash>().ok()))
    }

    /// Cached beat if its successor is already known, otherwise a fresh
    /// `getblockheader` lookup that is then offered to the cache.
    pub fn fetch_beat(&self, hash: &Hash) -> Result<Option<Beat>, MetronomeError> {
        if let Some(beat) = self.cache.get(hash) {
            if beat.has_successor() {
                return Ok(Some(beat));
            }
        }

        let reply = self.resilient_call("getblockheader", json!([hash.to_string()]))?;
        let Some(result) = successful_result(&reply) else {
            debug!("Metronome has no header for {}", hash);
            return Ok(None);
        };

        let (Some(block_time), Some(height)) =
            (result.get("time").and_then(Value::as_i64), result.get("height").and_then(Value::as_i64))
        else {
            warn!("Metronome header for {} is missing time or height", hash);
            return Ok(None);
        };

        let next_hash = result
            .get("nextblockhash")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Hash>().ok());

        let beat = Beat::new(*hash, block_time, height, next_hash);
        self.cache.put(*hash, beat.clone());
        Ok(Some(beat))
    }

    pub fn fetch_latest_beat(&self) -> Result<Option<Beat>, MetronomeError> {
        match self.fetch_best_hash()? {
            Some(hash) => self.fetch_beat(&hash),
            None => Ok(None),
        }
    }
}

impl<T: RpcTransport> BeatSource for MetronomeClient<T> {
    fn fetch_beat(&self, hash: &Hash) -> Result<Option<Beat>, MetronomeError> {
        MetronomeClient::fetch_beat(self, hash)
    }

    fn fetch_latest_beat(&self) -> Result<Option<Beat>, MetronomeError> {
        MetronomeClient::fetch_latest_beat(self)
    }
}

/// `result` of a reply whose `error` field is absent or null
fn successful_result(reply: &Value) -> Option<&Value> {
    match reply.get("error") {
        Some(err) if !err.is_null() => None,
        _ => reply.get("result").filter(|r| !r.is_null()),
    }
}
