//! Orchestrator - drives the beat-synchronized mining loop
//!
//! Each round waits for network peers, waits for the metronome to produce
//! the beat after the one the local tip is anchored to, builds a template on
//! that beat and hands it to the mining manager. Round failures are logged
//! and the loop moves on; only invariant violations end it.

use consensus_core::tx::Transaction;
use consensus_core::Hash;
use metronome::{Beat, BeatCache, BeatSource};
use mining::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::ui::{format_duration, format_hashrate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub beat_poll_interval: Duration,
    /// Peer wait after which the node is treated as resyncing
    pub resync_threshold: Duration,
    /// How long the tip height must hold still after a resync
    pub stability_window: Duration,
    pub round_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            beat_poll_interval: Duration::from_secs(1),
            resync_threshold: Duration::from_secs(600),
            stability_window: Duration::from_secs(30),
            round_backoff: Duration::from_secs(1),
        }
    }
}

/// How a single round ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A block was found and handed to the node
    Mined { hash: Hash, accepted: bool },
    /// The round finished without a usable block (exhausted, stale or disconnected)
    NoBlock,
    Interrupted,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    chain: Arc<dyn ChainView>,
    assembler: Arc<dyn BlockAssembler>,
    beats: Arc<dyn BeatSource>,
    manager: MiningManager,
    cache: Option<Arc<BeatCache>>,
    extra_nonce: u32,
    /// Coinbases of the accepted blocks mined by this process
    coinbases: Vec<Transaction>,
    rounds: u64,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        chain: Arc<dyn ChainView>,
        assembler: Arc<dyn BlockAssembler>,
        beats: Arc<dyn BeatSource>,
        manager: MiningManager,
    ) -> Self {
        Self { config, chain, assembler, beats, manager, cache: None, extra_nonce: 0, coinbases: Vec::new(), rounds: 0 }
    }

    /// Persist `cache` after every round
    pub fn with_cache(mut self, cache: Arc<BeatCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn interrupt(&self) -> &Interrupt {
        self.manager.interrupt()
    }

    pub fn manager(&self) -> &MiningManager {
        &self.manager
    }

    pub fn coinbases(&self) -> &[Transaction] {
        &self.coinbases
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Run rounds until interrupted. Returns an error only for failures no
    /// later round can recover from.
    pub fn run(&mut self) -> Result<(), MiningError> {
        info!("Mining loop started with {} workers", self.manager.worker_count());

        while !self.interrupt().is_triggered() {
            let outcome = self.run_round();
            self.rounds += 1;
            self.persist_cache();

            match outcome {
                Ok(RoundOutcome::Interrupted) => break,
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!("Mining loop aborted: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Mining round {} failed: {}", self.rounds, e);
                    self.interrupt().sleep(self.config.round_backoff);
                }
            }
        }

        info!("Mining loop stopped after {} rounds, {} blocks mined", self.rounds, self.coinbases.len());
        Ok(())
    }

    /// One pass of the loop: peers, next beat, template, search, submit
    pub fn run_round(&mut self) -> Result<RoundOutcome, MiningError> {
        if !self.wait_for_network() {
            return Ok(RoundOutcome::Interrupted);
        }

        let Some(beat) = self.wait_for_next_beat()? else {
            return Ok(RoundOutcome::Interrupted);
        };
        info!("Mining on beat {} (height {}, time {})", beat.hash, beat.height, beat.block_time);

        let mut block = self.assembler.create_block_template(&beat.hash)?;
        self.assembler.increment_extra_nonce(&mut block, &mut self.extra_nonce)?;

        let result = self.manager.mine(block, Arc::clone(&self.chain));

        if !result.is_found() {
            if self.interrupt().is_triggered() {
                return Ok(RoundOutcome::Interrupted);
            }
            if result.is_stale() {
                info!("Chain tip moved during job {}, rebuilding", result.job_id);
            } else {
                info!("Job {} ended without a block after {} hashes", result.job_id, result.total_hashes);
            }
            return Ok(RoundOutcome::NoBlock);
        }
        let Some(mined) = result.winner else {
            return Ok(RoundOutcome::NoBlock);
        };

        info!(
            "Found block {} (nonce {}, worker {}, {} at {})",
            mined.block_hash,
            mined.nonce(),
            mined.worker_id,
            format_duration(Duration::from_millis(mined.time_ms)),
            format_hashrate(result.hash_rate)
        );

        let accepted = self.assembler.submit_block(&mined.block)?;
        if accepted {
            if let Some(coinbase) = mined.block.coinbase() {
                self.coinbases.push(coinbase.clone());
            }
            info!("Block {} accepted", mined.block_hash);
        } else {
            warn!("Block {} was not accepted", mined.block_hash);
        }

        Ok(RoundOutcome::Mined { hash: mined.block_hash, accepted })
    }

    /// Block until the node has a peer. A long wait means the node was offline
    /// and is resyncing, so also wait for its height to settle. Returns false
    /// on interrupt.
    pub fn wait_for_network(&self) -> bool {
        let started = Instant::now();
        let mut waited = false;

        while self.chain.peer_count() == 0 {
            if !waited {
                info!("Waiting for network peers");
                waited = true;
            }
            if self.interrupt().sleep(self.config.beat_poll_interval) {
                return false;
            }
        }

        let offline = started.elapsed();
        if waited && offline >= self.config.resync_threshold {
            info!("Peers back after {}, waiting for chain height to settle", format_duration(offline));
            return self.wait_for_stable_height();
        }
        true
    }

    fn wait_for_stable_height(&self) -> bool {
        let mut height = self.chain.tip().height;
        let mut stable_since = Instant::now();

        while stable_since.elapsed() < self.config.stability_window {
            if self.interrupt().sleep(self.config.beat_poll_interval) {
                return false;
            }
            let current = self.chain.tip().height;
            if current != height {
                debug!("Chain height moved {} -> {}", height, current);
                height = current;
                stable_since = Instant::now();
            }
        }
        true
    }

    /// Poll until the metronome has a beat after the tip's anchor beat.
    /// Returns `None` on interrupt.
    pub fn wait_for_next_beat(&self) -> Result<Option<Beat>, MiningError> {
        let mut announced = false;

        loop {
            if self.interrupt().is_triggered() {
                return Ok(None);
            }

            let tip = self.chain.tip();
            if let Some(beat) = self.next_beat_after(&tip.beat_hash)? {
                return Ok(Some(beat));
            }

            if !announced {
                debug!("Waiting for the beat after {} (tip {})", tip.beat_hash, tip.height);
                announced = true;
            }
            if self.interrupt().sleep(self.config.beat_poll_interval) {
                return Ok(None);
            }
        }
    }

    fn next_beat_after(&self, beat_hash: &Hash) -> Result<Option<Beat>, MiningError> {
        // Genesis carries no beat; anchor to whatever the metronome has now
        if beat_hash.is_zero() {
            return Ok(self.beats.fetch_latest_beat()?);
        }

        let Some(current) = self.beats.fetch_beat(beat_hash)? else {
            return Ok(None);
        };
        match current.next_hash {
            Some(next) => Ok(self.beats.fetch_beat(&next)?),
            None => Ok(None),
        }
    }

    fn persist_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save() {
                warn!("Failed to write beat cache {}: {}", cache.path().display(), e);
            }
        }
    }
}
