use beatpad::{LocalNode, Orchestrator, OrchestratorConfig, RoundOutcome};
use consensus_core::block::Block;
use consensus_core::config::Params;
use consensus_core::Hash;
use metronome::{Beat, BeatCache, BeatSource, MetronomeError};
use mining::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// In-memory metronome chain
#[derive(Default)]
struct StaticBeats {
    beats: Mutex<HashMap<Hash, Beat>>,
    latest: Mutex<Option<Hash>>,
    /// Remaining calls that fail with a connection error
    failures: AtomicUsize,
}

impl StaticBeats {
    fn with_tip(beat: Beat) -> Arc<Self> {
        let beats = Arc::new(Self::default());
        beats.push(beat);
        beats
    }

    /// Append `beat` as the new metronome tip, linking the previous tip to it
    fn push(&self, beat: Beat) {
        let mut beats = self.beats.lock().unwrap();
        let mut latest = self.latest.lock().unwrap();
        let prev_hash = *latest;
        if let Some(prev) = prev_hash.and_then(|hash| beats.get_mut(&hash)) {
            prev.next_hash = Some(beat.hash);
        }
        *latest = Some(beat.hash);
        beats.insert(beat.hash, beat);
    }

    fn fail_next(&self, calls: usize) {
        self.failures.store(calls, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), MetronomeError> {
        let failing = self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if failing {
            return Err(MetronomeError::Connect("connection refused".to_string()));
        }
        Ok(())
    }
}

impl BeatSource for StaticBeats {
    fn fetch_beat(&self, hash: &Hash) -> Result<Option<Beat>, MetronomeError> {
        self.check_failure()?;
        Ok(self.beats.lock().unwrap().get(hash).cloned())
    }

    fn fetch_latest_beat(&self) -> Result<Option<Beat>, MetronomeError> {
        self.check_failure()?;
        let latest = *self.latest.lock().unwrap();
        Ok(latest.and_then(|hash| self.beats.lock().unwrap().get(&hash).cloned()))
    }
}

/// Chain view whose peers and height the test moves by hand
struct ScriptedChain {
    peers: AtomicUsize,
    height: AtomicU64,
}

impl ChainView for ScriptedChain {
    fn tip(&self) -> ChainTip {
        let height = self.height.load(Ordering::SeqCst);
        ChainTip { hash: Hash::from_le_u64([height, 0, 0, 0]), height, time: 1_700_000_000, beat_hash: Hash::zeroed() }
    }

    fn adjusted_time(&self) -> i64 {
        1_700_000_000
    }

    fn peer_count(&self) -> usize {
        self.peers.load(Ordering::SeqCst)
    }
}

/// Assembler whose retarget always hits an unresolvable beat
struct BrokenAssembler;

impl BlockAssembler for BrokenAssembler {
    fn create_block_template(&self, _beat_hash: &Hash) -> Result<Block, MiningError> {
        Err(RetargetError::MissingBeat { height: 5, block: Hash::from_le_u64([5, 0, 0, 0]), beat: Hash::from_le_u64([6, 0, 0, 0]) }
            .into())
    }

    fn increment_extra_nonce(&self, _block: &mut Block, _extra_nonce: &mut u32) -> Result<(), MiningError> {
        Ok(())
    }

    fn submit_block(&self, _block: &Block) -> Result<bool, MiningError> {
        Ok(false)
    }
}

fn beat(n: u64) -> Beat {
    Beat::new(Hash::from_le_u64([0xbeef, n, 0, 0]), 1_700_000_000 + 600 * n as i64, 800_000 + n as i64, None)
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        beat_poll_interval: Duration::from_millis(10),
        resync_threshold: Duration::from_secs(600),
        stability_window: Duration::from_secs(30),
        round_backoff: Duration::from_millis(10),
    }
}

fn manager() -> MiningManager {
    MiningManager::new(MiningConfig { num_workers: 2, ..MiningConfig::default() }, Interrupt::new())
}

fn setup(beats: Arc<StaticBeats>) -> (Arc<LocalNode>, Orchestrator) {
    let node = Arc::new(LocalNode::new(Params::regtest(), beats.clone(), vec![0xab, 0xcd]));
    let orchestrator = Orchestrator::new(fast_config(), node.clone(), node.clone(), beats, manager());
    (node, orchestrator)
}

fn trigger_after(interrupt: Interrupt, delay: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(delay);
        interrupt.trigger();
    })
}

#[test]
fn test_first_round_anchors_to_latest_beat() {
    let beats = StaticBeats::with_tip(beat(1));
    let (node, mut orchestrator) = setup(beats);

    let outcome = orchestrator.run_round().unwrap();

    let tip = node.tip();
    assert_eq!(outcome, RoundOutcome::Mined { hash: tip.hash, accepted: true });
    assert_eq!(tip.height, 1);
    assert_eq!(tip.beat_hash, beat(1).hash);

    let coinbases = orchestrator.coinbases();
    assert_eq!(coinbases.len(), 1);
    assert_eq!(coinbases[0].outputs[0].script_public_key, vec![0xab, 0xcd]);
    assert_eq!(coinbases[0].extra_nonce(), Some(1));
}

#[test]
fn test_next_round_waits_for_successor_beat() {
    let beats = StaticBeats::with_tip(beat(1));
    let (node, mut orchestrator) = setup(beats.clone());
    orchestrator.run_round().unwrap();

    let publisher = {
        let beats = beats.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            beats.push(beat(2));
        })
    };

    let started = Instant::now();
    let outcome = orchestrator.run_round().unwrap();
    publisher.join().unwrap();

    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(matches!(outcome, RoundOutcome::Mined { accepted: true, .. }));
    assert_eq!(node.height(), 2);
    assert_eq!(node.tip().beat_hash, beat(2).hash);
    assert_eq!(orchestrator.coinbases().len(), 2);
}

#[test]
fn test_interrupt_ends_beat_wait() {
    let beats = StaticBeats::with_tip(beat(1));
    let (node, mut orchestrator) = setup(beats);
    orchestrator.run_round().unwrap();

    let trigger = trigger_after(orchestrator.interrupt().clone(), Duration::from_millis(100));
    assert_eq!(orchestrator.run_round().unwrap(), RoundOutcome::Interrupted);
    trigger.join().unwrap();

    // Loop exits straight away once interrupted
    assert!(orchestrator.run().is_ok());
    assert_eq!(node.height(), 1);
}

#[test]
fn test_metronome_failure_fails_only_the_round() {
    let beats = StaticBeats::with_tip(beat(1));
    let (_node, mut orchestrator) = setup(beats.clone());

    beats.fail_next(1);
    let err = orchestrator.run_round().unwrap_err();
    assert!(matches!(err, MiningError::Metronome(MetronomeError::Connect(_))));
    assert!(!err.is_fatal());

    assert!(matches!(orchestrator.run_round().unwrap(), RoundOutcome::Mined { accepted: true, .. }));
}

#[test]
fn test_run_recovers_from_failed_rounds_and_saves_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(BeatCache::new(dir.path().join("metronomes.dat"), Params::regtest().magic));

    let beats = StaticBeats::with_tip(beat(1));
    let (node, orchestrator) = setup(beats.clone());
    let mut orchestrator = orchestrator.with_cache(cache.clone());
    beats.fail_next(3);

    let interrupt = orchestrator.interrupt().clone();
    let watcher = {
        let node = node.clone();
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(30);
            while node.height() < 1 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            thread::sleep(Duration::from_millis(50));
            interrupt.trigger();
        })
    };

    orchestrator.run().unwrap();
    watcher.join().unwrap();

    assert_eq!(node.height(), 1);
    assert_eq!(orchestrator.coinbases().len(), 1);
    // Three failed rounds, one mined, one interrupted
    assert_eq!(orchestrator.rounds(), 5);
    assert!(cache.path().exists());
}

#[test]
fn test_fatal_error_stops_the_loop() {
    let beats = StaticBeats::with_tip(beat(1));
    let node = Arc::new(LocalNode::new(Params::regtest(), beats.clone(), vec![0x51]));
    let mut orchestrator = Orchestrator::new(fast_config(), node, Arc::new(BrokenAssembler), beats, manager());

    let err = orchestrator.run().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, MiningError::Retarget(RetargetError::MissingBeat { height: 5, .. })));
    assert_eq!(orchestrator.rounds(), 1);
}

fn scripted(peers: usize) -> (Arc<ScriptedChain>, Orchestrator, OrchestratorConfig) {
    let chain = Arc::new(ScriptedChain { peers: AtomicUsize::new(peers), height: AtomicU64::new(0) });
    let beats = StaticBeats::with_tip(beat(1));
    let node = Arc::new(LocalNode::new(Params::regtest(), beats.clone(), vec![0x51]));
    let config = OrchestratorConfig {
        resync_threshold: Duration::from_millis(50),
        stability_window: Duration::from_millis(150),
        ..fast_config()
    };
    let orchestrator = Orchestrator::new(config.clone(), chain.clone(), node, beats, manager());
    (chain, orchestrator, config)
}

#[test]
fn test_connected_node_does_not_wait() {
    let (_chain, orchestrator, _) = scripted(3);

    let started = Instant::now();
    assert!(orchestrator.wait_for_network());
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_long_offline_waits_for_stable_height() {
    let (chain, orchestrator, config) = scripted(0);

    let driver = {
        let chain = chain.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(80));
            chain.peers.store(2, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(40));
            chain.height.store(7, Ordering::SeqCst);
        })
    };

    let started = Instant::now();
    assert!(orchestrator.wait_for_network());
    driver.join().unwrap();

    // Height moved at 120ms, then had to hold still for the whole window
    assert!(started.elapsed() >= Duration::from_millis(120) + config.stability_window);
}

#[test]
fn test_interrupt_ends_peer_wait() {
    let (_chain, orchestrator, _) = scripted(0);

    let trigger = trigger_after(orchestrator.interrupt().clone(), Duration::from_millis(50));
    assert!(!orchestrator.wait_for_network());
    trigger.join().unwrap();
}
