//! Tests for a full mining round
//!
//! These exercise partitioning, the worker search loop and the manager
//! together against an in-memory chain view.

#[cfg(test)]
mod tests {
    use crate::job::{partition_nonce_space, NONCE_SPACE};
    use crate::manager::{MiningConfig, MiningManager};
    use crate::node::{ChainTip, ChainView};
    use crate::pow::ProofOfWork;
    use crate::session::Interrupt;
    use crate::worker::WorkerOutcome;
    use consensus_core::block::Block;
    use consensus_core::config::Params;
    use consensus_core::header::Header;
    use consensus_core::tx::Transaction;
    use consensus_core::Hash;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    const EASY_BITS: u32 = 0x207fffff;
    const HARD_BITS: u32 = 0x1d00ffff;

    struct MockChain {
        tip: Mutex<ChainTip>,
        peers: AtomicUsize,
        relaxed_bits: Mutex<Option<u32>>,
    }

    impl MockChain {
        fn new(tip_hash: Hash, peers: usize) -> Arc<Self> {
            Arc::new(Self {
                tip: Mutex::new(ChainTip { hash: tip_hash, height: 10, time: 1_700_000_000, beat_hash: Hash::zeroed() }),
                peers: AtomicUsize::new(peers),
                relaxed_bits: Mutex::new(None),
            })
        }

        fn set_tip(&self, hash: Hash) {
            self.tip.lock().unwrap().hash = hash;
        }
    }

    impl ChainView for MockChain {
        fn tip(&self) -> ChainTip {
            self.tip.lock().unwrap().clone()
        }

        fn adjusted_time(&self) -> i64 {
            1_700_000_060
        }

        fn peer_count(&self) -> usize {
            self.peers.load(Ordering::SeqCst)
        }

        fn work_required_at(&self, _time: i64) -> Option<u32> {
            *self.relaxed_bits.lock().unwrap()
        }
    }

    fn parent() -> Hash {
        Hash::from_le_u64([10, 0, 0, 0])
    }

    fn candidate(bits: u32) -> Block {
        let coinbase = Transaction::new_coinbase(11, 1, vec![0x51], 50);
        let header = Header::new(4, parent(), Hash::zeroed(), Hash::from_le_u64([7, 7, 0, 0]), 1_700_000_030, bits, 0);
        let mut block = Block::new(header, vec![coinbase]);
        block.refresh_merkle_root();
        block
    }

    fn manager(workers: usize) -> MiningManager {
        MiningManager::new(MiningConfig { num_workers: workers, ..Default::default() }, Interrupt::new())
    }

    // ==================== Partition Tests ====================

    #[test]
    fn test_partition_covers_nonce_space() {
        for workers in 1..=17 {
            let ranges = partition_nonce_space(workers);
            assert_eq!(ranges.len(), workers);
            assert_eq!(ranges[0].start, 0);
            assert_eq!(ranges[workers - 1].end, NONCE_SPACE);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start, "gap or overlap with {} workers", workers);
            }
            let total: u64 = ranges.iter().map(|r| r.len()).sum();
            assert_eq!(total, NONCE_SPACE);
        }
    }

    // ==================== Round Tests ====================

    #[test]
    fn test_round_finds_single_winner() {
        let chain = MockChain::new(parent(), 1);
        let result = manager(4).mine(candidate(EASY_BITS), chain);

        let winner = result.winner.expect("easy target should be solved");
        assert!(ProofOfWork::is_valid_pow(&winner.block.header));
        assert!(ProofOfWork::check_proof_of_work(&winner.block_hash, EASY_BITS, Params::regtest().pow_limit));
        assert_eq!(winner.block.header.prev_block_hash, parent());
        assert_eq!(result.outcomes.iter().filter(|o| **o == WorkerOutcome::Found).count(), 1);
        assert_eq!(result.outcomes[winner.worker_id], WorkerOutcome::Found);
    }

    #[test]
    fn test_refreshed_time_can_relax_bits() {
        let chain = MockChain::new(parent(), 1);
        *chain.relaxed_bits.lock().unwrap() = Some(EASY_BITS);

        let result = manager(2).mine(candidate(HARD_BITS), chain);

        let winner = result.winner.expect("relaxed target should be solved");
        assert_eq!(winner.block.header.bits, EASY_BITS);
        assert_eq!(winner.block.header.time, 1_700_000_060);
        assert!(ProofOfWork::is_valid_pow(&winner.block.header));
    }

    #[test]
    fn test_stale_tip_is_never_claimed() {
        // every nonce is likely a solution, but the parent is no longer the tip
        let chain = MockChain::new(Hash::from_le_u64([99, 0, 0, 0]), 1);
        let result = manager(3).mine(candidate(EASY_BITS), chain);

        assert!(result.winner.is_none());
        assert!(result.is_stale());
        assert!(result.outcomes.iter().all(|o| *o == WorkerOutcome::Stale));
    }

    #[test]
    fn test_tip_moving_mid_search_abandons_round() {
        let chain = MockChain::new(parent(), 1);
        let mover = Arc::clone(&chain);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            mover.set_tip(Hash::from_le_u64([11, 0, 0, 0]));
        });

        let result = manager(2).mine(candidate(HARD_BITS), chain);
        handle.join().unwrap();

        assert!(result.winner.is_none());
        assert!(result.outcomes.iter().all(|o| *o == WorkerOutcome::Stale));
    }

    #[test]
    fn test_interrupt_cancels_promptly() {
        let manager = manager(4);
        let interrupt = manager.interrupt().clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            interrupt.trigger();
        });

        let started = Instant::now();
        let result = manager.mine(candidate(HARD_BITS), MockChain::new(parent(), 1));
        handle.join().unwrap();

        assert!(result.winner.is_none());
        assert!(result.outcomes.iter().all(|o| *o == WorkerOutcome::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_interrupt_before_round() {
        let manager = manager(2);
        manager.interrupt().trigger();

        let result = manager.mine(candidate(EASY_BITS), MockChain::new(parent(), 1));
        assert!(result.winner.is_none());
        assert_eq!(result.outcomes, vec![WorkerOutcome::Cancelled; 2]);
    }

    #[test]
    fn test_find_without_peers_is_discarded() {
        let chain = MockChain::new(parent(), 0);
        let result = manager(2).mine(candidate(EASY_BITS), chain);

        assert!(result.winner.is_none());
        assert!(result.outcomes.contains(&WorkerOutcome::Disconnected));
        assert!(!result.outcomes.contains(&WorkerOutcome::Found));
    }

    #[test]
    fn test_session_stats_accumulate() {
        let manager = manager(2);
        let chain = MockChain::new(parent(), 1);
        manager.mine(candidate(EASY_BITS), chain.clone());
        manager.mine(candidate(EASY_BITS), chain);

        let stats = manager.get_session_stats();
        assert_eq!(stats.rounds, 2);
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.worker_count, 2);
    }
}
