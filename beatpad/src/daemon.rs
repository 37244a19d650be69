//! Daemon - owns the beat cache, metronome client, local node and mining
//! loop for the life of the process

use crate::config::Config;
use crate::errors::DaemonError;
use crate::local_node::LocalNode;
use crate::orchestrator::Orchestrator;
use crate::shutdown::ShutdownController;
use crate::ui::{self, ComponentStatus, MinerStatus};
use metronome::{BeatCache, BeatSource, MetronomeClient};
use mining::{BlockAssembler, ChainView, Interrupt, MiningManager};
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct Daemon {
    config: Config,
    cache: Arc<BeatCache>,
    node: Arc<LocalNode>,
    orchestrator: Orchestrator,
    shutdown: Arc<ShutdownController>,
    start_time: Instant,
}

impl Daemon {
    /// Build every component. Runs outside any async runtime since the
    /// metronome client blocks.
    pub fn new(config: Config) -> Result<Self, DaemonError> {
        ui::print_section("Initializing Components");

        let params = config.params()?;
        let script_public_key = config.pay_script()?;

        ui::print_component_status("Beat Cache", ComponentStatus::Starting);
        fs::create_dir_all(&config.storage.data_dir)?;
        let cache = Arc::new(BeatCache::open(&config.storage.data_dir, params.magic));
        ui::print_component_status("Beat Cache", ComponentStatus::Running);

        ui::print_component_status("Metronome Client", ComponentStatus::Starting);
        let beats: Arc<dyn BeatSource> = Arc::new(MetronomeClient::connect(&config.metronome, Arc::clone(&cache))?);
        ui::print_component_status("Metronome Client", ComponentStatus::Running);

        let node = Arc::new(LocalNode::new(params, Arc::clone(&beats), script_public_key));
        ui::print_component_status("Local Node", ComponentStatus::Running);

        let interrupt = Interrupt::new();
        let manager = MiningManager::new(config.mining_config(), interrupt.clone());
        let orchestrator = Orchestrator::new(
            config.orchestrator_config(),
            Arc::clone(&node) as Arc<dyn ChainView>,
            Arc::clone(&node) as Arc<dyn BlockAssembler>,
            beats,
            manager,
        )
        .with_cache(Arc::clone(&cache));

        let shutdown = Arc::new(ShutdownController::new(interrupt, config.shutdown_grace()));

        Ok(Self { config, cache, node, orchestrator, shutdown, start_time: Instant::now() })
    }

    /// Mine until a shutdown signal or a fatal error
    pub fn run(self) -> Result<(), DaemonError> {
        let Self { config, cache, node, mut orchestrator, shutdown, start_time } = self;

        // Signals are the only async work; mining stays on this thread
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("beatpad-signals")
            .enable_all()
            .build()?;
        let listener = Arc::clone(&shutdown);
        runtime.spawn(async move { listener.wait_for_signal().await });

        ui::print_section("Mining");
        ui::print_component_status("Mining Loop", ComponentStatus::Running);
        info!("Mining on {} from height {}", config.network.network_id, node.height());

        let result = orchestrator.run();

        shutdown.shutdown();
        runtime.shutdown_timeout(config.shutdown_grace());
        ui::print_component_status("Mining Loop", ComponentStatus::Stopped);

        if let Err(e) = cache.close() {
            warn!("Failed to save beat cache on shutdown: {}", e);
        }

        let stats = orchestrator.manager().get_session_stats();
        let status = MinerStatus {
            uptime: start_time.elapsed(),
            height: node.height(),
            rounds: orchestrator.rounds(),
            blocks_mined: orchestrator.coinbases().len(),
            cached_beats: cache.len(),
            hashrate: stats.overall_hash_rate,
        };
        println!("{}", status);

        result.map_err(DaemonError::from)
    }
}
