use beatpad::{cli, ui, Config, Daemon};
use std::process;
use tracing::{error, info};

/// Initialization failed before the mining loop started
const EXIT_INIT_FAILURE: i32 = 1;
/// The mining loop stopped on an unrecoverable error
const EXIT_RUNTIME_FAILURE: i32 = 2;

fn main() {
    // Parse command line arguments
    let args = cli::parse_args();

    // Initialize logging
    init_logging(&args);

    // Load configuration (use defaults unless config file is provided)
    let mut config = match &args.config_path {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => fail(&format!("Failed to load configuration: {}", e), EXIT_INIT_FAILURE),
        },
        None => Config::default(),
    };

    // Apply CLI overrides
    config.apply_cli_overrides(&args);

    ui::print_banner(env!("CARGO_PKG_VERSION"), &config.network.network_id);
    ui::print_config_summary(&config);

    let daemon = match Daemon::new(config) {
        Ok(d) => d,
        Err(e) => fail(&format!("Failed to initialize daemon: {}", e), EXIT_INIT_FAILURE),
    };

    if let Err(e) = daemon.run() {
        fail(&format!("Daemon error: {}", e), EXIT_RUNTIME_FAILURE);
    }

    ui::print_status("✓", "Beatpad stopped gracefully", ui::StatusType::Success);
    info!("Beatpad stopped gracefully");
}

fn fail(message: &str, code: i32) -> ! {
    ui::print_status("✗", message, ui::StatusType::Error);
    error!("{}", message);
    process::exit(code);
}

fn init_logging(args: &cli::Args) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt().with_env_filter(filter).with_target(true).with_thread_ids(true).init();
}
