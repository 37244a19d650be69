use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "beatpad")]
#[command(about = "Beat-synchronized mining daemon", long_about = None)]
pub struct Args {
    /// Path to configuration file (optional, uses defaults if not provided)
    #[arg(short, long)]
    pub config_path: Option<PathBuf>,

    /// Data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Network (mainnet, testnet, regtest)
    #[arg(short, long)]
    pub network: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Metronome node address
    #[arg(long)]
    pub metronome_addr: Option<String>,

    /// Metronome node RPC port
    #[arg(long)]
    pub metronome_port: Option<u16>,

    /// Metronome RPC username
    #[arg(long)]
    pub metronome_user: Option<String>,

    /// Metronome RPC password
    #[arg(long)]
    pub metronome_password: Option<String>,

    /// Metronome wallet to scope RPC calls to
    #[arg(long)]
    pub metronome_wallet: Option<String>,

    /// Timeout in seconds for metronome RPC calls
    #[arg(long)]
    pub rpc_client_timeout: Option<u64>,

    /// Number of mining threads
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Hex-encoded script the coinbase pays to
    #[arg(long)]
    pub pay_address: Option<String>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
