//! Terminal output for the daemon: banner, configuration summary and
//! component status lines.

use std::fmt;
use std::time::Duration;

/// ANSI color codes
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
}

/// Print startup banner
pub fn print_banner(version: &str, network: &str) {
    println!();
    println!("{}╔══════════════════════════════════════════════════════════════╗{}", colors::BRIGHT_CYAN, colors::RESET);
    println!("{}║{}          {}BEATPAD - BEAT-SYNCHRONIZED MINER v{:<8}{}        {}║{}",
        colors::BRIGHT_CYAN, colors::RESET, colors::BOLD, version, colors::RESET, colors::BRIGHT_CYAN, colors::RESET);
    println!("{}║{}  Network: {}{:<50}{}  {}║{}",
        colors::BRIGHT_CYAN, colors::RESET, colors::BRIGHT_GREEN, network, colors::RESET, colors::BRIGHT_CYAN, colors::RESET);
    println!("{}╚══════════════════════════════════════════════════════════════╝{}", colors::BRIGHT_CYAN, colors::RESET);
    println!();
}

/// Print status line with icon and color
pub fn print_status(icon: &str, message: &str, status: StatusType) {
    let color = match status {
        StatusType::Success => colors::BRIGHT_GREEN,
        StatusType::Error => colors::BRIGHT_RED,
    };
    println!("{}{} {}{}", color, icon, message, colors::RESET);
}

/// Status types for colored output
#[derive(Debug, Clone, Copy)]
pub enum StatusType {
    Success,
    Error,
}

/// Print a section header
pub fn print_section(title: &str) {
    println!();
    println!("{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}", colors::DIM, colors::RESET);
    println!("{}  {}{}{}", colors::BRIGHT_CYAN, colors::BOLD, title, colors::RESET);
    println!("{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}", colors::DIM, colors::RESET);
    println!();
}

/// Print key-value pair in a formatted way
pub fn print_kv(key: &str, value: &str) {
    println!("  {}{}:{}{} {}{}{}",
        colors::BRIGHT_WHITE, key, colors::RESET, colors::DIM,
        colors::BRIGHT_CYAN, value, colors::RESET);
}

/// Print configuration summary. The RPC password is never shown.
pub fn print_config_summary(config: &crate::config::Config) {
    print_section("Configuration");

    print_kv("Network", &config.network.network_id);
    print_kv("Data Directory", &config.storage.data_dir.display().to_string());
    print_kv("Metronome", &format!("{}:{}", config.metronome.host, config.metronome.port));
    if let Some(wallet) = &config.metronome.wallet {
        print_kv("Metronome Wallet", wallet);
    }
    print_kv("RPC Timeout", &format_duration(config.metronome.timeout()));
    print_kv("Mining Threads", &config.mining_config().num_workers.to_string());
    print_kv("Pay Address", config.mining.pay_address.as_deref().unwrap_or("OP_TRUE"));
}

/// Print component status
pub fn print_component_status(component: &str, status: ComponentStatus) {
    let (icon, color, text) = match status {
        ComponentStatus::Starting => ("⏳", colors::BRIGHT_YELLOW, "Starting"),
        ComponentStatus::Running => ("✓", colors::BRIGHT_GREEN, "Running"),
        ComponentStatus::Stopped => ("✗", colors::BRIGHT_RED, "Stopped"),
    };

    println!("  {}[{}]{} {:<20} {}", color, icon, colors::RESET, component, text);
}

#[derive(Debug, Clone, Copy)]
pub enum ComponentStatus {
    Starting,
    Running,
    Stopped,
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;
        format!("{}h {}m {}s", hours, minutes, seconds)
    }
}

/// Format hashrate as human-readable string
pub fn format_hashrate(hashrate: f64) -> String {
    if hashrate >= 1e12 {
        format!("{:.2} TH/s", hashrate / 1e12)
    } else if hashrate >= 1e9 {
        format!("{:.2} GH/s", hashrate / 1e9)
    } else if hashrate >= 1e6 {
        format!("{:.2} MH/s", hashrate / 1e6)
    } else if hashrate >= 1e3 {
        format!("{:.2} KH/s", hashrate / 1e3)
    } else {
        format!("{:.2} H/s", hashrate)
    }
}

/// Miner summary printed at shutdown
#[derive(Debug, Clone)]
pub struct MinerStatus {
    pub uptime: Duration,
    pub height: u64,
    pub rounds: u64,
    pub blocks_mined: usize,
    pub cached_beats: usize,
    pub hashrate: f64,
}

impl fmt::Display for MinerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}Miner Status:{}", colors::BOLD, colors::RESET)?;
        writeln!(f, "  Uptime:       {}", format_duration(self.uptime))?;
        writeln!(f, "  Chain Height: {}", self.height)?;
        writeln!(f, "  Rounds:       {}", self.rounds)?;
        writeln!(f, "  Blocks Mined: {}", self.blocks_mined)?;
        writeln!(f, "  Cached Beats: {}", self.cached_beats)?;
        write!(f, "  Hashrate:     {}", format_hashrate(self.hashrate))
    }
}
