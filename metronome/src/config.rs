use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::MetronomeError;

pub const DEFAULT_METRONOME_ADDR: &str = "127.0.0.1";
pub const DEFAULT_METRONOME_PORT: u16 = 8332;
pub const DEFAULT_HTTP_CLIENT_TIMEOUT_SECS: u64 = 900;

/// Connection settings for the metronome node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// When set, calls go to `/wallet/<name>`
    pub wallet: Option<String>,
    /// Connect and read timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_METRONOME_ADDR.to_string(),
            port: DEFAULT_METRONOME_PORT,
            user: String::new(),
            password: String::new(),
            wallet: None,
            timeout_secs: DEFAULT_HTTP_CLIENT_TIMEOUT_SECS,
        }
    }
}

impl MetronomeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Root or wallet-scoped endpoint URL
    pub fn endpoint(&self) -> Result<Url, MetronomeError> {
        let mut url = Url::parse(&format!("http://{}:{}/", self.host, self.port))
            .map_err(|e| MetronomeError::InvalidEndpoint(e.to_string()))?;

        if let Some(wallet) = self.wallet.as_deref().filter(|w| !w.is_empty()) {
            url.path_segments_mut()
                .map_err(|_| MetronomeError::InvalidEndpoint("uri-encode failed".to_string()))?
                .pop_if_empty()
                .push("wallet")
                .push(wallet);
        }

        Ok(url)
    }
}
