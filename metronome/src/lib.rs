//! Metronome client
//!
//! The metronome is an external chain whose block timestamps ("beats") pace
//! local mining. This crate fetches beats over authenticated JSON-RPC and keeps
//! them in a durable, checksummed cache.
//!
//! - [`beat`]: the [`Beat`] record
//! - [`cache`]: [`BeatCache`], the `metronomes.dat` store
//! - [`transport`]: JSON-RPC over HTTP and reply classification
//! - [`client`]: [`MetronomeClient`] with bounded retry and read-through caching

pub mod beat;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;

pub use beat::Beat;
pub use cache::{BeatCache, CACHE_FILE_NAME};
pub use client::{BeatSource, MetronomeClient, MAX_RETRIES};
pub use config::MetronomeConfig;
pub use errors::{CacheError, MetronomeError};
pub use transport::{HttpTransport, RpcTransport};

pub use crypto_hashes::Hash;
