/// Current block version
pub const BLOCK_VERSION: i32 = 4;

/// Number of base units in one coin
pub const COIN: u64 = 100_000_000;

/// Initial block reward in coins
pub const INITIAL_BLOCK_REWARD: u64 = 50;

/// Block subsidy halving interval (in blocks)
pub const SUBSIDY_HALVING_INTERVAL: u64 = 210_000;

/// Size of the fixed network magic that prefixes persisted files
pub const MAGIC_SIZE: usize = 4;
