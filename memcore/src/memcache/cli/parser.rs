use crate::cache::eviction_policy::EvictionPolicy;
use crate::version;
use byte_unit::{Byte, Unit};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "memcored",
    version = version::MEMCORE_VERSION,
    about = "memcored - memcached compatible in-memory cache engine",
    long_about = None
)]
pub struct MemcoredConfig {
    /// item memory in megabytes, or with a unit suffix e.g. 512KiB, 2GB
    #[arg(short, long, value_parser = parse_memory_limit, default_value = "64")]
    pub memory_limit: u64,

    /// max number of items kept in the cache, unlimited if not set
    #[arg(long)]
    pub max_items: Option<u64>,

    /// what to do when the cache is full
    #[arg(short, long, value_enum, default_value_t = EvictionPolicy::LeastRecentlyUsed)]
    pub eviction_policy: EvictionPolicy,

    /// number of independently locked store segments, derived from
    /// available parallelism if not set
    #[arg(short, long)]
    pub segments: Option<usize>,

    /// seconds between expired items sweeps, 0 disables the sweeper
    #[arg(long, default_value_t = 1)]
    pub sweep_interval: u64,

    /// seconds between stats log lines, 0 disables the reporter
    #[arg(long, default_value_t = 60)]
    pub stats_interval: u64,

    /// sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl MemcoredConfig {
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval > 0).then(|| Duration::from_secs(self.stats_interval))
    }
}

/// Plain number means megabytes, memcached style
fn parse_memory_limit(value: &str) -> Result<u64, String> {
    let bytes = match value.parse::<u64>() {
        Ok(megabytes) => Byte::from_u64_with_unit(megabytes, Unit::MiB)
            .ok_or_else(|| format!("Memory limit too big: {}", value))?,
        Err(_) => Byte::parse_str(value, true).map_err(|err| err.to_string())?,
    };
    match bytes.as_u64() {
        0 => Err(String::from("Memory limit has to be greater than 0")),
        limit => Ok(limit),
    }
}

pub fn get_log_level(verbose: u8) -> tracing::Level {
    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
    match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

pub fn parse(args: Vec<String>) -> Result<MemcoredConfig, String> {
    MemcoredConfig::try_parse_from(args).map_err(|err| err.to_string())
}
