use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// refuse new items once memory is exhausted
    None,
    /// evict least recently used items
    #[value(alias = "lru")]
    LeastRecentlyUsed,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::None => "None",
            EvictionPolicy::LeastRecentlyUsed => "LRU",
        }
    }
}
