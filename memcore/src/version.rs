pub const MEMCORE_VERSION: &str = env!("CARGO_PKG_VERSION");
