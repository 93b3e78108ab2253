pub mod builder;
pub mod cli;
pub mod shared_store_state;
pub mod stats;
pub mod store;
