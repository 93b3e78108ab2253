#[macro_use]
extern crate log;

pub mod cache;
pub mod memcache;
pub mod memory_store;
pub mod server;
pub mod version;

#[cfg(test)]
mod mock;
