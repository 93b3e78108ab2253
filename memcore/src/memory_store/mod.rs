pub mod lru_store;
pub mod parallelism;
