mod moka_cache;
mod sled_store;

pub use moka_cache::MokaCache;
pub use sled_store::SledStore;
