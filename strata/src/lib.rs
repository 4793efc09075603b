pub mod domain;
pub mod metrics;
pub mod ports;
pub mod simulate;
pub mod strategy;
pub mod writeback;

#[cfg(test)]
pub(crate) mod testutil;
