mod health;
mod metrics;
mod products;
mod simulate;

pub use health::health_check;
pub use metrics::{get_metrics, reset_metrics};
pub use products::{get_product, upsert_product};
pub use simulate::{compare, simulate};
