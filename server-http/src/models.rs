use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use strata::domain::{Product, ProductId, ReadOutcome};
use strata::metrics::StrategySnapshot;
use strata::simulate::SimulationReport;
use strata::strategy::StrategyKind;

// === Product Operation Models ===

#[derive(Deserialize)]
pub struct StrategyQuery {
    #[serde(default)]
    pub strategy: Option<String>,
}

impl StrategyQuery {
    /// Cache-aside is the default when no strategy is named.
    pub fn id(&self) -> &str {
        self.strategy.as_deref().unwrap_or("cache_aside")
    }
}

/// Incoming product body. Fields are optional so missing ones surface as a
/// validation error rather than a deserialization rejection.
#[derive(Deserialize)]
pub struct ProductRequest {
    pub id: Option<ProductId>,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductRequest {
    pub fn into_product(self) -> Result<Product> {
        let id = self
            .id
            .ok_or_else(|| Error::Validation("missing field 'id'".to_string()))?;
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::Validation("missing or empty field 'name'".to_string()))?;
        let price = self
            .price
            .ok_or_else(|| Error::Validation("missing field 'price'".to_string()))?;
        if !price.is_finite() || price < 0.0 {
            return Err(Error::Validation(
                "'price' must be a non-negative number".to_string(),
            ));
        }
        Ok(Product::new(id, name, price, self.description.unwrap_or_default()))
    }
}

#[derive(Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub strategy: StrategyKind,
    pub outcome: ReadOutcome,
}

// === Metrics Models ===

#[derive(Serialize)]
pub struct MetricsResponse {
    pub strategies: Vec<StrategySnapshot>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// === Simulation Models ===

#[derive(Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default = "default_reads")]
    pub reads: u64,
    #[serde(default = "default_writes")]
    pub writes: u64,
}

#[derive(Deserialize)]
pub struct CompareRequest {
    #[serde(default = "default_reads")]
    pub reads: u64,
    #[serde(default = "default_writes")]
    pub writes: u64,
}

fn default_reads() -> u64 {
    100
}

fn default_writes() -> u64 {
    20
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub reads: u64,
    pub writes: u64,
    pub results: Vec<SimulationReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: Option<u64>, name: Option<&str>, price: Option<f64>) -> ProductRequest {
        ProductRequest {
            id,
            name: name.map(String::from),
            price,
            description: None,
        }
    }

    #[test]
    fn complete_request_validates() {
        let product = request(Some(1), Some("Widget"), Some(9.5))
            .into_product()
            .unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.description, "");
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        assert!(matches!(
            request(None, Some("Widget"), Some(1.0)).into_product(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            request(Some(1), None, Some(1.0)).into_product(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            request(Some(1), Some("  "), Some(1.0)).into_product(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            request(Some(1), Some("Widget"), None).into_product(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn price_must_be_finite_and_non_negative() {
        assert!(request(Some(1), Some("Widget"), Some(-0.01)).into_product().is_err());
        assert!(request(Some(1), Some("Widget"), Some(f64::NAN)).into_product().is_err());
        assert!(request(Some(1), Some("Widget"), Some(0.0)).into_product().is_ok());
    }

    #[test]
    fn strategy_query_defaults_to_cache_aside() {
        let query = StrategyQuery { strategy: None };
        assert_eq!(query.id(), "cache_aside");
        let query = StrategyQuery {
            strategy: Some("write_back".to_string()),
        };
        assert_eq!(query.id(), "write_back");
    }
}
