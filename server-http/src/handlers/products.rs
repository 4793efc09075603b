use crate::error::ApiError;
use crate::models::{ProductRequest, ProductResponse, StrategyQuery};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use strata::domain::{Product, ProductId};
use strata::ports::RecordStore;
use tracing::{info, warn};

/// GET /products/:id?strategy=s
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<StrategyQuery>,
) -> Result<Json<ProductResponse>, ApiError> {
    let engine = state.registry.resolve(query.id())?;
    info!(id, strategy = %engine.kind(), "GET /products");

    let (product, outcome) = engine.read(id).await?;
    Ok(Json(ProductResponse {
        product,
        strategy: engine.kind(),
        outcome,
    }))
}

/// POST /products?strategy=s
///
/// 201 when the record was absent from the durable store, 200 otherwise.
/// Under write-back the existence check runs before the write is queued,
/// matching the synchronous variants.
pub async fn upsert_product(
    State(state): State<AppState>,
    Query(query): Query<StrategyQuery>,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let engine = state.registry.resolve(query.id())?;
    let product = body.into_product()?;
    info!(id = product.id, strategy = %engine.kind(), "POST /products");

    let existed = existed_before(state.registry.record_store().as_ref(), product.id).await;

    engine.write(product.id, product.clone()).await?;

    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(product)))
}

/// Whether the record is already in the durable store. A failed lookup is
/// logged and treated as a new record so the write itself still decides
/// whether the store is reachable.
async fn existed_before(store: &dyn RecordStore, id: ProductId) -> bool {
    match store.exists(id).await {
        Ok(existed) => existed,
        Err(err) => {
            warn!(id, error = %err, "existence check failed, treating as new record");
            false
        }
    }
}
