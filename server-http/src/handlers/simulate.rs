use crate::error::ApiError;
use crate::models::{CompareRequest, CompareResponse, SimulateRequest};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use strata::simulate::{run_simulation, SimulationReport};
use strata::strategy::StrategyKind;
use tracing::info;

/// POST /simulate
pub async fn simulate(
    State(state): State<AppState>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulationReport>, ApiError> {
    let id = req
        .strategy
        .as_deref()
        .ok_or_else(|| shared::Error::Validation("missing field 'strategy'".to_string()))?;
    let kind: StrategyKind = id.parse()?;
    let report = run_simulation(
        &state.registry,
        Some(&state.flusher),
        kind,
        req.reads,
        req.writes,
    )
    .await?;
    Ok(Json(report))
}

/// POST /compare
///
/// Runs the same workload against all five strategies. Before each run the
/// pending queue is drained and the cache cleared, so every strategy starts
/// cold and the hit rates are comparable.
pub async fn compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let mut results = Vec::with_capacity(StrategyKind::ALL.len());

    for kind in StrategyKind::ALL {
        info!(strategy = %kind, "comparing strategy");
        state.flusher.flush_now().await;
        state.registry.cache().clear().await?;

        results.push(
            run_simulation(
                &state.registry,
                Some(&state.flusher),
                kind,
                req.reads,
                req.writes,
            )
            .await?,
        );
    }

    Ok(Json(CompareResponse {
        reads: req.reads,
        writes: req.writes,
        results,
    }))
}
