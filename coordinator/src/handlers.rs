use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{
    routes, Ack, DoneResponse, FinishedMapRequest, FinishedReduceRequest, JobStatusReport,
    MapTaskResponse, ReduceTaskResponse,
};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::state::{Coordinator, CoordinatorError};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    /// Errores que terminan el job; el launcher sale con el primero.
    pub fatal_tx: mpsc::UnboundedSender<CoordinatorError>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health))
        .route(routes::MAP_NEXT, post(get_map_task))
        .route(routes::MAP_FINISHED, post(finished_map_task))
        .route(routes::REDUCE_NEXT, post(get_reduce_task))
        .route(routes::REDUCE_FINISHED, post(finished_reduce_task))
        .route(routes::DONE, get(done))
        .route(routes::STATUS, get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

async fn get_map_task(State(state): State<AppState>) -> Json<MapTaskResponse> {
    Json(state.coordinator.get_map_task())
}

async fn finished_map_task(
    State(state): State<AppState>,
    Json(req): Json<FinishedMapRequest>,
) -> Result<Json<Ack>, StatusCode> {
    let result = state.coordinator.finished_map_task(&req);
    into_ack(&state, result)
}

async fn get_reduce_task(State(state): State<AppState>) -> Json<ReduceTaskResponse> {
    Json(state.coordinator.get_reduce_task())
}

async fn finished_reduce_task(
    State(state): State<AppState>,
    Json(req): Json<FinishedReduceRequest>,
) -> Result<Json<Ack>, StatusCode> {
    let result = state.coordinator.finished_reduce_task(&req);
    into_ack(&state, result)
}

async fn done(State(state): State<AppState>) -> Json<DoneResponse> {
    Json(DoneResponse {
        done: state.coordinator.done(),
    })
}

async fn status(State(state): State<AppState>) -> Json<JobStatusReport> {
    Json(state.coordinator.status())
}

fn into_ack(
    state: &AppState,
    result: Result<(), CoordinatorError>,
) -> Result<Json<Ack>, StatusCode> {
    match result {
        Ok(()) => Ok(Json(Ack { ok: true })),
        Err(e) if e.is_fatal() => {
            error!("violación de protocolo, abortando el job: {}", e);
            let _ = state.fatal_tx.send(e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            warn!("reporte rechazado: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
