use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::resilience::{CircuitSnapshot, CircuitState};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub routes: usize,
    pub circuit_breaker_enabled: bool,
    pub open_circuits: usize,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub address: String,
    pub role: &'static str,
}

#[derive(Serialize)]
pub struct RouteStatus {
    pub name: String,
    pub load_balancer: &'static str,
    pub degraded: bool,
    pub backends: Vec<BackendStatus>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let open_circuits = state
        .circuit_breaker
        .snapshot()
        .iter()
        .filter(|c| c.state == CircuitState::Open)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        routes: state.routes.len(),
        circuit_breaker_enabled: state.circuit_enabled,
        open_circuits,
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteStatus>> {
    let routes = state
        .balancers
        .iter()
        .map(|(name, balancer)| {
            let set = balancer.backends();
            RouteStatus {
                name: name.to_string(),
                load_balancer: balancer.kind(),
                degraded: set.is_degraded(),
                backends: set
                    .as_slice()
                    .iter()
                    .enumerate()
                    .map(|(i, b)| BackendStatus {
                        address: b.to_string(),
                        role: match i {
                            0 => "primary",
                            1 => "backup",
                            _ => "unused",
                        },
                    })
                    .collect(),
            }
        })
        .collect();

    Json(routes)
}

pub async fn get_circuits(State(state): State<AppState>) -> Json<Vec<CircuitSnapshot>> {
    Json(state.circuit_breaker.snapshot())
}

/// Unknown keys report a closed circuit with no failures.
pub async fn get_circuit(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<CircuitSnapshot> {
    Json(circuit_view(&state, key))
}

pub async fn reset_circuit(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<CircuitSnapshot> {
    state.circuit_breaker.reset(&key);
    tracing::info!(key = %key, "Circuit reset via admin API");
    Json(circuit_view(&state, key))
}

fn circuit_view(state: &AppState, key: String) -> CircuitSnapshot {
    CircuitSnapshot {
        state: state.circuit_breaker.state(&key),
        failure_count: state.circuit_breaker.failure_count(&key),
        key,
    }
}
