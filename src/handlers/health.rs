// src/handlers/health.rs

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMetrics {
    pub uptime_seconds: u64,
    /// Memória residente do processo (ausente fora do Linux).
    pub resident_memory_bytes: Option<u64>,
    pub version: String,
}

// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar", body = HealthStatus))
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

// GET /api/v1/metrics
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "Health",
    responses((status = 200, description = "Uptime, memória e versão", body = RuntimeMetrics))
)]
pub async fn metrics(State(app_state): State<AppState>) -> Json<RuntimeMetrics> {
    Json(RuntimeMetrics {
        uptime_seconds: app_state.started_at.elapsed().as_secs(),
        resident_memory_bytes: resident_memory_bytes(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Lê o RSS (`VmRSS`) de `/proc/self/status`. O kernel informa em kB,
/// então o tamanho de página não entra na conta.
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let kib: u64 = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") => kib.checked_mul(1024),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_rss_is_reported_in_kib() {
        let status = "Name:\topsnex\nVmPeak:\t  210000 kB\nVmRSS:\t   18432 kB\nThreads:\t8\n";
        assert_eq!(parse_vm_rss(status), Some(18432 * 1024));
    }

    #[test]
    fn missing_or_malformed_vm_rss_yields_none() {
        assert_eq!(parse_vm_rss(""), None);
        assert_eq!(parse_vm_rss("VmRSS:\tabc kB\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\t1200\n"), None);
    }
}
