//! HTTP API: the device-facing endpoints (`/api/config`, `/api/report`)
//! plus operator endpoints for steering the desired state (`/api/set`) and
//! inspecting it (`/api/status`).

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::store::{DeviceReport, Desired, SharedStore};

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// What the device polls. Booleans go out as 0/1 integers, matching the
/// firmware's contract.
#[derive(Debug, Serialize)]
struct ConfigResponse {
    pump_cmd: u8,
    auto: u8,
    use_schedule: u8,
    start: String,
    end: String,
    reset_wifi: u8,
}

impl ConfigResponse {
    fn build(desired: &Desired, reset_wifi: bool) -> Self {
        Self {
            pump_cmd: desired.pump_cmd as u8,
            auto: desired.auto as u8,
            use_schedule: desired.use_schedule as u8,
            start: desired.start.clone(),
            end: desired.end.clone(),
            reset_wifi: reset_wifi as u8,
        }
    }
}

/// Partial update from the operator: only named fields change.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SetRequest {
    pump_cmd: Option<u8>,
    auto: Option<u8>,
    use_schedule: Option<u8>,
    start: Option<String>,
    end: Option<String>,
    reset_wifi: Option<u8>,
}

#[derive(Serialize)]
struct StatusResponse {
    uptime_secs: u64,
    desired: Desired,
    reset_pending: bool,
    reports_seen: u64,
    last_report: Option<DeviceReport>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/config", get(api_config))
        .route("/api/set", post(api_set))
        .route("/api/report", post(api_report))
        .route("/api/status", get(api_status))
        .with_state(store)
}

/// Device poll. The reset flag is one-shot: armed by `/api/set`, delivered
/// exactly once here.
async fn api_config(State(store): State<SharedStore>) -> Json<ConfigResponse> {
    let mut st = store.write().await;
    let reset = st.take_reset();
    if reset {
        info!("reset directive delivered to device");
    }
    Json(ConfigResponse::build(&st.desired, reset))
}

async fn api_set(
    State(store): State<SharedStore>,
    Json(req): Json<SetRequest>,
) -> Json<serde_json::Value> {
    let mut st = store.write().await;
    if let Some(v) = req.pump_cmd {
        st.desired.pump_cmd = v != 0;
    }
    if let Some(v) = req.auto {
        st.desired.auto = v != 0;
    }
    if let Some(v) = req.use_schedule {
        st.desired.use_schedule = v != 0;
    }
    if let Some(v) = req.start {
        st.desired.start = v;
    }
    if let Some(v) = req.end {
        st.desired.end = v;
    }
    if let Some(v) = req.reset_wifi {
        st.reset_wifi = v != 0;
    }
    info!(desired = ?st.desired, reset_pending = st.reset_wifi, "desired state updated");
    Json(serde_json::json!({"status": "ok"}))
}

async fn api_report(
    State(store): State<SharedStore>,
    Json(report): Json<DeviceReport>,
) -> Json<serde_json::Value> {
    info!(
        soil = report.soil,
        pump = report.pump,
        auto = report.auto,
        rssi = report.wifi_rssi,
        "device report"
    );
    store.write().await.record_report(report);
    Json(serde_json::json!({"status": "ok"}))
}

async fn api_status(State(store): State<SharedStore>) -> Json<StatusResponse> {
    let st = store.read().await;
    Json(StatusResponse {
        uptime_secs: st.started_at.elapsed().as_secs(),
        desired: st.desired.clone(),
        reset_pending: st.reset_wifi,
        reports_seen: st.reports_seen,
        last_report: st.last_report.clone(),
    })
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(store: SharedStore) -> anyhow::Result<()> {
    let port: u16 = env::var("DEVHUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("devhub listening on http://{addr}");

    axum::serve(listener, router(store)).await?;
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    fn test_store() -> SharedStore {
        Arc::new(RwLock::new(Store::new()))
    }

    async fn get_json(store: &SharedStore, uri: &str) -> serde_json::Value {
        let res = router(Arc::clone(store))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn post_json(store: &SharedStore, uri: &str, body: &str) -> StatusCode {
        let res = router(Arc::clone(store))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        res.status()
    }

    #[tokio::test]
    async fn config_serves_defaults_as_ints() {
        let store = test_store();
        let cfg = get_json(&store, "/api/config").await;
        assert_eq!(cfg["auto"], 1);
        assert_eq!(cfg["pump_cmd"], 0);
        assert_eq!(cfg["use_schedule"], 0);
        assert_eq!(cfg["reset_wifi"], 0);
        assert_eq!(cfg["start"], "06:00");
        assert_eq!(cfg["end"], "06:15");
    }

    #[tokio::test]
    async fn set_updates_only_named_fields() {
        let store = test_store();
        let status = post_json(&store, "/api/set", r#"{"auto":0,"pump_cmd":1}"#).await;
        assert_eq!(status, StatusCode::OK);

        let cfg = get_json(&store, "/api/config").await;
        assert_eq!(cfg["auto"], 0);
        assert_eq!(cfg["pump_cmd"], 1);
        // Untouched fields keep their defaults.
        assert_eq!(cfg["start"], "06:00");
    }

    #[tokio::test]
    async fn reset_flag_is_delivered_exactly_once() {
        let store = test_store();
        post_json(&store, "/api/set", r#"{"reset_wifi":1}"#).await;

        let first = get_json(&store, "/api/config").await;
        assert_eq!(first["reset_wifi"], 1);

        let second = get_json(&store, "/api/config").await;
        assert_eq!(second["reset_wifi"], 0, "one-shot flag must clear");
    }

    #[tokio::test]
    async fn report_is_stored_and_visible_in_status() {
        let store = test_store();
        let status = post_json(
            &store,
            "/api/report",
            r#"{"soil":48.5,"pump":1,"auto":1,"wifi_rssi":-57}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let st = get_json(&store, "/api/status").await;
        assert_eq!(st["reports_seen"], 1);
        assert_eq!(st["last_report"]["soil"], 48.5);
        assert_eq!(st["last_report"]["wifi_rssi"], -57);
    }

    #[tokio::test]
    async fn sparse_report_lands_with_defaults() {
        let store = test_store();
        let status = post_json(&store, "/api/report", r#"{"soil":12.0}"#).await;
        assert_eq!(status, StatusCode::OK);

        let st = get_json(&store, "/api/status").await;
        assert_eq!(st["last_report"]["pump"], 0);
    }

    #[tokio::test]
    async fn status_reflects_pending_reset() {
        let store = test_store();
        post_json(&store, "/api/set", r#"{"reset_wifi":1}"#).await;
        let st = get_json(&store, "/api/status").await;
        assert_eq!(st["reset_pending"], true);
    }

    #[tokio::test]
    async fn set_schedule_window_round_trips() {
        let store = test_store();
        post_json(
            &store,
            "/api/set",
            r#"{"use_schedule":1,"start":"07:30","end":"07:45"}"#,
        )
        .await;
        let cfg = get_json(&store, "/api/config").await;
        assert_eq!(cfg["use_schedule"], 1);
        assert_eq!(cfg["start"], "07:30");
        assert_eq!(cfg["end"], "07:45");
    }
}
