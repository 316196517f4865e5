use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pelada_core::AttendanceSequencer;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    sequencer: Arc<AttendanceSequencer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub roster_size: usize,
    pub active_sessions: usize,
    pub channels_with_rosters: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub attendance: AttendanceStats,
    pub checked_at: String,
}

pub fn router(sequencer: Arc<AttendanceSequencer>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { sequencer })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    sequencer: Arc<AttendanceSequencer>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(sequencer)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let sequencer = &state.sequencer;
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "pelada-server runtime initialized".to_string(),
        },
        attendance: AttendanceStats {
            roster_size: sequencer.roster().len(),
            active_sessions: sequencer.active_sessions(),
            channels_with_rosters: sequencer.confirmed_rosters().channel_count(),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use pelada_core::{AttendanceSequencer, ConfirmedRosters, Roster};
    use tower::ServiceExt;

    use crate::health::{health, router, HealthState};

    fn sequencer() -> Arc<AttendanceSequencer> {
        Arc::new(AttendanceSequencer::new(
            Arc::new(Roster::default()),
            Arc::new(ConfirmedRosters::new()),
        ))
    }

    #[tokio::test]
    async fn health_reports_roster_and_session_counts() {
        let sequencer = sequencer();
        sequencer.start("U1", "C1").expect("start");
        sequencer.start("U2", "C1").expect("start");

        let (status, Json(payload)) =
            health(State(HealthState { sequencer: Arc::clone(&sequencer) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.attendance.roster_size, 14);
        assert_eq!(payload.attendance.active_sessions, 2);
        assert_eq!(payload.attendance.channels_with_rosters, 0);
    }

    #[tokio::test]
    async fn health_route_serves_json() {
        let response = router(sequencer())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(json["service"]["status"], "ready");
        assert_eq!(json["attendance"]["active_sessions"], 0);
    }
}
