//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub match_feed: MatchFeedHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    /// False when the server runs on the in-memory store.
    pub configured: bool,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

impl DatabaseHealth {
    pub fn is_healthy(&self) -> bool {
        !self.configured || self.connected
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MatchFeedHealth {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn check_database(pool: Option<&PgPool>) -> DatabaseHealth {
    let Some(pool) = pool else {
        return DatabaseHealth {
            configured: false,
            connected: false,
            latency_ms: None,
        };
    };

    let start = Instant::now();
    let connected = sqlx::query("SELECT 1").execute(pool).await.is_ok();
    DatabaseHealth {
        configured: true,
        connected,
        latency_ms: connected.then(|| start.elapsed().as_millis() as u64),
    }
}

/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(state.pool.as_ref()).await;
    let healthy = database.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        match_feed: MatchFeedHealth {
            enabled: state.match_feed.is_some(),
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// GET /api/health/live
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// GET /api/health/ready
///
/// Ready once the database (if any) answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if check_database(state.pool.as_ref()).await.is_healthy() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_healthy() {
        let health = check_database(None).await;
        assert!(!health.configured);
        assert!(health.is_healthy());
        assert_eq!(health.latency_ms, None);
    }

    #[test]
    fn test_unreachable_database_is_unhealthy() {
        let health = DatabaseHealth {
            configured: true,
            connected: false,
            latency_ms: None,
        };
        assert!(!health.is_healthy());
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.3.0".to_string(),
            database: DatabaseHealth {
                configured: true,
                connected: true,
                latency_ms: Some(3),
            },
            match_feed: MatchFeedHealth { enabled: false },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["database"]["latency_ms"], 3);
        assert_eq!(json["match_feed"]["enabled"], false);
    }
}
