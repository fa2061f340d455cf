//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use goals_core::domain::{DayCompletion, Goal, GoalCompletion, WeekSummary};
use goals_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_goal_handler,
        create_goal_completion_handler,
        get_week_summary_handler,
        health_handler,
    ),
    components(
        schemas(
            CreateGoalRequest,
            CreateGoalResponse,
            CreateGoalCompletionRequest,
            CreateGoalCompletionResponse,
            GetWeekSummaryResponse,
            GoalPayload,
            GoalCompletionPayload,
            WeekSummaryPayload,
            DayCompletionPayload,
        )
    ),
    tags(
        (name = "Goals API", description = "API endpoints for weekly goal tracking.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Payload Structs
//=========================================================================================

/// The request body for creating a goal.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: String,
    pub desired_weekly_frequency: i32,
}

/// The request body for logging a completion.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalCompletionRequest {
    pub goal_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalPayload {
    pub id: Uuid,
    pub title: String,
    pub desired_weekly_frequency: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Goal> for GoalPayload {
    fn from(goal: Goal) -> Self {
        Self {
            id: goal.id,
            title: goal.title,
            desired_weekly_frequency: goal.desired_weekly_frequency,
            created_at: goal.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalCompletionPayload {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GoalCompletion> for GoalCompletionPayload {
    fn from(completion: GoalCompletion) -> Self {
        Self {
            id: completion.id,
            goal_id: completion.goal_id,
            created_at: completion.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayCompletionPayload {
    pub id: Uuid,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

impl From<DayCompletion> for DayCompletionPayload {
    fn from(completion: DayCompletion) -> Self {
        Self {
            id: completion.id,
            title: completion.title,
            completed_at: completion.completed_at,
        }
    }
}

/// The weekly report: totals plus completions bucketed by calendar day.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummaryPayload {
    pub completed: i64,
    pub total: i64,
    pub goals_per_day: BTreeMap<NaiveDate, Vec<DayCompletionPayload>>,
}

impl From<WeekSummary> for WeekSummaryPayload {
    fn from(summary: WeekSummary) -> Self {
        Self {
            completed: summary.completed,
            total: summary.total,
            goals_per_day: summary
                .goals_per_day
                .into_iter()
                .map(|(date, completions)| {
                    (date, completions.into_iter().map(Into::into).collect())
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreateGoalResponse {
    pub goal: GoalPayload,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalCompletionResponse {
    pub goal_completion: GoalCompletionPayload,
}

#[derive(Serialize, ToSchema)]
pub struct GetWeekSummaryResponse {
    pub summary: WeekSummaryPayload,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port error to the HTTP response for it. Store failures are logged
/// with their detail but surfaced as an opaque 500.
fn port_error_response(action: &str, err: PortError) -> (StatusCode, String) {
    match err {
        PortError::QuotaExceeded { .. } => (StatusCode::CONFLICT, err.to_string()),
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PortError::Store(detail) => {
            error!("Failed to {}: {}", action, detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new goal with a weekly completion target.
#[utoipa::path(
    post,
    path = "/goals",
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created successfully", body = CreateGoalResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_goal_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateGoalRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let goal = app_state
        .repo
        .create_goal(&payload.title, payload.desired_weekly_frequency)
        .await
        .map_err(|e| port_error_response("create goal", e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGoalResponse { goal: goal.into() }),
    ))
}

/// Log one completion for a goal.
///
/// Rejected with `409` once the goal already has `desiredWeeklyFrequency`
/// completions inside the current calendar week.
#[utoipa::path(
    post,
    path = "/completions",
    request_body = CreateGoalCompletionRequest,
    responses(
        (status = 201, description = "Completion logged successfully", body = CreateGoalCompletionResponse),
        (status = 404, description = "Goal not found"),
        (status = 409, description = "Weekly quota for this goal already met"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_goal_completion_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateGoalCompletionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let completion = app_state
        .repo
        .create_goal_completion(payload.goal_id)
        .await
        .map_err(|e| port_error_response("create goal completion", e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGoalCompletionResponse {
            goal_completion: completion.into(),
        }),
    ))
}

/// Fetch the aggregate report for the current calendar week.
#[utoipa::path(
    get,
    path = "/summary",
    responses(
        (status = 200, description = "The weekly summary", body = GetWeekSummaryResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_week_summary_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let summary = app_state
        .repo
        .week_summary()
        .await
        .map_err(|e| port_error_response("fetch week summary", e))?;

    Ok(Json(GetWeekSummaryResponse {
        summary: summary.into(),
    }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}

//=========================================================================================
// Unit Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_response_uses_the_documented_camel_case_shape() {
        let id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 9, 4).unwrap();
        let summary = WeekSummary {
            completed: 3,
            total: 3,
            goals_per_day: BTreeMap::from([(
                date,
                vec![DayCompletion {
                    id,
                    title: "Run".to_string(),
                    completed_at: "2024-09-04T18:15:00Z".parse().unwrap(),
                }],
            )]),
        };

        let body = serde_json::to_value(GetWeekSummaryResponse {
            summary: summary.into(),
        })
        .unwrap();

        assert_eq!(body["summary"]["completed"], json!(3));
        assert_eq!(body["summary"]["total"], json!(3));
        let day = &body["summary"]["goalsPerDay"]["2024-09-04"];
        assert_eq!(day[0]["id"], json!(id));
        assert_eq!(day[0]["title"], json!("Run"));
        assert!(day[0]["completedAt"].is_string());
    }

    #[test]
    fn zero_activity_summary_serializes_an_empty_object() {
        let body = serde_json::to_value(GetWeekSummaryResponse {
            summary: WeekSummary {
                completed: 0,
                total: 0,
                goals_per_day: BTreeMap::new(),
            }
            .into(),
        })
        .unwrap();

        assert_eq!(body["summary"], json!({ "completed": 0, "total": 0, "goalsPerDay": {} }));
    }

    #[test]
    fn request_bodies_parse_camel_case_fields() {
        let goal: CreateGoalRequest =
            serde_json::from_value(json!({ "title": "Run", "desiredWeeklyFrequency": 3 }))
                .unwrap();
        assert_eq!(goal.title, "Run");
        assert_eq!(goal.desired_weekly_frequency, 3);

        let id = Uuid::new_v4();
        let completion: CreateGoalCompletionRequest =
            serde_json::from_value(json!({ "goalId": id })).unwrap();
        assert_eq!(completion.goal_id, id);
    }

    #[test]
    fn completion_response_wraps_the_record_in_goal_completion() {
        let completion = GoalCompletion {
            id: Uuid::new_v4(),
            goal_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let body = serde_json::to_value(CreateGoalCompletionResponse {
            goal_completion: completion.clone().into(),
        })
        .unwrap();

        assert_eq!(body["goalCompletion"]["id"], json!(completion.id));
        assert_eq!(body["goalCompletion"]["goalId"], json!(completion.goal_id));
    }

    #[test]
    fn quota_exceeded_maps_to_conflict() {
        let (status, message) = port_error_response(
            "create goal completion",
            PortError::QuotaExceeded {
                goal_id: Uuid::new_v4(),
            },
        );
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(message.contains("already completed this week"));
    }

    #[test]
    fn unknown_goal_maps_to_not_found() {
        let (status, _) = port_error_response(
            "create goal completion",
            PortError::NotFound("Goal x not found".to_string()),
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failures_map_to_an_opaque_internal_error() {
        let (status, message) = port_error_response(
            "fetch week summary",
            PortError::Store("connection refused".to_string()),
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("connection refused"));
    }
}
