/// Task endpoints
///
/// - `GET /api/tasks`: members see tasks assigned to them, leads the tasks
///   they assigned, board members every task; soonest deadline first
/// - `POST /api/tasks`: assign a task (lead, board)
/// - `PUT /api/tasks/:id`: change status and/or add a note (assignee or
///   assigner only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{not_blank, Gate, IdPath, Officers, ValidJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use clubify_shared::{
    auth::{authorization::require_participant, identity::AuthContext},
    models::{
        club::{Club, ClubRef},
        task::{CreateTask, Task, TaskScope, TaskStatus, UpdateTask},
        Priority,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank", message = "Title must not be blank")
    )]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(required(message = "assignedTo is required"))]
    pub assigned_to: Option<Uuid>,

    /// Club id, `"default-club"`, or omitted
    pub club: Option<ClubRef>,

    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    pub status: Option<TaskStatus>,

    /// Appended as a note authored by the caller
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,
    pub message: String,
    pub task: Task,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    let scope = TaskScope::for_role(auth.role, auth.user_id);
    let tasks = Task::list(&state.db, scope).await?;

    Ok(Json(TaskListResponse {
        success: true,
        tasks,
    }))
}

pub async fn create_task(
    State(state): State<AppState>,
    Gate(auth, _): Gate<Officers>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let assigned_to = req
        .assigned_to
        .ok_or_else(|| ApiError::invalid_field("assignedTo", "assignedTo is required"))?;

    let club_id = Club::resolve(&state.db, req.club.unwrap_or_default(), auth.user_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title.trim().to_string(),
            description: req.description,
            assigned_by: auth.user_id,
            assigned_to,
            club_id,
            deadline: req.deadline,
            priority: req.priority.unwrap_or_default(),
        },
    )
    .await?;

    info!(
        task_id = %task.id,
        assigned_by = %auth.user_id,
        assigned_to = %assigned_to,
        club_id = %club_id,
        "Task created"
    );

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            success: true,
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let not_found = || ApiError::NotFound("Task not found".to_string());

    let task = Task::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;

    require_participant(
        &auth,
        &[task.assigned_to.id, task.assigned_by.id],
        "Not authorized to update this task",
    )?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            status: req.status,
            note: req.notes,
            author: auth.user_id,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    info!(task_id = %id, status = ?task.status, user_id = %auth.user_id, "Task updated");

    Ok(Json(TaskResponse {
        success: true,
        message: "Task updated successfully".to_string(),
        task,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_defaults_to_default_club() {
        let assignee = Uuid::new_v4();
        let json = format!(r#"{{"title": "Set up chairs", "assignedTo": "{assignee}"}}"#);
        let req: CreateTaskRequest = serde_json::from_str(&json).unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.assigned_to, Some(assignee));
        assert_eq!(req.club.unwrap_or_default(), ClubRef::Default);
        assert_eq!(req.priority.unwrap_or_default(), Priority::Medium);
    }

    #[test]
    fn test_create_task_missing_assignee_fails_validation() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": "Orphan"}"#).unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_whitespace_title_fails_validation() {
        let json = format!(r#"{{"title": "   ", "assignedTo": "{}"}}"#, Uuid::new_v4());
        let req: CreateTaskRequest = serde_json::from_str(&json).unwrap();

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_update_task_accepts_snake_case_status() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"status": "in_progress", "notes": "Started"}"#).unwrap();

        assert_eq!(req.status, Some(TaskStatus::InProgress));
        assert_eq!(req.notes.as_deref(), Some("Started"));
    }
}
