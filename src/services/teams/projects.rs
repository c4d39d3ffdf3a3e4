use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    teams::{
        entities::{Project, Task, TaskStatus},
        requests::{CreateProjectRequest, CreateTaskRequest, UpdateTaskStatusRequest},
    },
    users::entities::User,
};
use crate::services::current_user;
use crate::storage::Storage;
use crate::utils::validate::validate_title;

use super::{TeamService, ensure_team_member, load_team};

pub async fn create_project(
    storage: &Arc<dyn Storage>,
    user: &User,
    team_id: i64,
    req: CreateProjectRequest,
) -> Result<Project> {
    load_team(storage, team_id).await?;
    ensure_team_member(storage, team_id, user.id).await?;
    validate_title(&req.name).map_err(ClassroomError::validation)?;

    storage
        .create_project(team_id, req.name.trim().to_string(), req.description, user.id)
        .await
}

pub async fn create_task(
    storage: &Arc<dyn Storage>,
    user: &User,
    team_id: i64,
    project_id: i64,
    req: CreateTaskRequest,
) -> Result<Task> {
    load_team(storage, team_id).await?;
    ensure_team_member(storage, team_id, user.id).await?;
    validate_title(&req.title).map_err(ClassroomError::validation)?;

    let project = storage
        .get_project_by_id(project_id)
        .await?
        .filter(|p| p.team_id == team_id)
        .ok_or_else(|| ClassroomError::not_found("Project not found"))?;

    // 负责人必须是团队成员
    if let Some(assignee_id) = req.assignee_id
        && storage.get_team_member(team_id, assignee_id).await?.is_none()
    {
        return Err(ClassroomError::validation(
            "Assignee must be a member of the team",
        ));
    }

    storage
        .create_task(
            &project,
            req.title.trim().to_string(),
            req.description,
            req.assignee_id,
            user.id,
        )
        .await
}

pub async fn update_task_status(
    storage: &Arc<dyn Storage>,
    user: &User,
    team_id: i64,
    task_id: i64,
    status: TaskStatus,
) -> Result<Task> {
    load_team(storage, team_id).await?;
    ensure_team_member(storage, team_id, user.id).await?;

    storage
        .get_task_by_id(task_id)
        .await?
        .filter(|t| t.team_id == team_id)
        .ok_or_else(|| ClassroomError::not_found("Task not found"))?;

    storage.update_task_status(task_id, status).await
}

pub async fn handle_create_project(
    service: &TeamService,
    request: &HttpRequest,
    team_id: i64,
    project_data: CreateProjectRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let project = create_project(&storage, &user, team_id, project_data).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(project, "Project created")))
}

pub async fn handle_create_task(
    service: &TeamService,
    request: &HttpRequest,
    team_id: i64,
    project_id: i64,
    task_data: CreateTaskRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let task = create_task(&storage, &user, team_id, project_id, task_data).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(task, "Task created")))
}

pub async fn handle_update_task_status(
    service: &TeamService,
    request: &HttpRequest,
    team_id: i64,
    task_id: i64,
    status_data: UpdateTaskStatusRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let task = update_task_status(&storage, &user, team_id, task_id, status_data.status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(task, "Task status updated")))
}
