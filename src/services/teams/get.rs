use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    teams::{
        requests::{TeamListQuery, TeamQueryParams},
        responses::{TeamDetail, TeamListResponse},
    },
    users::entities::User,
};
use crate::services::current_user;
use crate::storage::Storage;

use super::TeamService;

/// 私有团队对非成员表现为不存在
pub async fn get_team(storage: &Arc<dyn Storage>, user: &User, team_id: i64) -> Result<TeamDetail> {
    storage
        .get_team_detail(team_id)
        .await?
        .filter(|detail| detail.team.is_public || detail.members.iter().any(|m| m.user_id == user.id))
        .ok_or_else(|| ClassroomError::not_found("Team not found"))
}

pub async fn list_teams(
    storage: &Arc<dyn Storage>,
    user: &User,
    query: TeamQueryParams,
) -> Result<TeamListResponse> {
    storage
        .list_teams_with_pagination(TeamListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            course_id: query.course_id,
            viewer_id: user.id,
        })
        .await
}

pub async fn handle_get_team(
    service: &TeamService,
    request: &HttpRequest,
    team_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let detail = get_team(&storage, &user, team_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(detail, "Team retrieved successfully")))
}

pub async fn handle_list_teams(
    service: &TeamService,
    request: &HttpRequest,
    query: TeamQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let teams = list_teams(&storage, &user, query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(teams, "Teams retrieved successfully")))
}
