use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{ApiResponse, teams::entities::TeamMember, users::entities::User};
use crate::services::current_user;
use crate::storage::Storage;

use super::{TeamService, ensure_course_participant, load_team};

pub async fn join_team(storage: &Arc<dyn Storage>, user: &User, team_id: i64) -> Result<TeamMember> {
    let team = load_team(storage, team_id).await?;

    if !team.accepts_self_join() {
        return Err(ClassroomError::invalid_state(
            "This team does not accept new members",
        ));
    }
    if let Some(course_id) = team.course_id {
        ensure_course_participant(storage, user, course_id).await?;
    }

    storage.join_team(team_id, user.id).await
}

/// 退出团队；最后一位负责人离开时由存储层提升最早加入的成员
pub async fn leave_team(storage: &Arc<dyn Storage>, user: &User, team_id: i64) -> Result<()> {
    load_team(storage, team_id).await?;
    storage.leave_team(team_id, user.id).await
}

pub async fn handle_join(
    service: &TeamService,
    request: &HttpRequest,
    team_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let member = join_team(&storage, &user, team_id).await?;
    info!("User {} joined team {} as {}", user.id, team_id, member.role);

    Ok(HttpResponse::Ok().json(ApiResponse::success(member, "Joined team")))
}

pub async fn handle_leave(
    service: &TeamService,
    request: &HttpRequest,
    team_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    leave_team(&storage, &user, team_id).await?;
    info!("User {} left team {}", user.id, team_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Left team")))
}
