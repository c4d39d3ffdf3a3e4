use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    teams::{
        entities::Team,
        requests::{CreateTeamRequest, NewTeam},
    },
    users::entities::User,
};
use crate::services::current_user;
use crate::storage::Storage;
use crate::utils::validate::validate_title;

use super::{TeamService, ensure_course_participant};

/// 创建团队，创建者成为负责人
pub async fn create_team(
    storage: &Arc<dyn Storage>,
    user: &User,
    req: CreateTeamRequest,
) -> Result<Team> {
    validate_title(&req.name).map_err(ClassroomError::validation)?;
    if let Some(course_id) = req.course_id {
        ensure_course_participant(storage, user, course_id).await?;
    }

    storage
        .create_team(NewTeam {
            name: req.name.trim().to_string(),
            description: req.description,
            course_id: req.course_id,
            creator_id: user.id,
            is_public: req.is_public,
            allow_self_join: req.allow_self_join,
        })
        .await
}

pub async fn handle_create_team(
    service: &TeamService,
    request: &HttpRequest,
    team_data: CreateTeamRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let team = create_team(&storage, &user, team_data).await?;
    info!("User {} created team {}", user.id, team.id);

    Ok(HttpResponse::Created().json(ApiResponse::success(team, "Team created")))
}
