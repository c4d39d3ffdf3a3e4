pub mod create;
pub mod get;
pub mod membership;
pub mod projects;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::teams::{
    entities::{Team, TeamMember},
    requests::{
        CreateProjectRequest, CreateTaskRequest, CreateTeamRequest, TeamQueryParams,
        UpdateTaskStatusRequest,
    },
};
use crate::models::users::entities::User;
use crate::services::{is_actively_enrolled, policy};
use crate::storage::Storage;

crate::services::define_service!(TeamService);

pub(crate) async fn load_team(storage: &Arc<dyn Storage>, team_id: i64) -> Result<Team> {
    storage
        .get_team_by_id(team_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Team not found"))
}

/// 调用者必须是团队成员
pub(crate) async fn ensure_team_member(
    storage: &Arc<dyn Storage>,
    team_id: i64,
    user_id: i64,
) -> Result<TeamMember> {
    storage
        .get_team_member(team_id, user_id)
        .await?
        .ok_or_else(|| ClassroomError::authorization("Only team members can do this"))
}

/// 课程团队要求调用者是课程拥有者或在读学生
pub(crate) async fn ensure_course_participant(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
) -> Result<()> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;

    if policy::owns_course(user, &course)
        || (user.is_student() && is_actively_enrolled(storage, course_id, user.id).await?)
    {
        Ok(())
    } else {
        Err(ClassroomError::authorization(
            "You are not a participant of this course",
        ))
    }
}

impl TeamService {
    pub async fn list_teams(
        &self,
        request: &HttpRequest,
        query: TeamQueryParams,
    ) -> ActixResult<HttpResponse> {
        get::handle_list_teams(self, request, query).await
    }

    pub async fn create_team(
        &self,
        request: &HttpRequest,
        team_data: CreateTeamRequest,
    ) -> ActixResult<HttpResponse> {
        create::handle_create_team(self, request, team_data).await
    }

    pub async fn get_team(&self, request: &HttpRequest, team_id: i64) -> ActixResult<HttpResponse> {
        get::handle_get_team(self, request, team_id).await
    }

    pub async fn join_team(&self, request: &HttpRequest, team_id: i64) -> ActixResult<HttpResponse> {
        membership::handle_join(self, request, team_id).await
    }

    pub async fn leave_team(
        &self,
        request: &HttpRequest,
        team_id: i64,
    ) -> ActixResult<HttpResponse> {
        membership::handle_leave(self, request, team_id).await
    }

    pub async fn create_project(
        &self,
        request: &HttpRequest,
        team_id: i64,
        project_data: CreateProjectRequest,
    ) -> ActixResult<HttpResponse> {
        projects::handle_create_project(self, request, team_id, project_data).await
    }

    pub async fn create_task(
        &self,
        request: &HttpRequest,
        team_id: i64,
        project_id: i64,
        task_data: CreateTaskRequest,
    ) -> ActixResult<HttpResponse> {
        projects::handle_create_task(self, request, team_id, project_id, task_data).await
    }

    pub async fn update_task_status(
        &self,
        request: &HttpRequest,
        team_id: i64,
        task_id: i64,
        status_data: UpdateTaskStatusRequest,
    ) -> ActixResult<HttpResponse> {
        projects::handle_update_task_status(self, request, team_id, task_id, status_data).await
    }
}
