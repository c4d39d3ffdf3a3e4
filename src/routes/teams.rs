use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::teams::requests::{
    CreateProjectRequest, CreateTaskRequest, CreateTeamRequest, TeamQueryParams,
    UpdateTaskStatusRequest,
};
use crate::services::TeamService;
use crate::utils::{SafeProjectIdI64, SafeTaskIdI64, SafeTeamIdI64};

static TEAM_SERVICE: Lazy<TeamService> = Lazy::new(TeamService::new_lazy);

pub async fn list_teams(
    req: HttpRequest,
    query: web::Query<TeamQueryParams>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.list_teams(&req, query.into_inner()).await
}

pub async fn create_team(
    req: HttpRequest,
    team_data: web::Json<CreateTeamRequest>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.create_team(&req, team_data.into_inner()).await
}

pub async fn get_team(req: HttpRequest, team_id: SafeTeamIdI64) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.get_team(&req, team_id.0).await
}

pub async fn join_team(req: HttpRequest, team_id: SafeTeamIdI64) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.join_team(&req, team_id.0).await
}

pub async fn leave_team(req: HttpRequest, team_id: SafeTeamIdI64) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.leave_team(&req, team_id.0).await
}

pub async fn create_project(
    req: HttpRequest,
    team_id: SafeTeamIdI64,
    project_data: web::Json<CreateProjectRequest>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE
        .create_project(&req, team_id.0, project_data.into_inner())
        .await
}

pub async fn create_task(
    req: HttpRequest,
    team_id: SafeTeamIdI64,
    project_id: SafeProjectIdI64,
    task_data: web::Json<CreateTaskRequest>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE
        .create_task(&req, team_id.0, project_id.0, task_data.into_inner())
        .await
}

pub async fn update_task_status(
    req: HttpRequest,
    team_id: SafeTeamIdI64,
    task_id: SafeTaskIdI64,
    status_data: web::Json<UpdateTaskStatusRequest>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE
        .update_task_status(&req, team_id.0, task_id.0, status_data.into_inner())
        .await
}

// 配置路由
pub fn configure_teams_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/teams")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_teams))
                    .route(web::post().to(create_team)),
            )
            .route("/{team_id}", web::get().to(get_team))
            .route("/{team_id}/join", web::post().to(join_team))
            .route("/{team_id}/leave", web::post().to(leave_team))
            .route("/{team_id}/projects", web::post().to(create_project))
            .route(
                "/{team_id}/projects/{project_id}/tasks",
                web::post().to(create_task),
            )
            .route(
                "/{team_id}/tasks/{task_id}/status",
                web::put().to(update_task_status),
            ),
    );
}
