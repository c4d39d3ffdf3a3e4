use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::assignments::requests::{
    AssignmentQueryParams, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use crate::models::submissions::requests::{GradeRequest, SubmissionQueryParams, SubmitRequest};
use crate::models::users::entities::UserRole;
use crate::services::{AssignmentService, SubmissionService};
use crate::utils::{SafeAssignmentIdI64, SafeSubmissionIdI64};

static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

pub async fn list_assignments(
    req: HttpRequest,
    query: web::Query<AssignmentQueryParams>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_assignments(&req, query.into_inner())
        .await
}

pub async fn create_assignment(
    req: HttpRequest,
    assignment_data: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(&req, assignment_data.into_inner())
        .await
}

pub async fn get_assignment(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_assignment(&req, assignment_id.0).await
}

pub async fn update_assignment(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
    update_data: web::Json<UpdateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment(&req, assignment_id.0, update_data.into_inner())
        .await
}

pub async fn delete_assignment(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .delete_assignment(&req, assignment_id.0)
        .await
}

pub async fn publish_assignment(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .publish_assignment(&req, assignment_id.0)
        .await
}

pub async fn close_assignment(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .close_assignment(&req, assignment_id.0)
        .await
}

pub async fn submit(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
    submit_data: web::Json<SubmitRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .submit(&req, assignment_id.0, submit_data.into_inner())
        .await
}

pub async fn list_submissions(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
    query: web::Query<SubmissionQueryParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_submissions(&req, assignment_id.0, query.into_inner())
        .await
}

pub async fn my_submission(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.my_submission(&req, assignment_id.0).await
}

pub async fn grade_submission(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
    submission_id: SafeSubmissionIdI64,
    grade_data: web::Json<GradeRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .grade(&req, assignment_id.0, submission_id.0, grade_data.into_inner())
        .await
}

// 配置路由
pub fn configure_assignments_routes(cfg: &mut web::ServiceConfig) {
    let teacher_only = || middlewares::RequireRole::new_any(UserRole::teacher_roles());

    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_assignments))
                    .route(web::post().to(create_assignment).wrap(teacher_only())),
            )
            .service(
                web::resource("/{assignment_id}")
                    .route(web::get().to(get_assignment))
                    .route(web::put().to(update_assignment).wrap(teacher_only()))
                    .route(web::delete().to(delete_assignment).wrap(teacher_only())),
            )
            .route(
                "/{assignment_id}/publish",
                web::post().to(publish_assignment).wrap(teacher_only()),
            )
            .route(
                "/{assignment_id}/close",
                web::post().to(close_assignment).wrap(teacher_only()),
            )
            .route(
                "/{assignment_id}/submit",
                web::post()
                    .to(submit)
                    .wrap(middlewares::RequireRole::new(&UserRole::Student)),
            )
            .route(
                "/{assignment_id}/submissions",
                web::get().to(list_submissions),
            )
            .route(
                "/{assignment_id}/submissions/my",
                web::get()
                    .to(my_submission)
                    .wrap(middlewares::RequireRole::new(&UserRole::Student)),
            )
            .route(
                "/{assignment_id}/submissions/{submission_id}/grade",
                web::put().to(grade_submission).wrap(teacher_only()),
            ),
    );
}
