use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    submissions::{
        entities::Submission,
        requests::{SubmissionListQuery, SubmissionQueryParams},
        responses::SubmissionListResponse,
    },
    users::entities::User,
};
use crate::services::assignments::load_assignment_with_course;
use crate::services::{current_user, is_actively_enrolled, policy};
use crate::storage::Storage;

use super::SubmissionService;

/// 拥有者可见全部提交，学生只能看到自己的
pub async fn list_submissions(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
    query: SubmissionQueryParams,
) -> Result<SubmissionListResponse> {
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;

    let student_id = if policy::owns_course(user, &course) {
        None
    } else {
        let enrolled =
            user.is_student() && is_actively_enrolled(storage, course.id, user.id).await?;
        policy::ensure_can_view_assignment(user, &course, &assignment, enrolled)?;
        Some(user.id)
    };

    storage
        .list_submissions_with_pagination(SubmissionListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            assignment_id,
            student_id,
        })
        .await
}

pub async fn my_submission(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
) -> Result<Submission> {
    policy::ensure_student(user)?;
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;
    let enrolled = is_actively_enrolled(storage, course.id, user.id).await?;
    policy::ensure_can_view_assignment(user, &course, &assignment, enrolled)?;

    storage
        .get_student_submission(assignment_id, user.id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("You have not submitted this assignment"))
}

pub async fn handle_list_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    query: SubmissionQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let submissions = list_submissions(&storage, &user, assignment_id, query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submissions,
        "Submissions retrieved successfully",
    )))
}

pub async fn handle_my_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let submission = my_submission(&storage, &user, assignment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Submission retrieved successfully",
    )))
}
