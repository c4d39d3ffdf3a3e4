use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    enrollments::{requests::EnrollmentQueryParams, responses::EnrollmentListResponse},
    users::entities::User,
};
use crate::services::{current_user, policy};
use crate::storage::Storage;

use super::CourseService;

pub async fn list_enrollments(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
    query: EnrollmentQueryParams,
) -> Result<EnrollmentListResponse> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;
    policy::ensure_course_owner(user, &course)?;

    storage
        .list_enrollments_with_pagination(
            course_id,
            query.status,
            Some(query.pagination.page),
            Some(query.pagination.size),
        )
        .await
}

pub async fn handle_list_enrollments(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    query: EnrollmentQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let roster = list_enrollments(&storage, &user, course_id, query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        roster,
        "Enrollments retrieved successfully",
    )))
}
