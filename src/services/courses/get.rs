use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, courses::responses::CourseDetail, users::entities::User,
};
use crate::services::{is_actively_enrolled, policy};
use crate::storage::Storage;

use super::CourseService;

/// 课程详情及调用者相关标记；非活跃课程对非拥有者表现为不存在
pub async fn get_course_detail(
    storage: &Arc<dyn Storage>,
    viewer: Option<&User>,
    course_id: i64,
) -> Result<CourseDetail> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .filter(|course| policy::can_view_course(viewer, course))
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;

    let is_owner = viewer.is_some_and(|user| policy::owns_course(user, &course));
    let is_enrolled = match viewer {
        Some(user) if user.is_student() => is_actively_enrolled(storage, course.id, user.id).await?,
        _ => false,
    };

    Ok(CourseDetail {
        is_full: course.is_full(),
        is_enrolled,
        is_owner,
        course,
    })
}

pub async fn handle_get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let viewer = RequireJWT::extract_user(request);

    let detail = get_course_detail(&storage, viewer.as_ref(), course_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        detail,
        "Course retrieved successfully",
    )))
}
