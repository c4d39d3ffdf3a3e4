use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    courses::{entities::Course, requests::UpdateCourseRequest},
    users::entities::User,
};
use crate::services::{current_user, policy};
use crate::storage::Storage;
use crate::utils::validate::{
    normalize_course_code, validate_course_code, validate_enrollment_limit, validate_title,
};

use super::CourseService;

pub async fn update_course(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
    mut req: UpdateCourseRequest,
) -> Result<Course> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;
    policy::ensure_course_owner(user, &course)?;

    if let Some(title) = req.title.as_mut() {
        validate_title(title).map_err(ClassroomError::validation)?;
        *title = title.trim().to_string();
    }
    if let Some(limit) = req.enrollment_limit {
        validate_enrollment_limit(limit).map_err(ClassroomError::validation)?;
    }
    if let Some(code) = req.code.take() {
        let code = normalize_course_code(&code);
        validate_course_code(&code).map_err(ClassroomError::validation)?;
        if code != course.code {
            if storage.get_course_by_code(&code).await?.is_some() {
                return Err(ClassroomError::conflict(format!(
                    "Course code {code} is already in use"
                )));
            }
            req.code = Some(code);
        }
    }

    storage
        .update_course(course_id, req)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))
}

pub async fn handle_update_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    update_data: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let course = update_course(&storage, &user, course_id, update_data).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(course, "Course updated")))
}
