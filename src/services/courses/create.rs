use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    courses::{
        entities::Course,
        requests::{CreateCourseRequest, NewCourse},
    },
    users::entities::User,
};
use crate::services::{current_user, policy};
use crate::storage::Storage;
use crate::utils::validate::{
    normalize_course_code, validate_course_code, validate_enrollment_limit, validate_title,
};

use super::CourseService;

pub async fn create_course(
    storage: &Arc<dyn Storage>,
    user: &User,
    req: CreateCourseRequest,
) -> Result<Course> {
    policy::ensure_teacher(user)?;

    let code = normalize_course_code(&req.code);
    validate_title(&req.title).map_err(ClassroomError::validation)?;
    validate_course_code(&code).map_err(ClassroomError::validation)?;
    validate_enrollment_limit(req.enrollment_limit).map_err(ClassroomError::validation)?;

    // 唯一索引兜底并发情况
    if storage.get_course_by_code(&code).await?.is_some() {
        return Err(ClassroomError::conflict(format!(
            "Course code {code} is already in use"
        )));
    }

    storage
        .create_course(NewCourse {
            teacher_id: user.id,
            title: req.title.trim().to_string(),
            description: req.description,
            code,
            enrollment_limit: req.enrollment_limit,
            is_active: req.is_active.unwrap_or(true),
        })
        .await
}

pub async fn handle_create_course(
    service: &CourseService,
    request: &HttpRequest,
    course_data: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let course = create_course(&storage, &user, course_data).await?;
    info!("Teacher {} created course {} ({})", user.id, course.id, course.code);

    Ok(HttpResponse::Created().json(ApiResponse::success(course, "Course created")))
}
