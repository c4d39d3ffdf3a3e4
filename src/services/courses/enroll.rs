use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::Result;
use crate::models::{ApiResponse, enrollments::entities::Enrollment, users::entities::User};
use crate::services::{current_user, policy};
use crate::storage::Storage;

use super::CourseService;

/// 选课；名额占用与记录写入在存储层同一事务内完成
pub async fn enroll(storage: &Arc<dyn Storage>, user: &User, course_id: i64) -> Result<Enrollment> {
    policy::ensure_student(user)?;
    storage.enroll(course_id, user.id).await
}

pub async fn unenroll(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
) -> Result<Enrollment> {
    policy::ensure_student(user)?;
    storage.unenroll(course_id, user.id).await
}

pub async fn handle_enroll(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let enrollment = enroll(&storage, &user, course_id).await?;
    info!("Student {} enrolled in course {}", user.id, course_id);

    Ok(HttpResponse::Created().json(ApiResponse::success(enrollment, "Enrolled")))
}

pub async fn handle_unenroll(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let enrollment = unenroll(&storage, &user, course_id).await?;
    info!("Student {} dropped course {}", user.id, course_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(enrollment, "Unenrolled")))
}
