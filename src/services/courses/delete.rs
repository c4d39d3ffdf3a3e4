use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{ApiResponse, users::entities::User};
use crate::services::{current_user, policy};
use crate::storage::Storage;

use super::CourseService;

/// 删除课程；仍有在读学生时由存储层的条件删除拒绝
pub async fn delete_course(storage: &Arc<dyn Storage>, user: &User, course_id: i64) -> Result<()> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;
    policy::ensure_course_owner(user, &course)?;

    storage.delete_course(course_id).await
}

pub async fn handle_delete_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    delete_course(&storage, &user, course_id).await?;
    info!("Teacher {} deleted course {}", user.id, course_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Course deleted")))
}
