use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    assignments::{entities::Assignment, requests::CreateAssignmentRequest},
    users::entities::User,
};
use crate::services::{current_user, policy};
use crate::storage::Storage;
use crate::utils::validate::{validate_penalty_rate, validate_title, validate_total_points};

use super::AssignmentService;

pub async fn create_assignment(
    storage: &Arc<dyn Storage>,
    user: &User,
    mut req: CreateAssignmentRequest,
) -> Result<Assignment> {
    let course = storage
        .get_course_by_id(req.course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;
    policy::ensure_course_owner(user, &course)?;

    validate_title(&req.title).map_err(ClassroomError::validation)?;
    validate_total_points(req.total_points).map_err(ClassroomError::validation)?;
    if let Some(rate) = req.late_penalty_per_day {
        validate_penalty_rate(rate).map_err(ClassroomError::validation)?;
    }
    req.title = req.title.trim().to_string();

    storage.create_assignment(req).await
}

pub async fn handle_create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_data: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let assignment = create_assignment(&storage, &user, assignment_data).await?;
    info!(
        "Teacher {} created assignment {} in course {}",
        user.id, assignment.id, assignment.course_id
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(assignment, "Assignment created")))
}
