use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::{ApiResponse, assignments::entities::Assignment, users::entities::User};
use crate::services::{current_user, is_actively_enrolled, policy};
use crate::storage::Storage;

use super::{AssignmentService, load_assignment_with_course};

pub async fn get_assignment(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
) -> Result<Assignment> {
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;

    let enrolled = user.is_student() && is_actively_enrolled(storage, course.id, user.id).await?;
    policy::ensure_can_view_assignment(user, &course, &assignment, enrolled)?;

    Ok(assignment)
}

pub async fn handle_get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let assignment = get_assignment(&storage, &user, assignment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        assignment,
        "Assignment retrieved successfully",
    )))
}
