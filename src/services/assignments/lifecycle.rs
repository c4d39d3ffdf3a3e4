use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    assignments::entities::{Assignment, AssignmentStatus},
    users::entities::User,
};
use crate::services::{current_user, policy};
use crate::storage::Storage;

use super::{AssignmentService, load_assignment_with_course};

/// 状态迁移，以期望的源状态做条件更新
pub async fn transition_assignment(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
    to: AssignmentStatus,
) -> Result<Assignment> {
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;
    policy::ensure_course_owner(user, &course)?;
    policy::ensure_transition(assignment.status, to)?;

    // 并发修改导致源状态不匹配
    storage
        .transition_assignment(assignment_id, assignment.status, to)
        .await?
        .ok_or_else(|| {
            ClassroomError::invalid_state(format!(
                "Assignment is no longer {}",
                assignment.status
            ))
        })
}

pub async fn handle_transition(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    to: AssignmentStatus,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let assignment = transition_assignment(&storage, &user, assignment_id, to).await?;
    info!("Assignment {} moved to {}", assignment.id, assignment.status);

    let message = match to {
        AssignmentStatus::Published => "Assignment published",
        AssignmentStatus::Closed => "Assignment closed",
        AssignmentStatus::Draft => "Assignment updated",
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, message)))
}
