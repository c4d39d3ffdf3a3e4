use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{ApiResponse, assignments::entities::AssignmentStatus, users::entities::User};
use crate::services::{current_user, policy};
use crate::storage::Storage;

use super::{AssignmentService, load_assignment_with_course};

pub async fn delete_assignment(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
) -> Result<()> {
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;
    policy::ensure_course_owner(user, &course)?;

    if assignment.status != AssignmentStatus::Draft
        || !storage.delete_draft_assignment(assignment_id).await?
    {
        return Err(ClassroomError::invalid_state(
            "Only draft assignments can be deleted",
        ));
    }
    Ok(())
}

pub async fn handle_delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    delete_assignment(&storage, &user, assignment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Assignment deleted")))
}
