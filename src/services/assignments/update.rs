use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::UpdateAssignmentRequest,
    },
    users::entities::User,
};
use crate::services::{current_user, policy};
use crate::storage::Storage;
use crate::utils::validate::{validate_penalty_rate, validate_title, validate_total_points};

use super::{AssignmentService, load_assignment_with_course};

/// 更新未关闭的作业；总分不得低于已有的最高成绩
pub async fn update_assignment(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
    mut req: UpdateAssignmentRequest,
) -> Result<Assignment> {
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;
    policy::ensure_course_owner(user, &course)?;

    if assignment.status == AssignmentStatus::Closed {
        return Err(ClassroomError::invalid_state(
            "Closed assignments cannot be edited",
        ));
    }

    if let Some(title) = req.title.as_mut() {
        validate_title(title).map_err(ClassroomError::validation)?;
        *title = title.trim().to_string();
    }
    if let Some(points) = req.total_points {
        validate_total_points(points).map_err(ClassroomError::validation)?;
    }
    if let Some(rate) = req.late_penalty_per_day {
        validate_penalty_rate(rate).map_err(ClassroomError::validation)?;
    }

    storage.update_assignment(assignment_id, req).await
}

pub async fn handle_update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    update_data: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let assignment = update_assignment(&storage, &user, assignment_id, update_data).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "Assignment updated")))
}
