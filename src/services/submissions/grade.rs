use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    submissions::{
        entities::Submission,
        requests::{GradeRequest, GradeSubmission},
    },
    users::entities::User,
};
use crate::services::assignments::load_assignment_with_course;
use crate::services::{current_user, policy};
use crate::storage::Storage;

use super::SubmissionService;

/// 评分；重复评分直接覆盖
pub async fn grade(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
    submission_id: i64,
    req: GradeRequest,
) -> Result<Submission> {
    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;

    storage
        .get_submission_by_id(submission_id)
        .await?
        .filter(|s| s.assignment_id == assignment.id)
        .ok_or_else(|| ClassroomError::not_found("Submission not found"))?;

    policy::ensure_course_owner(user, &course)?;
    policy::validate_grade(req.grade, assignment.total_points)?;

    storage
        .grade_submission(GradeSubmission {
            assignment_id,
            submission_id,
            grade: req.grade,
            feedback: req.feedback,
            graded_by: user.id,
        })
        .await
}

pub async fn handle_grade(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    submission_id: i64,
    grade_data: GradeRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let submission = grade(&storage, &user, assignment_id, submission_id, grade_data).await?;
    info!(
        "Teacher {} graded submission {} with {:?}",
        user.id, submission.id, submission.grade
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission graded")))
}
