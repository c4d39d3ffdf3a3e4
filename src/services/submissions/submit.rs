use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    submissions::{
        entities::Submission,
        requests::{SubmitRequest, UpsertSubmission},
    },
    users::entities::User,
};
use crate::services::assignments::load_assignment_with_course;
use crate::services::{current_user, is_actively_enrolled, policy};
use crate::storage::Storage;

use super::SubmissionService;

const MAX_ATTACHMENTS: usize = 20;

/// 提交作业；同一学生对同一作业只保留一行，重复提交覆盖内容
pub async fn submit(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
    req: SubmitRequest,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Submission> {
    policy::ensure_student(user)?;

    let (assignment, course) = load_assignment_with_course(storage, assignment_id).await?;
    if !is_actively_enrolled(storage, course.id, user.id).await? {
        return Err(ClassroomError::authorization(
            "You are not enrolled in this course",
        ));
    }

    let lateness = policy::ensure_can_submit(&assignment, now)?;

    if req.attachments.len() > MAX_ATTACHMENTS {
        return Err(ClassroomError::validation(format!(
            "At most {MAX_ATTACHMENTS} attachments are allowed"
        )));
    }
    if !req.draft && req.content.trim().is_empty() && req.attachments.is_empty() {
        return Err(ClassroomError::validation(
            "Submission must have content or attachments",
        ));
    }

    // 草稿不计迟交
    let (is_late, late_penalty) = if req.draft {
        (false, 0.0)
    } else {
        (lateness.is_late, lateness.penalty)
    };

    storage
        .upsert_submission(UpsertSubmission {
            assignment_id,
            student_id: user.id,
            content: req.content,
            attachments: req.attachments,
            draft: req.draft,
            is_late,
            late_penalty,
        })
        .await
}

pub async fn handle_submit(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    submit_data: SubmitRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let submission = submit(&storage, &user, assignment_id, submit_data, chrono::Utc::now()).await?;
    info!(
        "Student {} submitted assignment {} (status: {}, late: {})",
        user.id, assignment_id, submission.status, submission.is_late
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission saved")))
}
