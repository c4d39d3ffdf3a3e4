pub mod create;
pub mod delete;
pub mod get;
pub mod lifecycle;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::assignments::{
    entities::{Assignment, AssignmentStatus},
    requests::{AssignmentQueryParams, CreateAssignmentRequest, UpdateAssignmentRequest},
};
use crate::models::courses::entities::Course;
use crate::storage::Storage;

crate::services::define_service!(AssignmentService);

/// 加载作业及其所属课程
pub(crate) async fn load_assignment_with_course(
    storage: &Arc<dyn Storage>,
    assignment_id: i64,
) -> Result<(Assignment, Course)> {
    let assignment = storage
        .get_assignment_by_id(assignment_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Assignment not found"))?;
    let course = storage
        .get_course_by_id(assignment.course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;
    Ok((assignment, course))
}

impl AssignmentService {
    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_assignments(self, request, query).await
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        assignment_data: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::handle_create_assignment(self, request, assignment_data).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::handle_get_assignment(self, request, assignment_id).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        update_data: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        update::handle_update_assignment(self, request, assignment_id, update_data).await
    }

    // 发布作业 draft → published
    pub async fn publish_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        lifecycle::handle_transition(self, request, assignment_id, AssignmentStatus::Published)
            .await
    }

    // 关闭作业 published → closed
    pub async fn close_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        lifecycle::handle_transition(self, request, assignment_id, AssignmentStatus::Closed).await
    }

    // 删除草稿作业
    pub async fn delete_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::handle_delete_assignment(self, request, assignment_id).await
    }
}
