use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse, PaginationInfo,
    assignments::{
        requests::{AssignmentListQuery, AssignmentQueryParams},
        responses::AssignmentListResponse,
    },
    users::entities::User,
};
use crate::services::{current_user, is_actively_enrolled, policy};
use crate::storage::Storage;

use super::AssignmentService;

/// 课程拥有者可见全部作业，已选课学生仅可见已发布和已关闭的作业
pub async fn list_assignments(
    storage: &Arc<dyn Storage>,
    user: &User,
    query: AssignmentQueryParams,
) -> Result<AssignmentListResponse> {
    let course = storage
        .get_course_by_id(query.course_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("Course not found"))?;

    let statuses = if policy::owns_course(user, &course) {
        query.status.into_iter().collect()
    } else if user.is_student() && is_actively_enrolled(storage, course.id, user.id).await? {
        let visible = policy::student_visible_statuses();
        match query.status {
            Some(status) if visible.contains(&status) => vec![status],
            // 学生请求草稿时直接返回空列表
            Some(_) => {
                return Ok(AssignmentListResponse {
                    items: Vec::new(),
                    pagination: PaginationInfo::new(
                        query.pagination.page.max(1),
                        query.pagination.size.clamp(1, 100),
                        0,
                    ),
                });
            }
            None => visible,
        }
    } else {
        return Err(ClassroomError::authorization(
            "Not allowed to view assignments of this course",
        ));
    };

    storage
        .list_assignments_with_pagination(AssignmentListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            course_id: course.id,
            statuses,
        })
        .await
}

pub async fn handle_list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    query: AssignmentQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let assignments = list_assignments(&storage, &user, query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        assignments,
        "Assignments retrieved successfully",
    )))
}
