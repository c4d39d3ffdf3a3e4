use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse,
    courses::{
        requests::{CourseListQuery, CourseQueryParams, CourseScope},
        responses::CourseListResponse,
    },
    users::entities::User,
};
use crate::storage::Storage;

use super::CourseService;

/// 根据调用者身份与 `mine` 参数决定可见范围
pub fn resolve_scope(viewer: Option<&User>, mine: bool) -> CourseScope {
    match viewer {
        Some(user) if user.is_teacher() && mine => CourseScope::OwnedBy(user.id),
        Some(user) if user.is_teacher() => CourseScope::PublicAndOwnedBy(user.id),
        Some(user) if user.is_student() && mine => CourseScope::EnrolledBy(user.id),
        _ => CourseScope::Public,
    }
}

pub async fn list_courses(
    storage: &Arc<dyn Storage>,
    viewer: Option<&User>,
    query: CourseQueryParams,
) -> Result<CourseListResponse> {
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    storage
        .list_courses_with_pagination(CourseListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            teacher_id: query.teacher_id,
            search,
            scope: resolve_scope(viewer, query.mine),
        })
        .await
}

pub async fn handle_list_courses(
    service: &CourseService,
    request: &HttpRequest,
    query: CourseQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let viewer = RequireJWT::extract_user(request);

    let courses = list_courses(&storage, viewer.as_ref(), query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        courses,
        "Courses retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            email: format!("u{id}@example.com"),
            password_hash: String::new(),
            role,
            active: true,
            display_name: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_scope_resolution() {
        let teacher = user(1, UserRole::Teacher);
        let student = user(2, UserRole::Student);

        assert_eq!(resolve_scope(None, false), CourseScope::Public);
        assert_eq!(resolve_scope(None, true), CourseScope::Public);
        assert_eq!(resolve_scope(Some(&teacher), true), CourseScope::OwnedBy(1));
        assert_eq!(
            resolve_scope(Some(&teacher), false),
            CourseScope::PublicAndOwnedBy(1)
        );
        assert_eq!(resolve_scope(Some(&student), true), CourseScope::EnrolledBy(2));
        assert_eq!(resolve_scope(Some(&student), false), CourseScope::Public);
    }
}
