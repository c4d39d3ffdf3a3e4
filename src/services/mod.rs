pub mod assignments;
pub mod auth;
pub mod chatbot;
pub mod courses;
pub mod policy;
pub mod submissions;
pub mod teams;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use chatbot::ChatbotService;
pub use courses::CourseService;
pub use submissions::SubmissionService;
pub use teams::TeamService;

use actix_web::{HttpRequest, web};
use std::sync::Arc;

use crate::cache::{ObjectCache, user_cache_key};
use crate::errors::{ClassroomError, Result};
use crate::middlewares::RequireJWT;
use crate::models::enrollments::entities::EnrollmentStatus;
use crate::models::users::entities::User;
use crate::storage::Storage;

/// 从 app_data 中获取存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> Result<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| ClassroomError::database_config("Storage not found in app data"))
}

/// 当前登录用户（由 RequireJWT / OptionalJWT 写入请求扩展）
pub(crate) fn current_user(request: &HttpRequest) -> Result<User> {
    RequireJWT::extract_user(request)
        .ok_or_else(|| ClassroomError::authentication("Authentication required"))
}

/// 移除用户缓存，资料或状态变化后调用
pub(crate) async fn invalidate_user_cache(request: &HttpRequest, user_id: i64) {
    if let Some(cache) = request.app_data::<web::Data<Arc<dyn ObjectCache>>>() {
        cache.remove(&user_cache_key(user_id)).await;
    }
}

/// 是否为课程的活跃选课学生
pub(crate) async fn is_actively_enrolled(
    storage: &Arc<dyn Storage>,
    course_id: i64,
    user_id: i64,
) -> Result<bool> {
    Ok(storage
        .get_enrollment(course_id, user_id)
        .await?
        .is_some_and(|e| e.status == EnrollmentStatus::Active))
}

/// 生成 Service 结构体及其存储获取方法
macro_rules! define_service {
    ($name:ident) => {
        pub struct $name {
            storage: Option<std::sync::Arc<dyn crate::storage::Storage>>,
        }

        impl $name {
            pub fn new_lazy() -> Self {
                Self { storage: None }
            }

            pub(crate) fn get_storage(
                &self,
                request: &actix_web::HttpRequest,
            ) -> crate::errors::Result<std::sync::Arc<dyn crate::storage::Storage>> {
                match &self.storage {
                    Some(storage) => Ok(storage.clone()),
                    None => crate::services::storage_from_request(request),
                }
            }
        }
    };
}

pub(crate) use define_service;
