use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    auth::requests::RegisterRequest,
    users::{entities::User, requests::CreateUserRequest},
};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{normalize_email, validate_email, validate_password_simple};

use super::AuthService;

/// 注册新用户；邮箱统一小写存储，角色注册后不可变更
pub async fn register_user(storage: &Arc<dyn Storage>, req: RegisterRequest) -> Result<User> {
    let email = normalize_email(&req.email);
    validate_email(&email).map_err(ClassroomError::validation)?;
    validate_password_simple(&req.password).map_err(ClassroomError::validation)?;

    if storage.get_user_by_email(&email).await?.is_some() {
        return Err(ClassroomError::conflict("Email is already registered"));
    }

    let display_name = req
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    storage
        .create_user(CreateUserRequest {
            email,
            password_hash: hash_password(&req.password)?,
            role: req.role,
            display_name,
        })
        .await
}

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = register_user(&storage, register_request).await?;

    info!("User {} registered as {}", user.id, user.role);
    Ok(HttpResponse::Created().json(ApiResponse::success(user, "Registration successful")))
}
