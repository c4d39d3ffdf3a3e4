use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    auth::{
        requests::{ChangePasswordRequest, UpdateProfileRequest},
        responses::UserInfoResponse,
    },
    users::{entities::User, requests::UpdateUserRequest},
};
use crate::services::{current_user, invalidate_user_cache};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::{normalize_email, validate_email, validate_password_simple};

use super::AuthService;

/// 更新邮箱或显示名称
pub async fn update_profile(
    storage: &Arc<dyn Storage>,
    user: &User,
    req: UpdateProfileRequest,
) -> Result<User> {
    let email = match req.email {
        Some(email) => {
            let email = normalize_email(&email);
            validate_email(&email).map_err(ClassroomError::validation)?;
            // 检查邮箱是否已被其他用户使用
            if let Some(existing) = storage.get_user_by_email(&email).await?
                && existing.id != user.id
            {
                return Err(ClassroomError::conflict("Email is already registered"));
            }
            Some(email)
        }
        None => None,
    };

    let update = UpdateUserRequest {
        email,
        display_name: req.display_name.map(|name| name.trim().to_string()),
    };

    storage
        .update_user(user.id, update)
        .await?
        .ok_or_else(|| ClassroomError::not_found("User not found"))
}

/// 修改密码，需要校验当前密码
pub async fn change_password(
    storage: &Arc<dyn Storage>,
    user_id: i64,
    req: ChangePasswordRequest,
) -> Result<()> {
    // 缓存中的用户不含密码哈希，重新从存储读取
    let stored = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| ClassroomError::not_found("User not found"))?;

    if !verify_password(&req.current_password, &stored.password_hash) {
        return Err(ClassroomError::validation("Current password is incorrect"));
    }
    validate_password_simple(&req.new_password).map_err(ClassroomError::validation)?;

    storage
        .update_password(user_id, &hash_password(&req.new_password)?)
        .await?;
    Ok(())
}

pub async fn handle_get_profile(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user },
        "User information retrieved successfully",
    )))
}

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let current = current_user(request)?;

    let user = update_profile(&storage, &current, update_data).await?;
    invalidate_user_cache(request, user.id).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user },
        "Profile updated",
    )))
}

pub async fn handle_change_password(
    service: &AuthService,
    password_data: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let current = current_user(request)?;

    change_password(&storage, current.id, password_data).await?;
    invalidate_user_cache(request, current.id).await;

    info!("User {} changed password", current.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Password updated")))
}

pub async fn handle_deactivate(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let current = current_user(request)?;

    storage.deactivate_user(current.id).await?;
    invalidate_user_cache(request, current.id).await;

    info!("User {} deactivated their account", current.id);
    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::success_empty("Account deactivated")))
}
