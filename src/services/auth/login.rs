use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    auth::{LoginRequest, LoginResponse},
    users::entities::User,
};
use crate::storage::Storage;
use crate::utils::jwt;
use crate::utils::password::verify_password;
use crate::utils::validate::normalize_email;

use super::AuthService;

/// 校验邮箱与密码，成功后更新最后登录时间
pub async fn authenticate(storage: &Arc<dyn Storage>, req: &LoginRequest) -> Result<User> {
    let email = normalize_email(&req.email);

    let user = storage
        .get_user_by_email(&email)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| ClassroomError::authentication("Email or password is incorrect"))?;

    if !user.active {
        return Err(ClassroomError::authentication("Account is deactivated"));
    }

    storage.update_last_login(user.id).await?;

    Ok(user)
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();

    let user = match authenticate(&storage, &login_request).await {
        Ok(user) => user,
        Err(e) => {
            info!("Login failed for {}: {}", login_request.email, e.message());
            return Err(e.into());
        }
    };

    let token_pair = user.generate_token_pair(
        login_request
            .remember_me
            .then(|| chrono::Duration::days(config.jwt.refresh_token_remember_me_expiry)),
    )?;

    info!("User {} logged in successfully", user.id);

    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
        user,
        created_at: chrono::Utc::now(),
    };

    let refresh_cookie = jwt::JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token);

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}
