use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ClassroomError, Result};
use crate::models::{ApiResponse, auth::responses::RefreshTokenResponse};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

/// 用 refresh token 换取新的 access token，用户必须仍处于启用状态
pub async fn refresh_access_token(storage: &Arc<dyn Storage>, refresh_token: &str) -> Result<String> {
    let claims = JwtUtils::verify_refresh_token(refresh_token)?;

    let user = storage
        .get_user_by_id(claims.user_id()?)
        .await?
        .filter(|user| user.active)
        .ok_or_else(|| ClassroomError::authentication("User not found or deactivated"))?;

    JwtUtils::generate_access_token(user.id, user.role.as_str())
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();

    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Err(ClassroomError::authentication("Unauthorized access, please login").into());
    };

    match refresh_access_token(&storage, &refresh_token).await {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: config.jwt.access_token_expiry * 60,
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            info!("Refresh token rejected: {}", e.message());
            // 清除无效的 refresh token cookie
            let mut response = actix_web::ResponseError::error_response(&e);
            response.add_cookie(&JwtUtils::create_empty_refresh_token_cookie())?;
            Ok(response)
        }
    }
}
