/*!
 * 基于角色的访问控制中间件
 *
 * 此中间件必须在 RequireJWT 中间件之后使用，用于验证用户是否具有特定角色权限。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::web;
 * use crate::middlewares::{RequireJWT, RequireRole};
 * use crate::models::users::entities::UserRole;
 *
 * web::scope("/courses")
 *     .wrap(RequireJWT)
 *     .route(
 *         "",
 *         web::post()
 *             .to(create_course)
 *             .wrap(RequireRole::new(&UserRole::Teacher)),
 *     );
 * ```
 *
 * 或者验证多个角色：
 *
 * ```rust,ignore
 * .wrap(RequireRole::new_any(UserRole::all_roles()))  // 任一角色即可
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::{
    middlewares::RequireJWT,
    models::{ErrorCode, users::entities::UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    allowed_roles: Vec<UserRole>,
}

impl RequireRole {
    /// 创建需要特定角色的中间件
    pub fn new(role: &UserRole) -> Self {
        Self {
            allowed_roles: vec![*role],
        }
    }

    /// 创建需要任一角色的中间件
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            allowed_roles: roles.iter().map(|r| **r).collect(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed_roles: self.allowed_roles.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed_roles: Vec<UserRole>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let allowed_roles = self.allowed_roles.clone();

        Box::pin(async move {
            let user_id = RequireJWT::extract_user_id(req.request());
            let user_role = RequireJWT::extract_user_role(req.request());

            match (user_id, user_role) {
                (Some(_), Some(role)) if allowed_roles.contains(&role) => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                (Some(user_id), role) => {
                    info!(
                        "Access denied for user {} (role: {:?}). Allowed roles: {:?}",
                        user_id, role, allowed_roles
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::FORBIDDEN,
                            ErrorCode::Forbidden,
                            "Access denied for this role",
                        )
                        .map_into_right_body(),
                    ))
                }
                (None, _) => {
                    info!(
                        "Role check failed: no user found in request. Make sure RequireJWT middleware is applied first."
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            "Authentication required",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::User;
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, HttpMessage, HttpResponse, dev::Service as _, web};

    fn user_with_role(role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id: 7,
            email: "someone@example.com".to_string(),
            password_hash: String::new(),
            role,
            active: true,
            display_name: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn call_as(role: Option<UserRole>) -> StatusCode {
        let app = init_service(
            App::new()
                .route(
                    "/teachers-only",
                    web::get()
                        .to(|| async { HttpResponse::Ok().finish() })
                        .wrap(RequireRole::new(&UserRole::Teacher)),
                )
                .wrap_fn(move |req, srv| {
                    if let Some(role) = role {
                        req.extensions_mut().insert(user_with_role(role));
                    }
                    srv.call(req)
                }),
        )
        .await;

        let req = TestRequest::get().uri("/teachers-only").to_request();
        call_service(&app, req).await.status()
    }

    #[actix_web::test]
    async fn test_allowed_role_passes() {
        assert_eq!(call_as(Some(UserRole::Teacher)).await, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_other_role_is_forbidden() {
        assert_eq!(call_as(Some(UserRole::Student)).await, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_missing_user_is_unauthorized() {
        assert_eq!(call_as(None).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_new_any_collects_roles() {
        let guard = RequireRole::new_any(UserRole::all_roles());
        assert_eq!(guard.allowed_roles.len(), 2);
    }
}
