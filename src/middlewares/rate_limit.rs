/*!
 * 速率限制中间件
 *
 * 此中间件用于限制请求频率，防止暴力破解登录与批量注册。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::web;
 * use crate::middlewares::RateLimit;
 *
 * web::scope("/auth")
 *     .route("/login", web::post().to(login).wrap(RateLimit::login()))
 * ```
 *
 * ## 限制规则
 *
 * - 固定窗口计数：键为 `前缀:标识:窗口序号`，窗口内最多放行 `max_requests` 次
 * - 已认证请求以用户 ID 为标识，否则使用客户端 IP
 * - 计数存储由 [`RateLimitStore`] 提供，内存（moka）或 Redis
 * - 超过限制返回 429 Too Many Requests
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use async_trait::async_trait;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::config::{AppConfig, RateLimitRule};
use crate::models::{ApiResponse, ErrorCode};

/// 速率限制计数存储
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// 消耗一次配额，窗口内已达上限时返回 false
    async fn check_and_consume(&self, key: &str, max_requests: u32, window_secs: u64) -> bool;
}

// 固定窗口键
fn window_key(key: &str, window_secs: u64) -> String {
    let window = window_secs.max(1);
    let index = chrono::Utc::now().timestamp().max(0) as u64 / window;
    format!("{key}:{index}")
}

/// 基于 moka 的内存计数
pub struct MokaRateLimitStore {
    counters: Cache<String, u32>,
}

impl MokaRateLimitStore {
    /// `max_window_secs` 为最长窗口，计数条目在此之后过期
    pub fn new(max_tracked_keys: u64, max_window_secs: u64) -> Self {
        Self {
            counters: Cache::builder()
                .time_to_live(Duration::from_secs(max_window_secs.max(1)))
                .max_capacity(max_tracked_keys)
                .build(),
        }
    }

    pub fn from_config() -> Self {
        let config = &AppConfig::get().rate_limit;
        let max_window = [&config.login, &config.register, &config.api]
            .iter()
            .map(|rule| rule.window_secs)
            .max()
            .unwrap_or(60);
        Self::new(config.max_tracked_keys, max_window)
    }
}

#[async_trait]
impl RateLimitStore for MokaRateLimitStore {
    async fn check_and_consume(&self, key: &str, max_requests: u32, window_secs: u64) -> bool {
        // entry().and_upsert_with 保证同一键的读改写是原子的
        let entry = self
            .counters
            .entry(window_key(key, window_secs))
            .and_upsert_with(|existing| async move {
                existing.map_or(1, |e| e.into_value().saturating_add(1))
            })
            .await;

        entry.into_value() <= max_requests
    }
}

/// 基于 Redis 的共享计数（INCR + EXPIRE）
pub struct RedisRateLimitStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRateLimitStore {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, String> {
        let client =
            redis::Client::open(url).map_err(|e| format!("Invalid Redis URL '{url}': {e}"))?;
        Ok(Self {
            client,
            key_prefix: format!("{key_prefix}ratelimit:"),
        })
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn check_and_consume(&self, key: &str, max_requests: u32, window_secs: u64) -> bool {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                // Redis 不可用时放行
                error!("Rate limit store unavailable: {}", e);
                return true;
            }
        };

        let redis_key = format!("{}{}", self.key_prefix, window_key(key, window_secs));
        let result: redis::RedisResult<(u32, i32)> = redis::pipe()
            .atomic()
            .incr(&redis_key, 1u32)
            .expire(&redis_key, window_secs.max(1) as i64)
            .query_async(&mut conn)
            .await;

        match result {
            Ok((count, _)) => count <= max_requests,
            Err(e) => {
                error!("Rate limit counter update failed for '{}': {}", redis_key, e);
                true
            }
        }
    }
}

/// 根据缓存配置选择计数存储，Redis 不可用时回退到内存
pub fn create_rate_limit_store() -> Arc<dyn RateLimitStore> {
    let config = AppConfig::get();
    if config.cache.cache_type == "redis" {
        match RedisRateLimitStore::new(&config.cache.redis.url, &config.cache.redis.key_prefix) {
            Ok(store) => return Arc::new(store),
            Err(e) => warn!("Falling back to in-memory rate limiting: {}", e),
        }
    }
    Arc::new(MokaRateLimitStore::from_config())
}

/// 未注入存储时使用的进程内计数
static FALLBACK_STORE: Lazy<Arc<dyn RateLimitStore>> =
    Lazy::new(|| Arc::new(MokaRateLimitStore::from_config()));

/// 速率限制配置
#[derive(Clone)]
pub struct RateLimit {
    /// 时间窗口内允许的最大请求数
    max_requests: u32,
    /// 时间窗口（秒）
    window_secs: u64,
    /// 限制键前缀（用于区分不同端点）
    key_prefix: String,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            key_prefix: String::new(),
        }
    }

    /// 设置限制键前缀
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    fn from_rule(rule: &RateLimitRule, prefix: &str) -> Self {
        Self::new(rule.max_requests, rule.window_secs).with_prefix(prefix)
    }

    /// 登录端点限制
    pub fn login() -> Self {
        Self::from_rule(&AppConfig::get().rate_limit.login, "login")
    }

    /// 注册端点限制
    pub fn register() -> Self {
        Self::from_rule(&AppConfig::get().rate_limit.register, "register")
    }

    /// 通用 API 限制
    pub fn api() -> Self {
        Self::from_rule(&AppConfig::get().rate_limit.api, "api")
    }
}

/// 从请求中提取客户端 IP
///
/// 部署在反向代理后面时，需要代理正确设置 X-Forwarded-For / X-Real-IP。
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    // 只取 X-Forwarded-For 的第一个 IP
    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP")
        && let Ok(ip) = real_ip.to_str()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<std::net::IpAddr>().is_ok()
}

/// 从请求中提取用户 ID（如果已认证）
fn extract_user_id(req: &ServiceRequest) -> Option<i64> {
    use crate::models::users::entities::User;
    req.extensions().get::<User>().map(|user| user.id)
}

/// 创建速率限制错误响应
fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            max_requests: self.max_requests,
            window_secs: self.window_secs,
            key_prefix: self.key_prefix.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let max_requests = self.max_requests;
        let window_secs = self.window_secs;
        let key_prefix = self.key_prefix.clone();

        Box::pin(async move {
            let identifier = extract_user_id(&req)
                .map(|id| format!("user:{id}"))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));

            let limit_key = if key_prefix.is_empty() {
                identifier
            } else {
                format!("{key_prefix}:{identifier}")
            };

            let store = req
                .app_data::<web::Data<Arc<dyn RateLimitStore>>>()
                .map(|data| data.get_ref().clone())
                .unwrap_or_else(|| FALLBACK_STORE.clone());

            if !store
                .check_and_consume(&limit_key, max_requests, window_secs)
                .await
            {
                warn!(
                    "Rate limit exceeded for key: {} (max {} per {}s)",
                    limit_key, max_requests, window_secs
                );
                return Ok(req
                    .into_response(create_rate_limit_response(window_secs).map_into_right_body()));
            }

            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::test::{TestRequest, call_service, init_service};

    #[actix_web::test]
    async fn test_store_allows_exactly_max() {
        let store = MokaRateLimitStore::new(1000, 3600);
        for _ in 0..5 {
            assert!(store.check_and_consume("login:ip:1.2.3.4", 5, 3600).await);
        }
        assert!(!store.check_and_consume("login:ip:1.2.3.4", 5, 3600).await);
        assert!(!store.check_and_consume("login:ip:1.2.3.4", 5, 3600).await);
    }

    #[actix_web::test]
    async fn test_store_keys_are_independent() {
        let store = MokaRateLimitStore::new(1000, 3600);
        assert!(store.check_and_consume("a", 1, 3600).await);
        assert!(!store.check_and_consume("a", 1, 3600).await);
        assert!(store.check_and_consume("b", 1, 3600).await);
    }

    #[actix_web::test]
    async fn test_middleware_returns_429_after_limit() {
        let store: Arc<dyn RateLimitStore> = Arc::new(MokaRateLimitStore::new(1000, 60));
        let app = init_service(
            App::new().app_data(web::Data::new(store)).route(
                "/limited",
                web::post()
                    .to(|| async { HttpResponse::Ok().finish() })
                    .wrap(RateLimit::new(2, 60).with_prefix("test")),
            ),
        )
        .await;

        for _ in 0..2 {
            let req = TestRequest::post().uri("/limited").to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = TestRequest::post().uri("/limited").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("Retry-After"));
    }

    #[test]
    fn test_presets_follow_config() {
        let config = &AppConfig::get().rate_limit;
        let login = RateLimit::login();
        assert_eq!(login.max_requests, config.login.max_requests);
        assert_eq!(login.window_secs, config.login.window_secs);
        assert_eq!(login.key_prefix, "login");
        assert_eq!(RateLimit::register().key_prefix, "register");
    }
}
