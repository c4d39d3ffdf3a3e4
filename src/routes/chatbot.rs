use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::chatbot::requests::SendMessageRequest;
use crate::services::ChatbotService;
use crate::utils::extractor::SafeSessionKey;

static CHATBOT_SERVICE: Lazy<ChatbotService> = Lazy::new(ChatbotService::new_lazy);

pub async fn start_session(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHATBOT_SERVICE.start_session(&req).await
}

pub async fn get_session(
    req: HttpRequest,
    session_key: SafeSessionKey,
) -> ActixResult<HttpResponse> {
    CHATBOT_SERVICE.get_session(&req, session_key.0).await
}

pub async fn send_message(
    req: HttpRequest,
    session_key: SafeSessionKey,
    message: web::Json<SendMessageRequest>,
) -> ActixResult<HttpResponse> {
    CHATBOT_SERVICE
        .send_message(&req, session_key.0, message.into_inner())
        .await
}

// 配置路由
pub fn configure_chatbot_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/chatbot")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireJWT)
            .route("/sessions", web::post().to(start_session))
            .route("/sessions/{session_key}", web::get().to(get_session))
            .route(
                "/sessions/{session_key}/messages",
                web::post().to(send_message),
            ),
    );
}
