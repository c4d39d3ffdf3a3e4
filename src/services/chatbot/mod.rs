pub mod rules;
pub mod session;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::chatbot::requests::SendMessageRequest;

crate::services::define_service!(ChatbotService);

impl ChatbotService {
    // 新建会话
    pub async fn start_session(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        session::handle_start_session(self, request).await
    }

    // 会话记录
    pub async fn get_session(
        &self,
        request: &HttpRequest,
        session_key: String,
    ) -> ActixResult<HttpResponse> {
        session::handle_get_session(self, request, session_key).await
    }

    // 发送消息并获取回复
    pub async fn send_message(
        &self,
        request: &HttpRequest,
        session_key: String,
        message: SendMessageRequest,
    ) -> ActixResult<HttpResponse> {
        session::handle_send_message(self, request, session_key, message).await
    }
}
