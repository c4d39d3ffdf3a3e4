use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ClassroomError, Result};
use crate::models::{
    ApiResponse,
    chatbot::{
        entities::{ChatExchange, ChatSession},
        requests::SendMessageRequest,
        responses::{ChatReply, ChatTranscript},
    },
    users::entities::User,
};
use crate::services::current_user;
use crate::storage::Storage;
use crate::utils::validate::MAX_MESSAGE_LEN;

use super::{ChatbotService, rules};

/// 只能访问自己的会话，他人的会话表现为不存在
async fn load_own_session(
    storage: &Arc<dyn Storage>,
    user: &User,
    session_key: &str,
) -> Result<ChatSession> {
    storage
        .get_chat_session(session_key)
        .await?
        .filter(|session| session.user_id == user.id)
        .ok_or_else(|| ClassroomError::not_found("Chat session not found"))
}

pub async fn start_session(storage: &Arc<dyn Storage>, user: &User) -> Result<ChatSession> {
    storage.create_chat_session(user.id, user.role).await
}

pub async fn send_message(
    storage: &Arc<dyn Storage>,
    user: &User,
    session_key: &str,
    text: &str,
) -> Result<ChatReply> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ClassroomError::validation("Message must not be empty"));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ClassroomError::validation(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let session = load_own_session(storage, user, session_key).await?;
    let reply = rules::match_message(text, user.role);

    let (user_message, bot_message, session) = storage
        .append_chat_exchange(ChatExchange {
            session_id: session.id,
            user_role: user.role,
            user_text: text.to_string(),
            reply: reply.text.to_string(),
            matched_rule: reply.matched_rule.map(str::to_string),
        })
        .await?;

    Ok(ChatReply {
        user_message,
        bot_message,
        session,
    })
}

pub async fn get_transcript(
    storage: &Arc<dyn Storage>,
    user: &User,
    session_key: &str,
) -> Result<ChatTranscript> {
    let session = load_own_session(storage, user, session_key).await?;
    let messages = storage.list_chat_messages(session.id).await?;
    Ok(ChatTranscript { session, messages })
}

pub async fn handle_start_session(
    service: &ChatbotService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let session = start_session(&storage, &user).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(session, "Chat session started")))
}

pub async fn handle_get_session(
    service: &ChatbotService,
    request: &HttpRequest,
    session_key: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let transcript = get_transcript(&storage, &user, &session_key).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        transcript,
        "Chat session retrieved successfully",
    )))
}

pub async fn handle_send_message(
    service: &ChatbotService,
    request: &HttpRequest,
    session_key: String,
    message: SendMessageRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let reply = send_message(&storage, &user, &session_key, &message.text).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reply, "Message sent")))
}
