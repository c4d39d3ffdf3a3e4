use crate::models::users::entities::UserRole;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

crate::define_string_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/chatbot.ts")]
    pub enum ChatSender("chat sender") {
        User => "user",
        Bot => "bot",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/chatbot.ts")]
pub struct ChatSession {
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub id: i64,
    pub session_key: String,
    pub user_id: i64,
    pub last_user_role: UserRole,
    pub message_count: i32,
    pub matched_count: i32,
    pub fallback_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/chatbot.ts")]
pub struct ChatMessage {
    pub id: i64,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub session_id: i64,
    pub sender: ChatSender,
    pub content: String,
    pub matched_rule: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 一次对话往返的写入参数
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub session_id: i64,
    pub user_role: UserRole,
    pub user_text: String,
    pub reply: String,
    pub matched_rule: Option<String>,
}
