use super::entities::{ChatMessage, ChatSession};
use serde::Serialize;
use ts_rs::TS;

// 会话记录与统计
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/chatbot.ts")]
pub struct ChatTranscript {
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

// 单次回复
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/chatbot.ts")]
pub struct ChatReply {
    pub user_message: ChatMessage,
    pub bot_message: ChatMessage,
    pub session: ChatSession,
}
