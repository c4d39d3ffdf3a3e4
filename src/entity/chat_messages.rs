//! 聊天消息实体（只追加）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chat_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    pub sender: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub matched_rule: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chat_sessions::Entity",
        from = "Column::SessionId",
        to = "super::chat_sessions::Column::Id",
        on_delete = "Cascade"
    )]
    Session,
}

impl Related<super::chat_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_chat_message(self) -> crate::models::chatbot::entities::ChatMessage {
        use super::ts_to_datetime;
        use crate::models::chatbot::entities::{ChatMessage, ChatSender};

        ChatMessage {
            id: self.id,
            session_id: self.session_id,
            sender: self.sender.parse::<ChatSender>().unwrap_or(ChatSender::Bot),
            content: self.content,
            matched_rule: self.matched_rule,
            created_at: ts_to_datetime(self.created_at),
        }
    }
}
