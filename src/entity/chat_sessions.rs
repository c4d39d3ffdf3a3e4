//! 聊天机器人会话实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chat_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub session_key: String,
    pub user_id: i64,
    pub last_user_role: String,
    pub message_count: i32,
    pub matched_count: i32,
    pub fallback_count: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chat_messages::Entity")]
    Messages,
}

impl Related<super::chat_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_chat_session(self) -> crate::models::chatbot::entities::ChatSession {
        use super::ts_to_datetime;
        use crate::models::chatbot::entities::ChatSession;
        use crate::models::users::entities::UserRole;

        ChatSession {
            id: self.id,
            session_key: self.session_key,
            user_id: self.user_id,
            last_user_role: self
                .last_user_role
                .parse::<UserRole>()
                .unwrap_or(UserRole::Student),
            message_count: self.message_count,
            matched_count: self.matched_count,
            fallback_count: self.fallback_count,
            created_at: ts_to_datetime(self.created_at),
            updated_at: ts_to_datetime(self.updated_at),
        }
    }
}
